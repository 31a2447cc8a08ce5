//! Incremental vtable construction.
//!
//! Bases are derived first, then own members are added. Derivation only
//! appends: base slot indices are never renumbered, and a name declared by
//! the class itself always shadows an inherited one.

use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

use super::{BaseEntry, Constructor, FieldSlot, Member, Method, PayloadFactory, TypeFlags, Vtable};
use crate::value::FunctionRef;

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum DeriveError {
    #[error("state of `{0}` is inherited through more than one path")]
    Diamond(String),

    #[error("cannot derive from atomic type `{0}`")]
    AtomicBase(String),

    #[error("`{0}` carries native state that conflicts with another base")]
    ConflictingPayload(String),

    #[error("`{0}` is already a member of this class")]
    Duplicate(String),
}

pub struct VtableBuilder {
    name: Rc<str>,
    flags: TypeFlags,
    field_count: usize,
    members: FxHashMap<Rc<str>, Member>,
    own: FxHashSet<Rc<str>>,
    constructor: Option<Constructor>,
    destructor: Option<FunctionRef>,
    bases: SmallVec<[BaseEntry; 2]>,
    ancestors: FxHashMap<Rc<str>, BaseEntry>,
    payload: Option<(Rc<str>, PayloadFactory)>,
}

impl VtableBuilder {
    pub fn new(name: impl Into<Rc<str>>, flags: TypeFlags) -> Self {
        VtableBuilder {
            name: name.into(),
            flags,
            field_count: 0,
            members: FxHashMap::default(),
            own: FxHashSet::default(),
            constructor: None,
            destructor: None,
            bases: SmallVec::new(),
            ancestors: FxHashMap::default(),
            payload: None,
        }
    }

    /// Builder for a host-declared class.
    pub fn native(name: impl Into<Rc<str>>) -> Self {
        VtableBuilder::new(name, TypeFlags::NATIVE)
    }

    pub fn name(&self) -> &Rc<str> {
        &self.name
    }

    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// Member visible so far under `name`.
    pub fn resolve(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    /// Whether the class itself declared `name`.
    pub fn declares(&self, name: &str) -> bool {
        self.own.contains(name)
    }

    pub fn direct_base(&self, name: &str) -> Option<&BaseEntry> {
        self.bases.iter().find(|b| &**b.vtable.name() == name)
    }

    pub fn ancestor(&self, name: &str) -> Option<&BaseEntry> {
        self.ancestors.get(name)
    }

    /// Append `base`'s layout and merge its members.
    ///
    /// A base already reachable through an earlier path is accepted only if
    /// it has no fields; its first embedding is kept.
    pub fn derive(&mut self, base: &Rc<Vtable>) -> Result<(), DeriveError> {
        if base.is_atomic() {
            return Err(DeriveError::AtomicBase(base.name().to_string()));
        }

        let reached = std::iter::once((base.name(), base, 0)).chain(
            base.ancestors
                .iter()
                .map(|(name, entry)| (name, &entry.vtable, entry.offset)),
        );
        let mut fresh: Vec<(Rc<str>, BaseEntry)> = Vec::new();
        for (name, vtable, offset) in reached {
            let seen = **name == *self.name || self.ancestors.contains_key(&**name);
            if seen {
                if vtable.field_count() > 0 {
                    return Err(DeriveError::Diamond(name.to_string()));
                }
                continue;
            }
            fresh.push((
                Rc::clone(name),
                BaseEntry {
                    vtable: Rc::clone(vtable),
                    offset,
                },
            ));
        }

        if let Some((owner, factory)) = &base.payload {
            let conflict = self
                .payload
                .as_ref()
                .is_some_and(|(existing, _)| existing != owner);
            if conflict {
                return Err(DeriveError::ConflictingPayload(base.name().to_string()));
            }
            if self.payload.is_none() {
                self.payload = Some((Rc::clone(owner), Rc::clone(factory)));
            }
        }

        let offset = self.field_count;
        self.field_count += base.field_count();
        for (name, mut entry) in fresh {
            entry.offset += offset;
            self.ancestors.insert(name, entry);
        }
        for (name, member) in &base.members {
            if !self.members.contains_key(name) {
                self.members.insert(Rc::clone(name), member.shifted(offset));
            }
        }
        self.bases.push(BaseEntry {
            vtable: Rc::clone(base),
            offset,
        });
        debug!(class = %self.name, base = %base.name(), offset, "derive");
        Ok(())
    }

    fn claim(&mut self, name: &Rc<str>) -> Result<(), DeriveError> {
        if !self.own.insert(Rc::clone(name)) {
            return Err(DeriveError::Duplicate(name.to_string()));
        }
        Ok(())
    }

    /// Declare a field; returns its slot in this class's row.
    pub fn add_field(&mut self, name: impl Into<Rc<str>>) -> Result<usize, DeriveError> {
        let name = name.into();
        self.claim(&name)?;
        let index = self.field_count;
        self.field_count += 1;
        self.members.insert(
            name,
            Member::Field(FieldSlot {
                index,
                owner: Rc::clone(&self.name),
            }),
        );
        Ok(index)
    }

    /// Declare a method, shadowing any inherited member of the same name.
    pub fn add_method(
        &mut self,
        name: impl Into<Rc<str>>,
        function: FunctionRef,
    ) -> Result<(), DeriveError> {
        let name = name.into();
        self.claim(&name)?;
        self.members.insert(
            name,
            Member::Method(Method {
                function,
                owner: Rc::clone(&self.name),
                offset: 0,
            }),
        );
        Ok(())
    }

    /// Host-side variant of `add_method`: a repeated name replaces the
    /// earlier method.
    #[must_use]
    pub fn with_method(mut self, name: &str, function: FunctionRef) -> Self {
        let name: Rc<str> = Rc::from(name);
        self.own.insert(Rc::clone(&name));
        self.members.insert(
            name,
            Member::Method(Method {
                function,
                owner: Rc::clone(&self.name),
                offset: 0,
            }),
        );
        self
    }

    pub fn set_constructor(&mut self, function: FunctionRef, chains_bases: bool) {
        self.constructor = Some(Constructor {
            function,
            chains_bases,
        });
    }

    /// Host-side constructor; bases are default-constructed before it runs.
    #[must_use]
    pub fn with_constructor(mut self, function: FunctionRef) -> Self {
        self.set_constructor(function, false);
        self
    }

    pub fn set_destructor(&mut self, function: FunctionRef) {
        self.destructor = Some(function);
    }

    #[must_use]
    pub fn with_destructor(mut self, function: FunctionRef) -> Self {
        self.set_destructor(function);
        self
    }

    /// Give instances a native payload created by `factory`.
    pub fn set_payload(&mut self, factory: PayloadFactory) {
        self.payload = Some((Rc::clone(&self.name), factory));
    }

    #[must_use]
    pub fn with_payload(mut self, factory: PayloadFactory) -> Self {
        self.set_payload(factory);
        self
    }

    pub fn build(self) -> Rc<Vtable> {
        debug!(
            class = %self.name,
            fields = self.field_count,
            bases = self.bases.len(),
            "vtable built"
        );
        Rc::new(Vtable {
            name: self.name,
            flags: self.flags,
            field_count: self.field_count,
            members: self.members,
            constructor: self.constructor,
            destructor: self.destructor,
            bases: self.bases,
            ancestors: self.ancestors,
            payload: self.payload,
        })
    }
}
