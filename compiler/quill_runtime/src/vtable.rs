//! Vtables: per-class dispatch tables and field layouts.
//!
//! A class's field row is the concatenation of its bases' rows (in
//! declaration order) followed by its own fields. Each direct base records
//! the offset at which its row starts; the transitive `ancestors` map
//! records the same for every indirect base, so a qualified `Base::member`
//! can be reached from any derived class with one lookup.
//!
//! A vtable is built once by `VtableBuilder`, then shared immutably by every
//! instance of the class.

mod builder;
mod lifecycle;

use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{member_not_found, RuntimeErrorKind, RuntimeResult};
use crate::object::NativePayload;
use crate::value::FunctionRef;

pub use builder::{DeriveError, VtableBuilder};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u8 {
        /// Built-in value type (`number`, `string`, `function`): cannot be
        /// instantiated with `new` or derived from.
        const ATOMIC = 1 << 0;
        /// Declared by host code.
        const NATIVE = 1 << 1;
    }
}

/// A method and where its declaring class sits in the receiver's row.
#[derive(Clone, Debug)]
pub struct Method {
    pub function: FunctionRef,
    /// Qualified name of the declaring class.
    pub owner: Rc<str>,
    /// Offset of the declaring class within the class that resolved it.
    pub offset: usize,
}

/// A field slot, absolute within the class that resolved it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSlot {
    pub index: usize,
    pub owner: Rc<str>,
}

#[derive(Clone, Debug)]
pub enum Member {
    Method(Method),
    Field(FieldSlot),
}

impl Member {
    /// The same member seen from a class that embeds the resolving class at
    /// `offset`.
    #[must_use]
    pub fn shifted(&self, offset: usize) -> Member {
        match self {
            Member::Method(m) => Member::Method(Method {
                function: m.function.clone(),
                owner: Rc::clone(&m.owner),
                offset: m.offset + offset,
            }),
            Member::Field(f) => Member::Field(FieldSlot {
                index: f.index + offset,
                owner: Rc::clone(&f.owner),
            }),
        }
    }

    pub fn owner(&self) -> &Rc<str> {
        match self {
            Member::Method(m) => &m.owner,
            Member::Field(f) => &f.owner,
        }
    }
}

/// A base class embedded at `offset`.
#[derive(Clone)]
pub struct BaseEntry {
    pub vtable: Rc<Vtable>,
    pub offset: usize,
}

impl fmt::Debug for BaseEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.vtable.name(), self.offset)
    }
}

#[derive(Clone, Debug)]
pub struct Constructor {
    pub function: FunctionRef,
    /// The function constructs the bases itself (script constructors run
    /// their initializer list, then default-construct the rest). Natives
    /// leave that to `Vtable::construct`.
    pub chains_bases: bool,
}

/// Creates the native payload of a fresh instance.
pub type PayloadFactory = Rc<dyn Fn() -> Box<dyn NativePayload>>;

pub struct Vtable {
    name: Rc<str>,
    flags: TypeFlags,
    field_count: usize,
    members: FxHashMap<Rc<str>, Member>,
    constructor: Option<Constructor>,
    destructor: Option<FunctionRef>,
    bases: SmallVec<[BaseEntry; 2]>,
    ancestors: FxHashMap<Rc<str>, BaseEntry>,
    payload: Option<(Rc<str>, PayloadFactory)>,
}

impl Vtable {
    /// Qualified name (`module::Class`, or a bare name for prelude classes).
    #[inline]
    pub fn name(&self) -> &Rc<str> {
        &self.name
    }

    #[inline]
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    pub fn is_atomic(&self) -> bool {
        self.flags.contains(TypeFlags::ATOMIC)
    }

    pub fn is_native(&self) -> bool {
        self.flags.contains(TypeFlags::NATIVE)
    }

    /// Total field slots, bases included.
    #[inline]
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    pub fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    pub fn destructor(&self) -> Option<&FunctionRef> {
        self.destructor.as_ref()
    }

    pub fn bases(&self) -> &[BaseEntry] {
        &self.bases
    }

    /// A direct base by name.
    pub fn direct_base(&self, name: &str) -> Option<&BaseEntry> {
        self.bases.iter().find(|b| &*b.vtable.name == name)
    }

    /// A transitive base by name.
    pub fn ancestor(&self, name: &str) -> Option<&BaseEntry> {
        self.ancestors.get(name)
    }

    /// Whether this class is `name` or derives from it.
    pub fn is_a(&self, name: &str) -> bool {
        &*self.name == name || self.ancestors.contains_key(name)
    }

    /// Offset of class `name` within this class's row.
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        if &*self.name == name {
            Some(0)
        } else {
            self.ancestors.get(name).map(|b| b.offset)
        }
    }

    /// Most-derived member called `name`.
    pub fn resolve(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    /// Like `resolve`, raising `MemberNotFound` for unknown names.
    pub fn member(&self, name: &str) -> RuntimeResult<&Member> {
        self.resolve(name)
            .ok_or_else(|| member_not_found(&self.name, name))
    }

    /// `qualifier::name`: the member as declared in ancestor `qualifier`,
    /// bypassing any shadowing, with offsets relative to this class.
    pub fn resolve_qualified(&self, qualifier: &str, name: &str) -> RuntimeResult<Member> {
        let (vtable, offset) = if &*self.name == qualifier {
            (self, 0)
        } else {
            let base = self
                .ancestors
                .get(qualifier)
                .ok_or_else(|| RuntimeErrorKind::NotDerived {
                    class: self.name.to_string(),
                    base: qualifier.to_string(),
                })?;
            (&*base.vtable, base.offset)
        };
        vtable.member(name).map(|m| m.shifted(offset))
    }

    /// Names of all members, own and inherited.
    pub fn member_names(&self) -> impl Iterator<Item = &Rc<str>> {
        self.members.keys()
    }

    pub(crate) fn create_payload(&self) -> Option<Box<dyn NativePayload>> {
        self.payload.as_ref().map(|(_, factory)| factory())
    }
}

impl fmt::Debug for Vtable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vtable")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("field_count", &self.field_count)
            .field("bases", &self.bases)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
