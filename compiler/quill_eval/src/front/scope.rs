//! Compile-time scopes: frame-local variables and the resolver handed to
//! the expression compiler.

use std::rc::Rc;

use quill_runtime::{Member, Vtable, VtableBuilder};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::ident::{ClassCell, Identifier, IdentifierLookup, ModuleScope};
use crate::prelude::{AtomicTypes, Prelude};

/// Block-structured local variables of one function frame.
///
/// Slots are assigned in declaration order and reused once the declaring
/// block closes, mirroring the stack height at run time.
pub(crate) struct LocalScopes {
    blocks: Vec<Block>,
    next: usize,
}

struct Block {
    start: usize,
    names: Vec<(Rc<str>, usize)>,
}

impl LocalScopes {
    /// Scopes whose first local gets frame slot `first`.
    pub(crate) fn new(first: usize) -> Self {
        LocalScopes {
            blocks: vec![Block {
                start: first,
                names: Vec::new(),
            }],
            next: first,
        }
    }

    /// Scopes for a function: parameter `i` lives in slot `i`, the return
    /// slot follows them, and locals start after it.
    pub(crate) fn with_params(params: &[Rc<str>]) -> Self {
        let mut scopes = LocalScopes::new(0);
        let outer = &mut scopes.blocks[0];
        for (slot, name) in params.iter().enumerate() {
            outer.names.push((Rc::clone(name), slot));
        }
        scopes.next = params.len() + 1;
        scopes
    }

    pub(crate) fn push_block(&mut self) {
        self.blocks.push(Block {
            start: self.next,
            names: Vec::new(),
        });
    }

    pub(crate) fn pop_block(&mut self) {
        if self.blocks.len() > 1 {
            if let Some(block) = self.blocks.pop() {
                self.next = block.start;
            }
        }
    }

    /// Declare `name` in the innermost block. `None` if the block already
    /// declares it.
    pub(crate) fn declare(&mut self, name: &Rc<str>) -> Option<usize> {
        let block = self.blocks.last_mut()?;
        if block.names.iter().any(|(n, _)| n == name) {
            return None;
        }
        let slot = self.next;
        block.names.push((Rc::clone(name), slot));
        self.next += 1;
        Some(slot)
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<usize> {
        self.blocks
            .iter()
            .rev()
            .flat_map(|block| block.names.iter().rev())
            .find(|(n, _)| &**n == name)
            .map(|(_, slot)| *slot)
    }
}

/// The class whose body is being compiled.
pub(crate) struct ClassContext {
    pub builder: VtableBuilder,
    pub cell: Rc<ClassCell>,
    /// Methods declared but not yet added to the builder (the one whose
    /// body is compiling).
    pub pending: FxHashSet<Rc<str>>,
    pub has_constructor: bool,
    pub has_destructor: bool,
}

impl ClassContext {
    pub(crate) fn new(builder: VtableBuilder, cell: Rc<ClassCell>) -> Self {
        ClassContext {
            builder,
            cell,
            pending: FxHashSet::default(),
            has_constructor: false,
            has_destructor: false,
        }
    }

    fn member(&self, name: &str) -> Option<Identifier> {
        match self.builder.resolve(name) {
            Some(Member::Field(field)) => Some(Identifier::Field(field.index)),
            Some(Member::Method(_)) => Some(Identifier::Method(Rc::from(name))),
            None => self
                .pending
                .get(name)
                .map(|name| Identifier::Method(Rc::clone(name))),
        }
    }
}

/// Module-level names: the module's own, then imported modules, then the
/// prelude.
pub(crate) struct ModuleNames<'a> {
    pub scope: &'a ModuleScope,
    pub imports: &'a FxHashMap<Rc<str>, Rc<ModuleScope>>,
    pub prelude: &'a Prelude,
}

impl ModuleNames<'_> {
    pub(crate) fn resolve(&self, name: &str) -> Option<Identifier> {
        self.scope
            .resolve(name)
            .or_else(|| {
                self.imports
                    .get(name)
                    .map(|module| Identifier::Module(Rc::clone(module)))
            })
            .or_else(|| self.prelude.resolve(name))
    }
}

/// Everything visible at one point in the source.
pub(crate) struct Resolver<'a> {
    pub locals: &'a LocalScopes,
    pub class: Option<&'a ClassContext>,
    pub module: ModuleNames<'a>,
}

impl IdentifierLookup for Resolver<'_> {
    fn resolve(&self, name: &str) -> Option<Identifier> {
        if let Some(slot) = self.locals.resolve(name) {
            return Some(Identifier::Local(slot));
        }
        if let Some(member) = self.resolve_member(name) {
            return Some(member);
        }
        self.module.resolve(name)
    }

    fn resolve_member(&self, name: &str) -> Option<Identifier> {
        self.class.and_then(|class| class.member(name))
    }

    fn in_class_context(&self) -> bool {
        self.class.is_some()
    }

    fn current_class_name(&self) -> Option<Rc<str>> {
        self.class.map(|class| Rc::clone(class.builder.name()))
    }

    fn derives_from(&self, name: &str) -> bool {
        self.class.is_some_and(|class| {
            **class.builder.name() == *name || class.builder.ancestor(name).is_some()
        })
    }

    fn lookup_vtable(&self, name: &str) -> Option<Rc<Vtable>> {
        self.module.prelude.vtable(name)
    }

    fn atomic_types(&self) -> Option<Rc<AtomicTypes>> {
        Some(Rc::clone(self.module.prelude.atomic_types()))
    }
}
