//! Compile-time name resolution.
//!
//! An `Identifier` is what a name means at the point it is compiled. It is
//! consumed by the expression compiler and never reaches run time; the
//! nodes it lowers to hold whatever run-time handle they need (a stack
//! slot, a function cell, a class cell).

use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

use quill_runtime::{FunctionRef, RuntimeErrorKind, RuntimeResult, Signature, Vtable};
use rustc_hash::FxHashMap;

use crate::prelude::AtomicTypes;

/// The global-variable region of one module.
///
/// Slots are allocated while the module compiles; the region is placed on
/// the execution stack when the module loads.
pub struct GlobalSlots {
    module: Rc<str>,
    base: Cell<Option<usize>>,
    count: Cell<usize>,
}

impl GlobalSlots {
    pub fn new(module: Rc<str>) -> Rc<Self> {
        Rc::new(GlobalSlots {
            module,
            base: Cell::new(None),
            count: Cell::new(0),
        })
    }

    pub fn module(&self) -> &Rc<str> {
        &self.module
    }

    pub fn count(&self) -> usize {
        self.count.get()
    }

    pub(crate) fn allocate(&self) -> usize {
        let slot = self.count.get();
        self.count.set(slot + 1);
        slot
    }

    /// Stack index of slot 0, once loaded.
    pub fn base(&self) -> Option<usize> {
        self.base.get()
    }

    pub(crate) fn bind(&self, base: Option<usize>) {
        self.base.set(base);
    }

    /// Absolute stack index of `slot`.
    #[inline]
    pub fn index(&self, slot: usize) -> RuntimeResult<usize> {
        self.base
            .get()
            .map(|base| base + slot)
            .ok_or_else(|| RuntimeErrorKind::ModuleNotLoaded(self.module.to_string()).into())
    }
}

impl fmt::Debug for GlobalSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GlobalSlots({}, {})", self.module, self.count.get())
    }
}

/// A declared function. The body is filled in when the definition is
/// compiled, which may come after calls to it were compiled (prototypes,
/// recursion).
pub struct FunctionCell {
    name: Rc<str>,
    signature: Signature,
    native: bool,
    function: OnceCell<FunctionRef>,
}

impl FunctionCell {
    pub fn declared(name: Rc<str>, signature: Signature) -> Rc<Self> {
        Rc::new(FunctionCell {
            name,
            signature,
            native: false,
            function: OnceCell::new(),
        })
    }

    pub fn native(function: FunctionRef) -> Rc<Self> {
        let cell = FunctionCell {
            name: Rc::from(function.name()),
            signature: function.signature().clone(),
            native: true,
            function: OnceCell::new(),
        };
        let _ = cell.function.set(function);
        Rc::new(cell)
    }

    pub fn name(&self) -> &Rc<str> {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn is_native(&self) -> bool {
        self.native
    }

    pub fn is_defined(&self) -> bool {
        self.function.get().is_some()
    }

    pub fn get(&self) -> Option<&FunctionRef> {
        self.function.get()
    }

    /// Attach the compiled body. Returns `false` if one was already set.
    pub(crate) fn define(&self, function: FunctionRef) -> bool {
        self.function.set(function).is_ok()
    }

    pub fn function(&self) -> RuntimeResult<FunctionRef> {
        self.function.get().cloned().ok_or_else(|| {
            RuntimeErrorKind::NotCallable(format!("undefined function `{}`", self.name)).into()
        })
    }
}

impl fmt::Debug for FunctionCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionCell({})", self.name)
    }
}

/// A declared class; the vtable is set once the class body is compiled.
pub struct ClassCell {
    name: Rc<str>,
    vtable: OnceCell<Rc<Vtable>>,
}

impl ClassCell {
    pub fn pending(name: Rc<str>) -> Rc<Self> {
        Rc::new(ClassCell {
            name,
            vtable: OnceCell::new(),
        })
    }

    pub fn complete(vtable: Rc<Vtable>) -> Rc<Self> {
        let cell = ClassCell::pending(Rc::clone(vtable.name()));
        let _ = cell.vtable.set(vtable);
        cell
    }

    /// Qualified class name.
    pub fn name(&self) -> &Rc<str> {
        &self.name
    }

    pub fn vtable(&self) -> Option<&Rc<Vtable>> {
        self.vtable.get()
    }

    pub(crate) fn finish(&self, vtable: Rc<Vtable>) {
        let _ = self.vtable.set(vtable);
    }
}

impl fmt::Debug for ClassCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassCell({})", self.name)
    }
}

/// Names visible as `module::name` from importers.
pub struct ModuleScope {
    name: Rc<str>,
    names: RefCell<FxHashMap<Rc<str>, Identifier>>,
}

impl ModuleScope {
    pub fn new(name: Rc<str>) -> Rc<Self> {
        Rc::new(ModuleScope {
            name,
            names: RefCell::new(FxHashMap::default()),
        })
    }

    pub fn name(&self) -> &Rc<str> {
        &self.name
    }

    pub fn resolve(&self, name: &str) -> Option<Identifier> {
        self.names.borrow().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.borrow().contains_key(name)
    }

    /// Bind `name`. Returns `false` if it was already bound.
    pub(crate) fn define(&self, name: Rc<str>, identifier: Identifier) -> bool {
        let mut names = self.names.borrow_mut();
        if names.contains_key(&name) {
            return false;
        }
        names.insert(name, identifier);
        true
    }
}

impl fmt::Debug for ModuleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleScope({})", self.name)
    }
}

#[derive(Clone, Debug)]
pub enum Identifier {
    /// Module-level variable.
    Global { slots: Rc<GlobalSlots>, slot: usize },
    /// Frame-relative variable or parameter.
    Local(usize),
    Function(Rc<FunctionCell>),
    Class(Rc<ClassCell>),
    Module(Rc<ModuleScope>),
    /// Field of the class being compiled, relative to its row.
    Field(usize),
    /// Method of the class being compiled, dispatched by name.
    Method(Rc<str>),
}

/// The scope the expression compiler resolves names against.
pub trait IdentifierLookup {
    /// Resolve a bare name: locals, then class members, then module names,
    /// then the prelude.
    fn resolve(&self, name: &str) -> Option<Identifier>;

    /// Resolve `name` among the current class's members only.
    fn resolve_member(&self, _name: &str) -> Option<Identifier> {
        None
    }

    fn in_class_context(&self) -> bool;

    /// Qualified name of the class being compiled.
    fn current_class_name(&self) -> Option<Rc<str>>;

    /// Whether the current class is `class` or derives from it.
    fn derives_from(&self, _class: &str) -> bool {
        false
    }

    /// Vtable of a completed class visible at module level.
    fn lookup_vtable(&self, name: &str) -> Option<Rc<Vtable>>;

    /// Vtables holding the methods of numbers, strings and functions.
    fn atomic_types(&self) -> Option<Rc<AtomicTypes>> {
        None
    }
}
