//! Construction and destruction chains.
//!
//! Both chains visit every class in an object's hierarchy exactly once,
//! keyed by qualified name, however many derivation paths reach it. The
//! set of classes already visited lives in a scope opened by the outermost
//! call for that object and shared by every nested call.

use std::rc::Rc;

use tracing::{debug, warn};

use super::Vtable;
use crate::callable::SelfRef;
use crate::context::{LifecycleGuard, RuntimeContext};
use crate::error::{RuntimeErrorKind, RuntimeResult};
use crate::object::Object;

impl Vtable {
    /// Allocate an instance and construct it with the `argc` arguments on
    /// top of the stack.
    pub fn instantiate(
        self: &Rc<Self>,
        ctx: &mut RuntimeContext,
        argc: usize,
    ) -> RuntimeResult<Rc<Object>> {
        let object = Object::new(self);
        self.construct(ctx, &object, 0, argc, false)?;
        Ok(object)
    }

    /// Run this class's part of `object`'s construction; the class's row
    /// starts at `offset`.
    ///
    /// A class already constructed in the current scope is skipped, unless
    /// `explicit` (an initializer-list entry), which is an error.
    pub fn construct(
        self: &Rc<Self>,
        ctx: &mut RuntimeContext,
        object: &Rc<Object>,
        offset: usize,
        argc: usize,
        explicit: bool,
    ) -> RuntimeResult<()> {
        let mut scope = ctx.begin_construction(object);
        if !scope.mark_done(&self.name) {
            if explicit {
                return Err(RuntimeErrorKind::DoubleConstruction(self.name.to_string()).into());
            }
            return Ok(());
        }
        debug!(class = %self.name, offset, argc, "construct");

        let this = SelfRef::new(Rc::clone(object), offset);
        match &self.constructor {
            Some(ctor) if ctor.chains_bases => {
                ctor.function.invoke(&mut scope, argc, Some(this))?;
            }
            Some(ctor) => {
                self.construct_bases(&mut scope, object, offset)?;
                ctor.function.invoke(&mut scope, argc, Some(this))?;
            }
            None => self.construct_bases(&mut scope, object, offset)?,
        }
        Ok(())
    }

    /// Default-construct every direct base not yet constructed, in
    /// declaration order.
    pub fn construct_bases(
        &self,
        ctx: &mut RuntimeContext,
        object: &Rc<Object>,
        offset: usize,
    ) -> RuntimeResult<()> {
        for base in &self.bases {
            let mut mark = ctx.mark();
            base.vtable
                .construct(&mut mark, object, offset + base.offset, 0, false)?;
        }
        Ok(())
    }

    /// Run this class's destructor and then its bases', in reverse
    /// declaration order. The outermost call releases the object's fields
    /// afterwards, even if a destructor failed.
    pub fn destroy(
        self: &Rc<Self>,
        ctx: &mut RuntimeContext,
        object: &Rc<Object>,
        offset: usize,
    ) -> RuntimeResult<()> {
        let mut scope = ctx.begin_destruction(object);
        let outermost = scope.is_outermost();
        if outermost && object.is_destroyed() {
            warn!(class = %self.name, "destroy on an already released object");
            return Err(RuntimeErrorKind::DoubleDestruction(self.name.to_string()).into());
        }

        let result = self.run_destructors(&mut scope, object, offset);
        if outermost {
            object.release();
        }
        result
    }

    fn run_destructors(
        self: &Rc<Self>,
        scope: &mut LifecycleGuard<'_>,
        object: &Rc<Object>,
        offset: usize,
    ) -> RuntimeResult<()> {
        if !scope.mark_done(&self.name) {
            return Ok(());
        }
        debug!(class = %self.name, offset, "destroy");

        if let Some(dtor) = &self.destructor {
            let mut mark = scope.mark();
            let this = SelfRef::new(Rc::clone(object), offset);
            dtor.invoke(&mut mark, 0, Some(this))?;
        }
        for base in self.bases.iter().rev() {
            base.vtable.destroy(scope, object, offset + base.offset)?;
        }
        Ok(())
    }
}
