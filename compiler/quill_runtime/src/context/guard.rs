//! RAII guards over the runtime context.
//!
//! Each guard holds `&mut RuntimeContext` and implements `Deref`/`DerefMut`,
//! so the code it protects uses the context through the guard. Cleanup runs
//! in `Drop`, on success, on `?` and during unwinding alike.

use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use rustc_hash::FxHashSet;

use super::{Frame, LifecycleScope, Phase, RuntimeContext};
use crate::callable::SelfRef;
use crate::object::Object;

/// An active call frame.
///
/// On drop: the stack is cut back to the top of the parameters, and the
/// caller's frame, `self` and depth come back.
pub struct FrameGuard<'a> {
    ctx: &'a mut RuntimeContext,
    saved_frame: Frame,
    saved_this: Option<SelfRef>,
}

impl<'a> FrameGuard<'a> {
    pub(super) fn new(
        ctx: &'a mut RuntimeContext,
        saved_frame: Frame,
        saved_this: Option<SelfRef>,
    ) -> Self {
        FrameGuard {
            ctx,
            saved_frame,
            saved_this,
        }
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        let frame = self.ctx.frame;
        self.ctx.stack.truncate(frame.base + frame.slots);
        let this = self.saved_this.take();
        self.ctx.restore(self.saved_frame, this);
    }
}

impl Deref for FrameGuard<'_> {
    type Target = RuntimeContext;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for FrameGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

/// Stack height saved before pushing temporaries; restored on drop.
pub struct StackMark<'a> {
    ctx: &'a mut RuntimeContext,
    height: usize,
}

impl<'a> StackMark<'a> {
    pub(super) fn new(ctx: &'a mut RuntimeContext) -> Self {
        let height = ctx.stack.len();
        StackMark { ctx, height }
    }

    /// Height recorded when the mark was taken.
    pub fn height(&self) -> usize {
        self.height
    }
}

impl Drop for StackMark<'_> {
    fn drop(&mut self) {
        self.ctx.stack.truncate(self.height);
    }
}

impl Deref for StackMark<'_> {
    type Target = RuntimeContext;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for StackMark<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}

/// Membership in the construction or destruction scope of one object.
///
/// The first guard for an object opens the scope; nested guards for the same
/// object (base constructors, base destructors) join it. The scope closes
/// when the guard that opened it drops.
pub struct LifecycleGuard<'a> {
    ctx: &'a mut RuntimeContext,
    phase: Phase,
    object: Rc<Object>,
    opened: bool,
}

impl<'a> LifecycleGuard<'a> {
    pub(super) fn open(ctx: &'a mut RuntimeContext, phase: Phase, object: &Rc<Object>) -> Self {
        let scopes = ctx.scopes(phase);
        let exists = scopes.iter().any(|s| Rc::ptr_eq(&s.object, object));
        if !exists {
            scopes.push(LifecycleScope {
                object: Rc::clone(object),
                done: FxHashSet::default(),
            });
        }
        LifecycleGuard {
            ctx,
            phase,
            object: Rc::clone(object),
            opened: !exists,
        }
    }

    /// Whether this guard opened the scope.
    pub fn is_outermost(&self) -> bool {
        self.opened
    }

    fn scope(&mut self) -> Option<&mut LifecycleScope> {
        let object = Rc::clone(&self.object);
        self.ctx
            .scopes(self.phase)
            .iter_mut()
            .rev()
            .find(|s| Rc::ptr_eq(&s.object, &object))
    }

    /// Whether `class` has already run in this scope.
    pub fn is_done(&mut self, class: &str) -> bool {
        self.scope().is_some_and(|s| s.done.contains(class))
    }

    /// Record `class` as run. Returns `false` if it already was.
    pub fn mark_done(&mut self, class: &Rc<str>) -> bool {
        self.scope()
            .is_some_and(|s| s.done.insert(Rc::clone(class)))
    }
}

impl Drop for LifecycleGuard<'_> {
    fn drop(&mut self) {
        if !self.opened {
            return;
        }
        let object = Rc::clone(&self.object);
        let scopes = self.ctx.scopes(self.phase);
        if let Some(pos) = scopes.iter().rposition(|s| Rc::ptr_eq(&s.object, &object)) {
            scopes.remove(pos);
        }
    }
}

impl Deref for LifecycleGuard<'_> {
    type Target = RuntimeContext;

    fn deref(&self) -> &Self::Target {
        self.ctx
    }
}

impl DerefMut for LifecycleGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.ctx
    }
}
