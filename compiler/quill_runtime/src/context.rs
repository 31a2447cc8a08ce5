//! The runtime context: execution stack, current frame and `self`, call
//! depth, and the bookkeeping for in-progress constructions and
//! destructions.
//!
//! Frame entry, stack marks and construction/destruction scopes are RAII
//! guards (see `guard`) that dereference to the context, so code holding a
//! guard keeps using the context through it and the state is restored on
//! every exit path.

mod guard;

use std::rc::Rc;

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::callable::{SelfRef, Signature};
use crate::config::RuntimeConfig;
use crate::error::{RuntimeErrorKind, RuntimeResult};
use crate::object::Object;
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::stack::ExecStack;
use crate::value::{FunctionRef, Value};

pub use guard::{FrameGuard, LifecycleGuard, StackMark};

/// Layout of the active call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    /// Absolute index of parameter 0.
    pub base: usize,
    /// Absolute index of the return slot (directly above the parameters).
    pub return_index: usize,
    /// Parameter slots, including extra variadic arguments.
    pub slots: usize,
}

/// Which lifecycle chain a scope tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Construct,
    Destroy,
}

/// Classes already handled for one object during its outermost
/// construction or destruction.
pub(crate) struct LifecycleScope {
    pub(crate) object: Rc<Object>,
    pub(crate) done: FxHashSet<Rc<str>>,
}

pub struct RuntimeContext {
    pub stack: ExecStack,
    frame: Frame,
    this: Option<SelfRef>,
    depth: usize,
    config: RuntimeConfig,
    constructing: Vec<LifecycleScope>,
    destroying: Vec<LifecycleScope>,
    print: SharedPrintHandler,
}

impl RuntimeContext {
    pub fn new(config: RuntimeConfig, print: SharedPrintHandler) -> Self {
        RuntimeContext {
            stack: ExecStack::new(config.stack_block_size),
            frame: Frame::default(),
            this: None,
            depth: 0,
            config,
            constructing: Vec::new(),
            destroying: Vec::new(),
            print,
        }
    }

    #[inline]
    pub fn frame(&self) -> Frame {
        self.frame
    }

    #[inline]
    pub fn base(&self) -> usize {
        self.frame.base
    }

    #[inline]
    pub fn return_index(&self) -> usize {
        self.frame.return_index
    }

    #[inline]
    pub fn this(&self) -> Option<&SelfRef> {
        self.this.as_ref()
    }

    /// Number of active calls.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn print(&self) -> &SharedPrintHandler {
        &self.print
    }

    /// Absolute index of frame slot `slot`.
    #[inline]
    pub fn local_index(&self, slot: usize) -> usize {
        self.frame.base + slot
    }

    #[inline]
    pub fn local(&self, slot: usize) -> Value {
        self.stack.load(self.frame.base + slot)
    }

    #[inline]
    pub fn set_local(&mut self, slot: usize, value: Value) {
        let index = self.frame.base + slot;
        let stored = self.stack.set(index, value);
        debug_assert!(stored, "local slot {slot} is not on the stack");
    }

    pub fn set_return(&mut self, value: Value) {
        let index = self.frame.return_index;
        self.stack.set(index, value);
    }

    /// Move the return value out of the return slot.
    pub fn take_return(&mut self) -> Value {
        let index = self.frame.return_index;
        self.stack.take(index)
    }

    /// Enter a call frame for `argc` arguments already on the stack.
    ///
    /// Excess arguments are discarded, missing trailing ones are filled with
    /// their defaults (or `nothing`), the return slot is reserved and `this`
    /// installed. The returned guard restores the caller's frame, `self` and
    /// depth on drop and releases everything above the parameters, which stay
    /// on the stack for by-reference write-back.
    pub fn enter_frame(
        &mut self,
        signature: &Signature,
        argc: usize,
        this: Option<SelfRef>,
    ) -> RuntimeResult<FrameGuard<'_>> {
        if self.depth >= self.config.max_call_depth {
            return Err(RuntimeErrorKind::CallDepthExceeded(self.config.max_call_depth).into());
        }

        let argc = argc.min(self.stack.len());
        let slots = signature.frame_slots(argc);
        if argc > slots {
            let keep = self.stack.len() - (argc - slots);
            self.stack.truncate(keep);
        }
        for param in signature.params.iter().skip(argc) {
            self.stack.push(param.default.clone().unwrap_or_default());
        }

        let base = self.stack.len() - slots;
        self.stack.push(Value::Nothing);
        let frame = Frame {
            base,
            return_index: base + slots,
            slots,
        };
        trace!(base, slots, depth = self.depth + 1, "enter frame");

        let saved_frame = std::mem::replace(&mut self.frame, frame);
        let saved_this = std::mem::replace(&mut self.this, this);
        self.depth += 1;
        Ok(FrameGuard::new(self, saved_frame, saved_this))
    }

    /// Record the stack height; the guard truncates back to it on drop.
    pub fn mark(&mut self) -> StackMark<'_> {
        StackMark::new(self)
    }

    /// Call `function` with `args`, discarding by-reference write-back.
    pub fn call(
        &mut self,
        function: &FunctionRef,
        this: Option<SelfRef>,
        args: impl IntoIterator<Item = Value>,
    ) -> RuntimeResult<Value> {
        let mut mark = self.mark();
        let height = mark.height();
        mark.stack.push_range(args);
        let argc = mark.stack.len() - height;
        function.invoke(&mut mark, argc, this)
    }

    /// Open (or join) the construction scope of `object`.
    pub fn begin_construction(&mut self, object: &Rc<Object>) -> LifecycleGuard<'_> {
        LifecycleGuard::open(self, Phase::Construct, object)
    }

    /// Open (or join) the destruction scope of `object`.
    pub fn begin_destruction(&mut self, object: &Rc<Object>) -> LifecycleGuard<'_> {
        LifecycleGuard::open(self, Phase::Destroy, object)
    }

    /// Whether any construction is in progress.
    pub fn constructing(&self) -> bool {
        !self.constructing.is_empty()
    }

    pub(crate) fn scopes(&mut self, phase: Phase) -> &mut Vec<LifecycleScope> {
        match phase {
            Phase::Construct => &mut self.constructing,
            Phase::Destroy => &mut self.destroying,
        }
    }

    pub(crate) fn restore(&mut self, frame: Frame, this: Option<SelfRef>) {
        trace!(base = frame.base, depth = self.depth.saturating_sub(1), "leave frame");
        self.frame = frame;
        self.this = this;
        self.depth = self.depth.saturating_sub(1);
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        RuntimeContext::new(RuntimeConfig::default(), stdout_handler())
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
