//! Quill runtime.
//!
//! Everything compiled code executes against:
//! - `Value`, `ObjectHandle`, `FunctionRef`: tagged values with strong/weak
//!   object aliasing
//! - `Object`: field rows plus optional native payloads
//! - `ExecStack`: the segmented value stack
//! - `RuntimeContext`: stack, frame, `self`, call depth and lifecycle scopes,
//!   with RAII guards for frames and stack marks
//! - `Vtable`: dispatch tables, layout composition, construction and
//!   destruction chains
//! - `Callable`, `NativeFunction`: the calling contract and host functions
//! - `array`: the built-in `Array` class

pub mod array;
mod callable;
mod config;
mod context;
mod error;
mod native;
mod object;
mod print_handler;
mod stack;
mod value;
mod vtable;

pub use callable::{BoundMethod, Callable, Param, SelfRef, Signature};
pub use config::{RuntimeConfig, DEFAULT_MAX_CALL_DEPTH, DEFAULT_STACK_BLOCK_SIZE};
pub use context::{Frame, FrameGuard, LifecycleGuard, RuntimeContext, StackMark};
pub use error::{
    host_error, member_not_found, type_mismatch, unexpected_type, RuntimeError,
    RuntimeErrorKind, RuntimeResult,
};
pub use native::{NativeBuilder, NativeCall, NativeFunction};
pub use object::{NativePayload, Object};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, OutputBuffer, PrintHandler,
    SharedPrintHandler,
};
pub use stack::ExecStack;
pub use value::{format_number, FunctionRef, ObjectHandle, Value};
pub use vtable::{
    BaseEntry, Constructor, DeriveError, FieldSlot, Member, Method, PayloadFactory, TypeFlags,
    Vtable, VtableBuilder,
};
