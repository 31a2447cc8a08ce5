//! Native stack growth for recursive compilation and evaluation.
//!
//! Quill compiles and evaluates expression trees, statement bodies and
//! script-to-script calls by plain Rust recursion. A script such as
//! `function f(n) { return n == 0 ? 0 : f(n - 1) + 1; }` recurses through
//! several Rust frames per script call, so long chains would overflow the
//! host thread's stack well before `RuntimeConfig::max_call_depth` trips.
//!
//! Every recursive entry point (`Node::eval`, `Stmt::exec`, script function
//! invocation, syntax-tree lowering) wraps its body in
//! [`ensure_sufficient_stack`], which switches to a freshly allocated segment
//! when the remaining native stack drops below the red zone.
//!
//! On `wasm32` the guard is a passthrough.

/// Remaining stack below which a new segment is allocated.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the native stack if less than the red zone remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// Run `f` directly; wasm manages its own stack.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Remaining native stack in bytes, if the platform can tell.
#[cfg(not(target_arch = "wasm32"))]
pub fn remaining_stack() -> Option<usize> {
    stacker::remaining_stack()
}

#[cfg(target_arch = "wasm32")]
pub fn remaining_stack() -> Option<usize> {
    None
}

#[cfg(test)]
mod tests;
