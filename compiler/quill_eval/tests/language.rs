// Test code uses unwrap/expect for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end language tests: source in, printed output or error out.
//!
//! # Organization
//!
//! - `common/` - helpers that run a source module through an `Interpreter`
//! - `expressions` - operators, literals, strings, arrays
//! - `statements` - control flow and scoping
//! - `calls` - arguments, by-reference passing, natives, call depth
//! - `classes` - layout, dispatch, construction, destruction, operators
//! - `modules` - imports, prototypes, load order
//! - `properties` - generated programs checked against a reference

#[path = "language/common.rs"]
mod common;

#[path = "language/expressions.rs"]
mod expressions;

#[path = "language/statements.rs"]
mod statements;

#[path = "language/calls.rs"]
mod calls;

#[path = "language/classes.rs"]
mod classes;

#[path = "language/modules.rs"]
mod modules;

#[path = "language/properties.rs"]
mod properties;
