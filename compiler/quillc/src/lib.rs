//! Quill command-line driver.
//!
//! The binary in `main.rs` only dispatches on the subcommand; everything it
//! calls lives here so the pieces can be tested without spawning a process.

pub mod commands;
pub mod emitter;
pub mod loader;
pub mod options;
pub mod tracing_setup;

pub use emitter::{ColorMode, TerminalEmitter};
pub use loader::{FsLoader, SOURCE_EXTENSION};
pub use options::{parse_options, CliOptions};
