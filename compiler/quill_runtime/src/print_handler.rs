//! Output sink for the `print` native.
//!
//! The CLI writes to stdout; embedders and tests capture into a buffer so
//! script output can be asserted on. Dispatch is a closed enum rather than a
//! trait object.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

/// Captured script output.
#[derive(Default)]
pub struct OutputBuffer {
    text: Mutex<String>,
}

impl OutputBuffer {
    pub fn new() -> Self {
        OutputBuffer::default()
    }

    fn write_line(&self, line: &str) {
        let mut text = self.text.lock();
        text.push_str(line);
        text.push('\n');
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        self.text.lock().clone()
    }

    /// Drain the buffer, returning what it held.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.text.lock())
    }
}

/// Where `print` output goes.
pub enum PrintHandler {
    /// Write to the process's stdout.
    Stdout,
    /// Append to an in-memory buffer.
    Buffer(OutputBuffer),
    /// Discard output.
    Silent,
}

impl PrintHandler {
    /// Write one line; the newline is added here.
    pub fn println(&self, line: &str) {
        match self {
            PrintHandler::Stdout => {
                let mut out = std::io::stdout().lock();
                // A closed stdout (e.g. `quill run x | head`) is not a script error.
                let _ = writeln!(out, "{line}");
            }
            PrintHandler::Buffer(buf) => buf.write_line(line),
            PrintHandler::Silent => {}
        }
    }

    /// Captured output; empty for handlers that don't capture.
    pub fn output(&self) -> String {
        match self {
            PrintHandler::Buffer(buf) => buf.contents(),
            PrintHandler::Stdout | PrintHandler::Silent => String::new(),
        }
    }

    /// Drain captured output.
    pub fn take_output(&self) -> String {
        match self {
            PrintHandler::Buffer(buf) => buf.take(),
            PrintHandler::Stdout | PrintHandler::Silent => String::new(),
        }
    }
}

/// Print handler shared between the interpreter and its host.
pub type SharedPrintHandler = Arc<PrintHandler>;

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Stdout)
}

pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Buffer(OutputBuffer::new()))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandler::Silent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_collects_lines() {
        let handler = buffer_handler();
        handler.println("hello");
        handler.println("world");
        assert_eq!(handler.output(), "hello\nworld\n");
    }

    #[test]
    fn take_output_drains() {
        let handler = buffer_handler();
        handler.println("once");
        assert_eq!(handler.take_output(), "once\n");
        assert_eq!(handler.output(), "");
    }

    #[test]
    fn silent_and_stdout_capture_nothing() {
        silent_handler().println("dropped");
        assert_eq!(silent_handler().output(), "");
        assert_eq!(stdout_handler().output(), "");
    }
}
