//! Terminal rendering of compile and runtime errors.

use std::io::{self, Write};

use quill_eval::Error;

/// ANSI color codes for terminal output.
mod colors {
    pub const ERROR: &str = "\x1b[1;31m"; // Bold red
    pub const NOTE: &str = "\x1b[1;36m"; // Bold cyan
    pub const BOLD: &str = "\x1b[1m";
    pub const SECONDARY: &str = "\x1b[1;34m"; // Bold blue
    pub const RESET: &str = "\x1b[0m";
}

/// Color output mode for the terminal emitter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Color when the output is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Parse a `--color=` value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "auto" => Some(ColorMode::Auto),
            "always" => Some(ColorMode::Always),
            "never" => Some(ColorMode::Never),
            _ => None,
        }
    }

    /// For `Auto`, `is_tty` decides.
    pub fn should_use_colors(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

/// Writes errors as `error[CODE]: message` followed by the location, the
/// offending source line and, for runtime errors, the unwound frames.
pub struct TerminalEmitter<W: Write> {
    writer: W,
    colors: bool,
    source: Option<String>,
    file_path: Option<String>,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn with_color_mode(writer: W, mode: ColorMode, is_tty: bool) -> Self {
        TerminalEmitter {
            writer,
            colors: mode.should_use_colors(is_tty),
            source: None,
            file_path: None,
        }
    }

    /// Source text used to quote the line a compile error points at.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Point the emitter at another file, e.g. the imported module a
    /// compile error was raised in.
    pub fn set_source(&mut self, path: impl Into<String>, source: Option<String>) {
        self.file_path = Some(path.into());
        self.source = source;
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_colored(&mut self, text: &str, color: &str) {
        if self.colors {
            let _ = write!(self.writer, "{color}{text}{}", colors::RESET);
        } else {
            let _ = write!(self.writer, "{text}");
        }
    }

    pub fn emit(&mut self, error: &Error) {
        let header = format!("error[{}]", error.code());
        self.write_colored(&header, colors::ERROR);
        let message = match error {
            Error::Compile { error, .. } => error.kind.to_string(),
            Error::Runtime(error) => error.kind.to_string(),
        };
        self.write_colored(&format!(": {message}"), colors::BOLD);
        let _ = writeln!(self.writer);

        match error {
            Error::Compile { module, error } => {
                let path = self
                    .file_path
                    .clone()
                    .unwrap_or_else(|| module.to_string());
                self.write_location(&path, error.line);
                self.write_source_line(error.line);
            }
            Error::Runtime(error) => {
                if let Some(path) = self.file_path.clone() {
                    self.write_colored("  --> ", colors::SECONDARY);
                    let _ = writeln!(self.writer, "{path}");
                }
                for frame in &error.trace {
                    self.write_colored("  = ", colors::SECONDARY);
                    self.write_colored("in", colors::NOTE);
                    let _ = writeln!(self.writer, " {frame}");
                }
            }
        }
    }

    fn write_location(&mut self, path: &str, line: u32) {
        self.write_colored("  --> ", colors::SECONDARY);
        let _ = writeln!(self.writer, "{path}:{line}");
    }

    fn write_source_line(&mut self, line: u32) {
        let text = self.source.as_deref().and_then(|source| {
            let index = usize::try_from(line).ok()?.checked_sub(1)?;
            source.lines().nth(index).map(str::to_string)
        });
        let Some(text) = text else {
            return;
        };
        let number = line.to_string();
        let gutter = " ".repeat(number.len());
        self.write_colored(&format!("{gutter} |"), colors::SECONDARY);
        let _ = writeln!(self.writer);
        self.write_colored(&format!("{number} | "), colors::SECONDARY);
        let _ = writeln!(self.writer, "{}", text.trim_end());
        self.write_colored(&format!("{gutter} |"), colors::SECONDARY);
        let _ = writeln!(self.writer);
    }

    pub fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}

impl TerminalEmitter<io::Stderr> {
    /// An emitter for stderr, detecting whether it is a terminal.
    pub fn stderr(mode: ColorMode) -> Self {
        let is_tty = io::IsTerminal::is_terminal(&io::stderr());
        TerminalEmitter::with_color_mode(io::stderr(), mode, is_tty)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests use unwrap for brevity")]
mod tests;
