//! Flags shared by the `run`, `check` and `lex` commands.

use quill_runtime::RuntimeConfig;

use crate::emitter::ColorMode;

/// Parsed command-line options for one invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CliOptions {
    /// Source file to operate on.
    pub file: Option<String>,
    pub max_depth: Option<usize>,
    pub stack_block: Option<usize>,
    pub color: ColorMode,
    /// Render tracing output as an indented tree.
    pub trace_tree: bool,
}

impl CliOptions {
    /// Runtime configuration with any overrides from the command line.
    pub fn runtime_config(&self) -> RuntimeConfig {
        let mut config = RuntimeConfig::new();
        if let Some(depth) = self.max_depth {
            config = config.max_call_depth(depth);
        }
        if let Some(size) = self.stack_block {
            config = config.stack_block_size(size);
        }
        config
    }
}

/// Parse the arguments following the subcommand.
///
/// The first argument not starting with `-` is the file; later ones are
/// rejected, as are unknown flags.
pub fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    for arg in args {
        if let Some(value) = arg.strip_prefix("--max-depth=") {
            options.max_depth = Some(positive(value, "--max-depth")?);
        } else if let Some(value) = arg.strip_prefix("--stack-block=") {
            options.stack_block = Some(positive(value, "--stack-block")?);
        } else if let Some(value) = arg.strip_prefix("--color=") {
            options.color = ColorMode::parse(value)
                .ok_or_else(|| format!("invalid --color value '{value}' (auto, always, never)"))?;
        } else if arg == "--trace-tree" {
            options.trace_tree = true;
        } else if arg.starts_with('-') {
            return Err(format!("unknown option '{arg}'"));
        } else if options.file.is_none() {
            options.file = Some(arg.clone());
        } else {
            return Err(format!("unexpected argument '{arg}'"));
        }
    }
    Ok(options)
}

fn positive(value: &str, flag: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("{flag} expects a positive integer, got '{value}'")),
    }
}
