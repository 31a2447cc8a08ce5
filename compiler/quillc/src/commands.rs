//! The `run`, `check` and `lex` commands.
//!
//! Each command reports its own errors and returns whether it succeeded;
//! `main` turns that into the exit code.

use std::path::Path;

use quill_eval::{Error, Interpreter, ModuleLoader};
use quill_runtime::{stdout_handler, Value};
use tracing::info;

use crate::emitter::TerminalEmitter;
use crate::loader::{module_name, FsLoader};
use crate::options::CliOptions;

/// Entry point a program may define.
pub const MAIN_FUNCTION: &str = "main";

/// A source file read for a command, with the loader for its imports.
struct Program {
    path: String,
    name: String,
    source: String,
    loader: FsLoader,
}

impl Program {
    fn open(path: &str) -> Option<Self> {
        let file = Path::new(path);
        let Some(name) = module_name(file) else {
            eprintln!("error: cannot derive a module name from '{path}'");
            return None;
        };
        let source = match std::fs::read_to_string(file) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("error: cannot read '{path}': {err}");
                return None;
            }
        };
        Some(Program {
            path: path.to_string(),
            name,
            source,
            loader: FsLoader::beside(file),
        })
    }

    fn interpreter(&self, options: &CliOptions) -> Interpreter {
        Interpreter::builder()
            .loader(self.loader.clone())
            .print_handler(stdout_handler())
            .config(options.runtime_config())
            .build()
    }

    /// Render `error`, quoting the file it was raised in.
    fn report(&self, error: &Error, options: &CliOptions) {
        let mut emitter = TerminalEmitter::stderr(options.color);
        match error.module() {
            Some(module) if module != self.name => {
                let path = self.loader.path_of(module);
                emitter.set_source(path.display().to_string(), self.loader.source(module));
            }
            _ => emitter.set_source(self.path.clone(), Some(self.source.clone())),
        }
        emitter.emit(error);
        emitter.flush();
    }
}

/// Compile and load a file, then call its `main()` if it defines one.
pub fn run_file(options: &CliOptions, path: &str) -> bool {
    let Some(program) = Program::open(path) else {
        return false;
    };
    let mut interp = program.interpreter(options);
    let result = interp
        .run_source(&program.name, &program.source)
        .and_then(|module| match module.function(MAIN_FUNCTION) {
            Some(_) => interp.call(&program.name, MAIN_FUNCTION, []),
            None => Ok(Value::Nothing),
        });
    match result {
        Ok(Value::Nothing) => true,
        Ok(value) => {
            println!("{value}");
            true
        }
        Err(err) => {
            program.report(&err, options);
            false
        }
    }
}

/// Compile a file and its imports without running anything.
pub fn check_file(options: &CliOptions, path: &str) -> bool {
    let Some(program) = Program::open(path) else {
        return false;
    };
    let mut interp = program.interpreter(options);
    match interp.check_source(&program.name, &program.source) {
        Ok(module) => {
            info!(module = %module.name(), "checked");
            println!("OK: {path} ({} imports)", module.dependencies().len());
            true
        }
        Err(err) => {
            program.report(&err, options);
            false
        }
    }
}

/// Print the tokens of a file, one per line.
pub fn lex_file(options: &CliOptions, path: &str) -> bool {
    let Some(program) = Program::open(path) else {
        return false;
    };
    match quill_lexer::lex(&program.source) {
        Ok(tokens) => {
            for token in tokens.iter() {
                println!(
                    "{:>4}  {:<8}  {}",
                    token.line,
                    token.kind.to_string(),
                    token.describe()
                );
            }
            true
        }
        Err(error) => {
            let error = Error::Compile {
                module: program.name.as_str().into(),
                error,
            };
            program.report(&error, options);
            false
        }
    }
}
