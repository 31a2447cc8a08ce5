//! Quill CLI
//!
//! `quill run|check|lex <file.ql> [options]`

use quillc::commands::{check_file, lex_file, run_file};
use quillc::tracing_setup::init_tracing;
use quillc::{parse_options, CliOptions};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];
    let command_fn: fn(&CliOptions, &str) -> bool = match command.as_str() {
        "run" => run_file,
        "check" => check_file,
        "lex" => lex_file,
        "help" | "--help" | "-h" => {
            print_usage();
            return;
        }
        "version" | "--version" | "-V" => {
            println!("Quill {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    let options = match parse_options(&args[2..]) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("error: {message}");
            std::process::exit(1);
        }
    };
    let Some(path) = options.file.clone() else {
        eprintln!("Usage: quill {command} <file.ql> [options]");
        std::process::exit(1);
    };

    init_tracing(options.trace_tree);
    if !command_fn(&options, &path) {
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("Quill scripting language");
    println!();
    println!("Usage: quill <command> <file.ql> [options]");
    println!();
    println!("Commands:");
    println!("  run <file.ql>        Load a module and call its main() if defined");
    println!("  check <file.ql>      Compile a module and its imports without running");
    println!("  lex <file.ql>        Print the tokens of a file");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Options:");
    println!("  --max-depth=<n>      Maximum call depth (default 4096)");
    println!("  --stack-block=<n>    Execution stack block size (default 256)");
    println!("  --color=<mode>       Error colors: auto, always, never");
    println!("  --trace-tree         Show compiler and runtime tracing as a tree");
    println!();
    println!("Imports resolve to .ql files next to the given file.");
    println!("Set RUST_LOG (e.g. RUST_LOG=quill_eval=debug) for log output.");
    println!();
    println!("Examples:");
    println!("  quill run game.ql");
    println!("  quill run deep.ql --max-depth=100000");
    println!("  quill check lib.ql --color=never");
}
