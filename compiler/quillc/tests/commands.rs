//! The commands against files on disk.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;

use quillc::commands::{check_file, lex_file, run_file};
use quillc::{parse_options, CliOptions, ColorMode};

fn write(dir: &Path, name: &str, source: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, source).unwrap();
    path.display().to_string()
}

fn options() -> CliOptions {
    CliOptions {
        color: ColorMode::Never,
        ..CliOptions::default()
    }
}

#[test]
fn run_loads_imports_beside_the_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "lib.ql", "function twice(x) { return x * 2; }");
    let main = write(
        dir.path(),
        "app.ql",
        "import lib; function main() { return lib::twice(21); }",
    );
    assert!(run_file(&options(), &main));
    assert!(check_file(&options(), &main));
}

#[test]
fn failures_are_reported_as_false() {
    let dir = tempfile::tempdir().unwrap();
    let bad = write(dir.path(), "bad.ql", "var x = ;");
    assert!(!check_file(&options(), &bad));
    assert!(!run_file(&options(), &bad));

    let crash = write(dir.path(), "crash.ql", "function main() { return 1 % 0; }");
    assert!(check_file(&options(), &crash));
    assert!(!run_file(&options(), &crash));

    let missing = dir.path().join("nope.ql").display().to_string();
    assert!(!run_file(&options(), &missing));
}

#[test]
fn errors_in_imports_fail_the_importer() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "broken.ql", "function f( {}");
    let main = write(dir.path(), "main.ql", "import broken;");
    assert!(!check_file(&options(), &main));
}

#[test]
fn the_call_depth_flag_applies() {
    let dir = tempfile::tempdir().unwrap();
    let deep = write(
        dir.path(),
        "deep.ql",
        "function down(n) { return n == 0 ? 0 : down(n - 1); } function main() { return down(200); }",
    );
    assert!(run_file(&options(), &deep));
    let args = vec!["--max-depth=50".to_string(), "--color=never".to_string()];
    assert!(!run_file(&parse_options(&args).unwrap(), &deep));
}

#[test]
fn lex_reports_bad_characters() {
    let dir = tempfile::tempdir().unwrap();
    let good = write(dir.path(), "good.ql", "var s = \"hi\"; // done");
    let bad = write(dir.path(), "bad.ql", "var s = `;");
    assert!(lex_file(&options(), &good));
    assert!(!lex_file(&options(), &bad));
}
