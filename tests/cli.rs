use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn mercu(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mercu"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to launch mercu")
}

fn case_program(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/programs")
        .join(name)
        .join("program.mer")
}

#[test]
fn requires_a_file_argument() {
    let output = mercu(&[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("<FILE>"));
}

#[test]
fn rejects_files_without_mer_extension() {
    let output = mercu(&["program.py"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("File extension must be .mer"));
}

#[test]
fn runs_a_program_without_color() {
    let program = case_program("chained_assignment");
    let output = mercu(&["--no-color", program.to_str().expect("utf-8 path")]);
    assert!(output.status.success(), "{output:?}");
    assert_eq!(String::from_utf8_lossy(&output.stdout), "777\nsharedshared\n");
}

#[test]
fn reports_the_error_kind_and_exits_non_zero() {
    let program = case_program("error_undefined_variable");
    let output = mercu(&["--no-color", program.to_str().expect("utf-8 path")]);
    assert!(!output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "before\n");
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("name error: Undefined variable 'ghost'")
    );
}

#[test]
fn reports_missing_files() {
    let output = mercu(&["does/not/exist.mer"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Reading does/not/exist.mer"));
}
