//! End-to-end coverage against the built `lumenc` binary, run with a fresh
//! temp directory as the working directory so the default
//! `compiled_test.txt` output never collides across tests.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn lumenc() -> Command {
    Command::cargo_bin("lumenc").unwrap()
}

fn write_source(dir: &std::path::Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("input.lum");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn constant_arithmetic_computes_seven() {
    let dir = tempdir().unwrap();
    let input = write_source(dir.path(), "i32 main() { return 1 + 2 * 3; }");

    lumenc().arg(&input).current_dir(dir.path()).assert().success();

    let asm = fs::read_to_string(dir.path().join("compiled_test.txt")).unwrap();
    assert!(asm.contains("extern printf"));
    assert!(asm.contains("Result was: %d"));
    assert!(asm.contains("call printf"));
}

#[test]
fn global_is_emitted_and_loaded() {
    let dir = tempdir().unwrap();
    let input = write_source(dir.path(), "i32 x = 10; i32 main() { return x; }");

    lumenc().arg(&input).current_dir(dir.path()).assert().success();

    let asm = fs::read_to_string(dir.path().join("compiled_test.txt")).unwrap();
    assert!(asm.contains("x: dd 10"));
    assert!(asm.contains("[x]"));
}

#[test]
fn if_else_emits_exactly_one_label_pair() {
    let dir = tempdir().unwrap();
    let input = write_source(
        dir.path(),
        "i32 main() { i32 a = 1; if (a == 1) { a = 2; } else { a = 3; } return a; }",
    );

    lumenc().arg(&input).current_dir(dir.path()).assert().success();

    let asm = fs::read_to_string(dir.path().join("compiled_test.txt")).unwrap();
    assert_eq!(asm.matches("main_else_0:").count(), 1);
    assert_eq!(asm.matches("main_end_if_0:").count(), 1);
}

#[test]
fn call_site_populates_argument_registers() {
    let dir = tempdir().unwrap();
    let input = write_source(
        dir.path(),
        "i32 add(i32 a, i32 b) { return a + b; } i32 main() { return add(2, 3); }",
    );

    lumenc().arg(&input).current_dir(dir.path()).assert().success();

    let asm = fs::read_to_string(dir.path().join("compiled_test.txt")).unwrap();
    assert!(asm.contains("[rbp-4]"));
    assert!(asm.contains("[rbp-8]"));
    assert!(asm.contains("call add"));
}

#[test]
fn illegal_assignment_target_is_rejected_with_no_output() {
    let dir = tempdir().unwrap();
    let input = write_source(dir.path(), "i32 main() { return 1 = 2; }");

    lumenc()
        .arg(&input)
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("illegal assignment target"));

    assert!(!dir.path().join("compiled_test.txt").exists());
}

#[test]
fn type_mismatch_is_rejected_with_no_output() {
    let dir = tempdir().unwrap();
    let input = write_source(dir.path(), "bool b = true; i32 x = b;");

    lumenc()
        .arg(&input)
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("type mismatch"));

    assert!(!dir.path().join("compiled_test.txt").exists());
}

#[test]
fn wrong_argument_count_prints_usage_and_exits_nonzero() {
    lumenc()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::starts_with("Usage:"));
}

#[test]
fn missing_input_file_is_an_io_error() {
    let dir = tempdir().unwrap();

    lumenc()
        .arg(dir.path().join("does_not_exist.lum"))
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(1);

    assert!(!dir.path().join("compiled_test.txt").exists());
}
