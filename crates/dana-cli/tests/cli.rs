use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn cmd() -> Command {
    Command::cargo_bin("dana").unwrap()
}

#[test]
fn runs_a_na_file_and_exits_zero() {
    let mut file = tempfile::Builder::new().suffix(".na").tempfile().unwrap();
    writeln!(file, "print(\"hi\")").unwrap();

    cmd()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("hi"));
}

#[test]
fn rejects_non_na_extension() {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    writeln!(file, "print(\"hi\")").unwrap();

    cmd()
        .arg(file.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("is not a .na file"));
}

#[test]
fn missing_file_is_an_execution_error() {
    cmd()
        .arg("does-not-exist.na")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn a_runtime_error_exits_with_code_one() {
    let mut file = tempfile::Builder::new().suffix(".na").tempfile().unwrap();
    writeln!(file, "x = undefined_fn()").unwrap();

    cmd()
        .arg(file.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("NameError"));
}

#[test]
fn a_parse_error_exits_with_code_one_and_shows_location() {
    let mut file = tempfile::Builder::new().suffix(".na").tempfile().unwrap();
    writeln!(file, "if x\n    pass").unwrap();

    cmd()
        .arg(file.path())
        .assert()
        .failure()
        .code(1);
}

#[test]
fn help_flag_succeeds() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dana"));
}
