// ABOUTME: CLI driver tests: exit codes and stream routing for the
// standalone binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn script(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write script");
    file
}

#[test]
fn test_successful_script_exits_zero() {
    let file = script("print('hello from script')\n");
    Command::cargo_bin("minipy")
        .unwrap()
        .arg(file.path())
        .assert()
        .success()
        .stdout("hello from script\n");
}

#[test]
fn test_lexical_error_exits_65() {
    let file = script("s = 'unterminated\n");
    Command::cargo_bin("minipy")
        .unwrap()
        .arg(file.path())
        .assert()
        .code(65)
        .stderr(predicate::str::contains("LexerError"));
}

#[test]
fn test_syntax_error_exits_65() {
    let file = script("x = )\n");
    Command::cargo_bin("minipy")
        .unwrap()
        .arg(file.path())
        .assert()
        .code(65)
        .stderr(predicate::str::contains("SyntaxError"));
}

#[test]
fn test_runtime_error_exits_70() {
    let file = script("print('before')\n1 / 0\n");
    Command::cargo_bin("minipy")
        .unwrap()
        .arg(file.path())
        .assert()
        .code(70)
        .stdout("before\n")
        .stderr(predicate::str::contains("ZeroDivisionError: division by zero"));
}

#[test]
fn test_missing_file_exits_one() {
    Command::cargo_bin("minipy")
        .unwrap()
        .arg("definitely-not-a-real-script.mpy")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot open"));
}
