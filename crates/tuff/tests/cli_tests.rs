//! End-to-end tests for the `tuff` binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn tuff() -> Command {
    let mut cmd = Command::cargo_bin("tuff").unwrap();
    cmd.env_remove("RUST_LOG").arg("--no-color");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_check_verified_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "ok.tuff", "fn divide(n: I32, d: I32 != 0): I32 => n / d;");

    tuff()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("verified"));
}

#[test]
fn test_check_rejected_file_prints_diagnostic() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "bad.tuff", "fn bad(x: I32): I32 =>\n    100 / x;");

    tuff()
        .arg("check")
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("E_SAFETY_DIV_BY_ZERO"))
        .stderr(predicate::str::contains("bad.tuff:2:5"))
        .stderr(predicate::str::contains("100 / x;"));
}

#[test]
fn test_check_json_output() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "overflow.tuff", "fn f(): I32 => 2147483647 + 1;");

    let output = tuff().arg("check").arg("--json").arg(&path).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["code"], "E_SAFETY_OVERFLOW");
    assert_eq!(value["loc"]["line"], 1);
}

#[test]
fn test_relaxed_flag_and_project_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "lax.tuff", "fn bad(x: I32): I32 => 100 / x;");

    tuff().arg("check").arg("--relaxed").arg(&path).assert().success();

    write(&dir, "tuff.json", r#"{"typecheck": {"strictSafety": false}}"#);
    tuff().arg("check").arg(&path).assert().success();
    tuff().arg("check").arg("--strict").arg(&path).assert().code(1);
}

#[test]
fn test_structural_errors_survive_relaxed_mode() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "arity.tuff", "fn g(a: I32): I32 => a;\nfn f(): I32 => g();");

    tuff()
        .arg("check")
        .arg("--relaxed")
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("E_TYPE_ARITY_MISMATCH"));
}

#[test]
fn test_check_json_ast_input() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "program.json",
        r#"{"body": [{"kind": "FnDecl", "name": "one", "params": [],
            "returnType": {"kind": "NamedType", "name": "I32"},
            "body": {"kind": "NumberLiteral", "value": 1}}]}"#,
    );

    tuff().arg("check").arg(&path).assert().success();
}

#[test]
fn test_missing_file_is_usage_error() {
    let dir = TempDir::new().unwrap();
    tuff()
        .arg("check")
        .arg(dir.path().join("nope.tuff"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn test_malformed_json_program_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "broken.json", "{ not a program");

    tuff()
        .arg("check")
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not a valid JSON program"));
}

#[test]
fn test_explain_known_and_unknown_codes() {
    tuff()
        .args(["explain", "E_MATCH_NON_EXHAUSTIVE"])
        .assert()
        .success()
        .stdout(predicate::str::contains("does not cover every member"));

    tuff()
        .args(["explain", "E_NOPE"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown error code"));

    tuff()
        .arg("explain")
        .assert()
        .success()
        .stdout(predicate::str::contains("E_SAFETY_NULLABLE_POINTER_GUARD"));
}
