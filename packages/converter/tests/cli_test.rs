//! Tests for the md2orchestra command-line tool.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn test_writes_yaml_to_stdout() {
    let mut cmd = cargo_bin_cmd!("md2orchestra");
    cmd.arg(fixture("orders.md"))
        .arg("--reference")
        .arg(fixture("reference.yaml"));

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("name: Orders"))
        .stdout(predicate::str::contains("msgType: D"))
        .stderr(predicate::str::contains("Converted"));
}

#[test]
fn test_writes_output_and_diagnostics_files() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out").join("orders.yaml");
    let diagnostics = dir.path().join("diagnostics.json");

    let mut cmd = cargo_bin_cmd!("md2orchestra");
    cmd.arg(fixture("orders.md"))
        .arg("-o")
        .arg(&output)
        .arg("-d")
        .arg(&diagnostics);

    cmd.assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Saved to:"));

    let yaml = fs::read_to_string(&output).unwrap();
    assert!(yaml.contains("NewOrderSingle"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&diagnostics).unwrap()).unwrap();
    let records = json.as_array().expect("diagnostics array");
    assert!(records.iter().any(|r| {
        r["severity"] == "ERROR" && r["message"].as_str().unwrap().contains("OrdTypeCodeSet")
    }));
}

#[test]
fn test_error_limit_fails_run() {
    let mut cmd = cargo_bin_cmd!("md2orchestra");
    cmd.arg(fixture("broken.md")).arg("--max-errors").arg("0");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("9999"));
}

#[test]
fn test_errors_within_limit_succeed() {
    let mut cmd = cargo_bin_cmd!("md2orchestra");
    cmd.arg(fixture("broken.md")).arg("--max-errors").arg("5");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Errors:"));
}

#[test]
fn test_missing_input_fails() {
    let mut cmd = cargo_bin_cmd!("md2orchestra");
    cmd.arg("/nonexistent/orders.md");

    cmd.assert().failure().stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_bad_depth_rejected() {
    let mut cmd = cargo_bin_cmd!("md2orchestra");
    cmd.arg(fixture("orders.md")).arg("--depth").arg("deep");

    cmd.assert().failure();
}
