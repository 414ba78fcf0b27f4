//! Parse subcommand tests

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn parse_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("stdout is JSON")
}

#[test]
fn test_parse_stdin() {
    let output = cargo_bin_cmd!("markmatch")
        .arg("parse")
        .write_stdin("# Heading\n\nParagraph.")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let tree = parse_json(&output);
    assert_eq!(tree["type"], "root");
    assert_eq!(tree["children"][0]["type"], "heading");
    assert_eq!(tree["children"][0]["depth"], 1);
    assert_eq!(tree["children"][1]["type"], "paragraph");
    assert!(tree.get("position").is_none());
}

#[test]
fn test_parse_simple_file() {
    let temp_dir = TempDir::new().unwrap();
    let test_file = temp_dir.path().join("test.md");
    fs::write(&test_file, "Paragraph with *emphasis*.").unwrap();

    cargo_bin_cmd!("markmatch")
        .args(["parse", test_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"emphasis\""));
}

#[test]
fn test_parse_positions_flag() {
    let output = cargo_bin_cmd!("markmatch")
        .args(["parse", "--positions"])
        .write_stdin("a\n")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let tree = parse_json(&output);
    assert_eq!(tree["children"][0]["position"]["start"]["line"], 1);
    assert_eq!(tree["children"][0]["position"]["start"]["column"], 1);
    assert_eq!(tree["children"][0]["position"]["end"]["offset"], 1);
}

#[test]
fn test_parse_with_config() {
    let temp_dir = TempDir::new().unwrap();
    let test_file = temp_dir.path().join("test.md");
    let config_file = temp_dir.path().join("custom.toml");

    fs::write(&test_file, "~~gone~~").unwrap();
    fs::write(&config_file, "[extensions]\nstrikethrough = false\n").unwrap();

    cargo_bin_cmd!("markmatch")
        .args([
            "parse",
            "--config",
            config_file.to_str().unwrap(),
            test_file.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"value\": \"~~gone~~\""))
        .stdout(predicate::str::contains("delete").not());
}

#[test]
fn test_parse_discovers_config_next_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let test_file = temp_dir.path().join("test.md");
    fs::write(&test_file, "| a |\n| - |\n").unwrap();
    fs::write(temp_dir.path().join(".markmatch.toml"), "flavor = \"commonmark\"\n").unwrap();

    cargo_bin_cmd!("markmatch")
        .args(["parse", test_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"paragraph\""))
        .stdout(predicate::str::contains("\"type\": \"table\"").not());
}

#[test]
fn test_parse_invalid_config() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("bad.toml");
    fs::write(&config_file, "flavor = \"pandoc\"\n").unwrap();

    cargo_bin_cmd!("markmatch")
        .args(["parse", "--config", config_file.to_str().unwrap()])
        .write_stdin("text")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"));
}

#[test]
fn test_parse_missing_file() {
    cargo_bin_cmd!("markmatch")
        .args(["parse", "/nonexistent/file.md"])
        .assert()
        .failure();
}
