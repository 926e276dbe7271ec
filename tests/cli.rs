use std::path::Path;
use std::process::Command;

use serde_json::json;

const SCHEMA: &str = r#"{
  "enums": {"Mood": {"happy": "h", "sad": "s"}},
  "records": [
    {"name": "Entry", "nest": true, "validate": true,
     "fields": [
       {"name": "mood", "type": "Mood"},
       {"name": "count", "type": "int", "validators": "non_negative"}
     ]}
  ]
}"#;

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

fn check(dir: &Path, extra: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_recordutils"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(["check", "--schema", "schema.json", "--record", "Entry", "--out", "report.json"])
        .args(extra)
        .output()
        .unwrap()
}

fn report(dir: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(dir.join("report.json")).unwrap()).unwrap()
}

#[test]
fn valid_documents_succeed() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "schema.json", SCHEMA);
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    write(dir.path(), "docs/one.json", r#"{"mood": "h", "count": 3}"#);
    write(dir.path(), "docs/two.json", r#"{"mood": "s", "count": 0}"#);

    let output = check(dir.path(), &["--input", "docs/*.json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report = report(dir.path());
    let documents = report.as_array().unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0]["source"], "docs/one.json");
    assert_eq!(documents[0]["record"], json!({"mood": "h", "count": 3}));
    assert!(documents.iter().all(|entry| entry["ok"] == true));
}

#[test]
fn invalid_documents_fail_with_error_tree() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "schema.json", SCHEMA);
    write(dir.path(), "input.ndjson", "{\"mood\": \"h\", \"count\": 1}\n\n{\"mood\": \"cat\", \"count\": -1}\n{\"mood\": \"h\"}\n");

    let output = check(dir.path(), &["--ndjson", "--input", "input.ndjson"]);
    assert_eq!(output.status.code(), Some(1));

    let report = report(dir.path());
    let entries = report.as_array().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0]["ok"], true);
    assert_eq!(entries[1]["source"], "input.ndjson:3");
    assert_eq!(entries[1]["ok"], false);
    assert!(entries[1]["errors"]["mood"].is_string());
    assert_eq!(entries[1]["errors"]["count"], "The given number is negative.");
    assert!(entries[2]["errors"].is_null());
    assert!(entries[2]["error"].as_str().unwrap().contains("count"));
}

#[test]
fn ignore_failures_exits_successfully() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "schema.json", SCHEMA);
    write(dir.path(), "doc.json", r#"{"payload": {"mood": "h", "count": -5}}"#);

    let output = check(dir.path(), &["--input", "doc.json", "--json-pointer", "/payload", "--ignore-failures"]);
    assert!(output.status.success());
    assert_eq!(report(dir.path())[0]["ok"], false);
}

#[test]
fn unknown_record_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "schema.json", SCHEMA);
    write(dir.path(), "doc.json", "{}");
    let output = Command::new(env!("CARGO_BIN_EXE_recordutils"))
        .current_dir(dir.path())
        .args(["check", "--schema", "schema.json", "--record", "Missing", "--input", "doc.json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Missing"));
}
