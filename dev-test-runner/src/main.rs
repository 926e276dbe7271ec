//! Runs every fixture case under `samples/` (or the directory given as the
//! first argument) and reports mismatches.
//!
//! A case directory holds `schema.json`, `input.json` and `expected.json`:
//!
//! ```json
//! {"record": "A", "outcome": "invalid", "error_paths": ["a", "b[0].b_value"]}
//! ```
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use serde::Deserialize;

use recordutils::{ConstructError, Registry, SchemaDocument, construct_json, dump_json};

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Outcome {
    /// constructed successfully
    Ok,
    /// failed with an aggregated error tree
    Invalid,
    /// failed immediately (missing/unexpected field, non-mapping input, ...)
    Rejected,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Expected {
    record: String,
    outcome: Outcome,
    #[serde(default)]
    dump: Option<serde_json::Value>,
    #[serde(default)]
    error_paths: Option<Vec<String>>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let source = std::fs::read_to_string(path).map_err(|error| format!("{}: {error}", path.display()))?;
    let de = &mut serde_json::Deserializer::from_str(&source);
    serde_path_to_error::deserialize::<_, T>(de)
        .map_err(|err| format!("{}: at JSON path {} → {}", path.display(), err.path(), err.inner()))
}

fn run_case(dir: &Path) -> Result<(), String> {
    let expected: Expected = read_json(&dir.join("expected.json"))?;
    let input: serde_json::Value = read_json(&dir.join("input.json"))?;

    let mut registry = Registry::with_stock_validators();
    SchemaDocument::load(&dir.join("schema.json"))
        .and_then(|document| document.declare_into(&mut registry))
        .map_err(|error| error.to_string())?;
    let schema = registry
        .record(&expected.record)
        .ok_or_else(|| format!("record {} is not declared", expected.record))?;

    match (construct_json(schema, input), expected.outcome) {
        (Ok(record), Outcome::Ok) => match &expected.dump {
            Some(dump) if *dump != dump_json(&record) => {
                Err(format!("dump mismatch\n  expected: {dump}\n  actual:   {}", dump_json(&record)))
            }
            _ => Ok(()),
        },
        (Err(ConstructError::Invalid(invalid)), Outcome::Invalid) => {
            let Some(expected_paths) = &expected.error_paths else { return Ok(()) };
            let mut actual: Vec<String> = invalid.tree().paths().into_iter().map(|(path, _)| path).collect();
            let mut wanted = expected_paths.clone();
            actual.sort();
            wanted.sort();
            if actual == wanted {
                Ok(())
            } else {
                Err(format!("error paths mismatch\n  expected: {wanted:?}\n  actual:   {actual:?}"))
            }
        }
        (Err(ConstructError::Invalid(_)), Outcome::Rejected) => Err("expected an immediate error, got an error tree".into()),
        (Err(_), Outcome::Rejected) => Ok(()),
        (Ok(record), other) => Err(format!("expected {other:?}, constructed {record}")),
        (Err(error), other) => Err(format!("expected {other:?}, got: {error}")),
    }
}

fn main() -> ExitCode {
    let root = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("samples"));
    let mut cases: Vec<PathBuf> = match std::fs::read_dir(&root) {
        Ok(entries) => entries.filter_map(Result::ok).map(|entry| entry.path()).filter(|path| path.is_dir()).collect(),
        Err(error) => {
            eprintln!("cannot read {}: {error}", root.display());
            return ExitCode::FAILURE;
        }
    };
    cases.sort();

    let mut failures = 0usize;
    for case in &cases {
        let name = case.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        match run_case(case) {
            Ok(()) => eprintln!("✅ {name}"),
            Err(reason) => {
                failures += 1;
                eprintln!("❌ {name}: {reason}");
            }
        }
    }
    eprintln!("{} case(s), {failures} failure(s)", cases.len());
    if failures > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
