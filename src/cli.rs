//! Minimal CLI: version | check (construct records from JSON/NDJSON documents)
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;

use recordutils::{ConstructError, ErrorTree, RecordSchema, Registry, SchemaDocument, construct_json, dump_json};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// construct and validate records declared in a JSON schema document
#[derive(Parser, Debug)]
#[command(name = "recordutils")]
pub struct CommandLineInterface {
    /// JSON logger config ({"filter": "...", "ansi": false}); RUST_LOG takes precedence
    #[arg(long, global = true)]
    log_config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// print the version
    Version,
    /// construct one record per input document and report the outcome
    Check(CheckOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// schema document declaring the enums and record types
    #[arg(long)]
    schema: PathBuf,

    /// record type to construct
    #[arg(long)]
    record: String,

    /// output .json report file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// exit successfully even when documents fail
    #[arg(long)]
    ignore_failures: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

/// One input document.
#[derive(Debug)]
struct Document {
    source: String,
    value: serde_json::Value,
}

/// Per-document outcome, as written to the report.
#[derive(Debug, Serialize)]
struct Report {
    source: String,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<ErrorTree>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> anyhow::Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .map_err(|error| anyhow!("failed to resolve input file paths: {error}"))?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {source_path_str}"))?;
            if self.ndjson {
                for (line_no, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let origin = format!("{source_path_str}:{}", line_no + 1);
                    let value = serde_json::from_str::<serde_json::Value>(line)
                        .with_context(|| format!("failed to parse NDJSON line ({origin})"))?;
                    documents.push(self.select(origin, value)?);
                }
            } else {
                let value = serde_json::from_str::<serde_json::Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
                documents.push(self.select(source_path_str, value)?);
            }
        }
        Ok(documents)
    }

    fn select(&self, source: String, value: serde_json::Value) -> anyhow::Result<Document> {
        let Some(pointer) = self.json_pointer.as_deref() else {
            return Ok(Document { source, value });
        };
        let value = value
            .pointer(pointer)
            .cloned()
            .ok_or_else(|| anyhow!("JSON pointer {pointer} selects nothing in {source}"))?;
        Ok(Document { source, value })
    }
}

impl Report {
    fn build(schema: &Arc<RecordSchema>, document: Document) -> Self {
        let Document { source, value } = document;
        let mut report = Report { source, ok: false, record: None, errors: None, error: None };
        match construct_json(schema, value) {
            Ok(record) => {
                report.ok = true;
                report.record = Some(dump_json(&record));
            }
            Err(ConstructError::Invalid(invalid)) => report.errors = Some(invalid.into_tree()),
            Err(other) => report.error = Some(other.to_string()),
        }
        report
    }

    fn print_status(&self) {
        if self.ok {
            eprintln!("{} {}", "ok".green().bold(), self.source);
        } else if let Some(errors) = &self.errors {
            eprintln!("{} {}", "invalid".red().bold(), self.source);
            for (path, message) in errors.paths() {
                eprintln!("    {} {message}", format!("{path}:").dimmed());
            }
        } else {
            let reason = self.error.as_deref().unwrap_or_default();
            eprintln!("{} {} {reason}", "rejected".yellow().bold(), self.source);
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn log_config(&self) -> Option<&Path> {
        self.log_config.as_deref()
    }

    pub fn run(&self) -> anyhow::Result<ExitCode> {
        match &self.cmd {
            Command::Version => {
                println!("recordutils {}", env!("CARGO_PKG_VERSION"));
                Ok(ExitCode::SUCCESS)
            }
            Command::Check(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(ExitCode::SUCCESS);
                }

                // 1) declare
                let mut registry = Registry::with_stock_validators();
                SchemaDocument::load(&target.schema)?.declare_into(&mut registry)?;
                let schema = registry
                    .record(&target.record)
                    .cloned()
                    .ok_or_else(|| anyhow!("record type {} is not declared in {}", target.record, target.schema.display()))?;

                // 2) construct every document
                let documents = target.input_settings.load_documents()?;
                tracing::debug!(documents = documents.len(), record = %target.record, "checking documents");
                let reports: Vec<Report> = documents
                    .into_par_iter()
                    .map(|document| Report::build(&schema, document))
                    .collect();
                for report in &reports {
                    report.print_status();
                }

                // 3) write the report
                let report_src = serde_json::to_string_pretty(&reports)?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &report_src)
                        .with_context(|| format!("failed to write report {}", out.display()))?;
                } else {
                    println!("{report_src}");
                }

                let failed = reports.iter().filter(|report| !report.ok).count();
                if failed > 0 && !target.ignore_failures {
                    eprintln!("{} of {} document(s) failed", failed, reports.len());
                    return Ok(ExitCode::FAILURE);
                }
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                return Err(format!("glob pattern matched no files: {pattern}").into());
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    out.sort();
    out.dedup();
    Ok(out)
}
