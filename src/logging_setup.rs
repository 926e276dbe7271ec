//! stderr logging for the binary.
//!
//! Filter precedence: `RUST_LOG`, then the JSON logger config (explicit
//! `--log-config` path, else `logger_config.json` in the working directory),
//! then `warn`.
use std::path::Path;

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "logger_config.json";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoggerConfig {
    #[serde(default = "default_filter")]
    filter: String,
    #[serde(default)]
    ansi: bool,
}

fn default_filter() -> String { "warn".to_string() }

impl Default for LoggerConfig {
    fn default() -> Self { Self { filter: default_filter(), ansi: false } }
}

pub fn configure_logger(explicit: Option<&Path>) {
    let config = load_config(explicit);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|error| {
            eprintln!("logger config: invalid filter {:?} ({error}), using warn", config.filter);
            EnvFilter::new("warn")
        });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(explicit: Option<&Path>) -> LoggerConfig {
    let path = explicit.unwrap_or(Path::new(DEFAULT_CONFIG));
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => {
            // a missing default config is normal
            if explicit.is_some() {
                eprintln!("logger config {}: {error}, falling back to defaults", path.display());
            }
            return LoggerConfig::default();
        }
    };
    match serde_json::from_str::<LoggerConfig>(&source) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("logger config {}: {error}, falling back to defaults", path.display());
            LoggerConfig::default()
        }
    }
}
