//! Configuration loader and validator.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub sheet: Sheet,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
    pub request_timeout_ms: u64,
    pub primary_write_attempts: u32,
}

/// Spreadsheet mirror settings. The mirror is best-effort and optional;
/// with `enabled: false` the sheet channel simply stays waiting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sheet {
    pub enabled: bool,
    pub webhook_url: String,
}

impl Config {
    /// Ensure required directories exist (creates `app.data_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.app.data_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.app.data_dir)
    }

    /// Per-operation timeout applied to every adapter call.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.app.request_timeout_ms)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance. Missing store or mirror credentials
/// are fatal here, before any read or write is attempted.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if cfg.app.request_timeout_ms == 0 {
        return Err(ConfigError::Invalid("app.request_timeout_ms must be > 0"));
    }
    if cfg.app.primary_write_attempts == 0 {
        return Err(ConfigError::Invalid("app.primary_write_attempts must be >= 1"));
    }

    if cfg.sheet.enabled && cfg.sheet.webhook_url.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "sheet.webhook_url must be non-empty when sheet.enabled is true",
        ));
    }

    Ok(())
}

/// Example YAML content, also used by `punchlog config-example`.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"
  request_timeout_ms: 10000
  primary_write_attempts: 3

sheet:
  enabled: true
  webhook_url: "https://script.example.com/macros/s/DEPLOYMENT_ID/exec"
"#
}
