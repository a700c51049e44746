//! Engine configuration.
//!
//! Values come from defaults, then an optional TOML file, then command line
//! flags. `NO_COLOR` disables colour regardless of the file.

use crate::engine::runner::MAX_TIMEOUT;
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 24 * 60 * 60;
const DEFAULT_GRACE_PERIOD_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Global deadline for one run.
    pub timeout_secs: u64,
    /// How long an aborted group may take to acknowledge the stop request.
    pub grace_period_ms: u64,
    /// Label expression, threaded through to groups.
    pub label_filter: String,
    /// Extra catalog entries merged over the built-in catalog.
    pub catalog: Option<PathBuf>,
    /// Target environment snapshot.
    pub target: Option<PathBuf>,
    /// Where to write the claim results document.
    pub claim_output: Option<PathBuf>,
    pub no_color: bool,
    pub log_json: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            grace_period_ms: DEFAULT_GRACE_PERIOD_MS,
            label_filter: String::new(),
            catalog: None,
            target: None,
            claim_output: None,
            no_color: false,
            log_json: false,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "timeout_secs",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.timeout_secs > MAX_TIMEOUT.as_secs() {
            return Err(ConfigError::Invalid {
                field: "timeout_secs",
                message: format!("must be at most {} seconds", MAX_TIMEOUT.as_secs()),
            });
        }
        Ok(())
    }

    /// Apply `NO_COLOR` from the environment.
    pub fn apply_env(&mut self) {
        if std::env::var_os("NO_COLOR").is_some() {
            self.no_color = true;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}
