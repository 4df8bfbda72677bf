use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::fetch_head::ProbeOptions;
use crate::objects::is_valid_hash;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per probe (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: f64,
}

/// Longest backoff a config file may ask for.
pub const MAX_RETRY_DELAY_SECS: f64 = 3600.0;

impl RetryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidRetry(
                "max_attempts must be at least 1".into(),
            ));
        }
        for (name, secs) in [
            ("base_delay_secs", self.base_delay_secs),
            ("max_delay_secs", self.max_delay_secs),
        ] {
            if !secs.is_finite() || !(0.0..=MAX_RETRY_DELAY_SECS).contains(&secs) {
                return Err(ConfigError::InvalidRetry(format!(
                    "{name} must be between 0 and {MAX_RETRY_DELAY_SECS}, got {secs}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 5.0,
        }
    }
}

/// HEAD request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 15,
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

impl From<&ProbeConfig> for ProbeOptions {
    fn from(cfg: &ProbeConfig) -> Self {
        ProbeOptions {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.timeout_secs),
            user_agent: cfg.user_agent.clone(),
        }
    }
}

/// Restricts which items a command considers. Empty lists match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Item URL must start with one of these.
    #[serde(default)]
    pub url_prefixes: Vec<String>,
    /// Item hash must start with one of these (lowercase hex).
    #[serde(default)]
    pub hash_prefixes: Vec<String>,
}

impl Filter {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url_prefixes.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::InvalidFilter("empty url prefix".into()));
        }
        for p in &self.hash_prefixes {
            let padded = format!("{p:0<32}");
            if p.is_empty() || p.len() > 32 || !is_valid_hash(&padded) {
                return Err(ConfigError::InvalidFilter(format!(
                    "hash prefix {p:?} is not lowercase hex"
                )));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.url_prefixes.is_empty() && self.hash_prefixes.is_empty()
    }
}

/// Invalid run parameters or filters; reported before any work starts.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    NoWorkers,
    #[error("batch size must be at least 1")]
    EmptyBatch,
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("invalid retry settings: {0}")]
    InvalidRetry(String),
}

/// Global configuration loaded from `~/.config/headcheck/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadcheckConfig {
    /// Number of concurrent probe workers.
    pub workers: usize,
    /// Allowed requests per second. Negative means unlimited.
    pub rate_limit: i64,
    /// Number of results committed per database transaction.
    pub batch_size: usize,
    /// Root of the sharded local object store, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objects_dir: Option<PathBuf>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
    #[serde(default)]
    pub probe: ProbeConfig,
    /// Named filters; `fetch-headers` uses the one named "headers".
    #[serde(default)]
    pub filters: BTreeMap<String, Filter>,
}

impl Default for HeadcheckConfig {
    fn default() -> Self {
        Self {
            workers: 32,
            rate_limit: -1,
            batch_size: 4096,
            objects_dir: None,
            retry: None,
            probe: ProbeConfig::default(),
            filters: BTreeMap::new(),
        }
    }
}

impl HeadcheckConfig {
    /// Look up a named filter; a missing entry means "no restriction".
    pub fn filter(&self, name: &str) -> Result<Filter, ConfigError> {
        let filter = self.filters.get(name).cloned().unwrap_or_default();
        filter.validate()?;
        Ok(filter)
    }
}

/// Parameters of one `fetch-headers` run after CLI overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParams {
    pub workers: usize,
    pub recheck: bool,
    pub rate_limit: i64,
    pub batch_size: usize,
}

impl RunParams {
    /// Config values with optional command-line overrides.
    pub fn from_config(
        cfg: &HeadcheckConfig,
        workers: Option<usize>,
        recheck: bool,
        rate_limit: Option<i64>,
        batch_size: Option<usize>,
    ) -> Self {
        Self {
            workers: workers.unwrap_or(cfg.workers),
            recheck,
            rate_limit: rate_limit.unwrap_or(cfg.rate_limit),
            batch_size: batch_size.unwrap_or(cfg.batch_size),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.batch_size == 0 {
            return Err(ConfigError::EmptyBatch);
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("headcheck")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HeadcheckConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = HeadcheckConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml).with_context(|| format!("write config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data =
        fs::read_to_string(&path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: HeadcheckConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
