//! Daemon configuration.
//!
//! Loaded from a TOML file via [`VouchConfig::from_toml_file`]. Every
//! section and field has a default, so an empty file is a valid config.
//! CLI flags and `VOUCH_*` environment variables override file values.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use vouch_audit::AuditConfig;
use vouch_cleanup::CleanupConfig;
use vouch_rpc::RpcConfig;
use vouch_submission::{RateLimitConfig, SubmissionConfig};
use vouch_utils::LogFormat;
use vouch_verification::TokenConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VouchConfig {
    #[serde(default)]
    pub log_format: LogFormat,

    /// Filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub tokens: TokenConfig,

    #[serde(default)]
    pub submission: SubmissionConfig,

    /// Applied separately per client address and per reviewer email.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub cleanup: CleanupConfig,

    #[serde(default)]
    pub audit: AuditConfig,

    #[serde(default)]
    pub rpc: RpcConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Lmdb,
    /// Process memory. Tokens do not survive a restart.
    Memory,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// LMDB environment directory.
    #[serde(default = "default_data_dir")]
    pub path: PathBuf,

    /// LMDB map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./vouch_data")
}

fn default_map_size() -> usize {
    256 * 1024 * 1024
}

impl VouchConfig {
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.tokens.validate().context("invalid [tokens] section")?;
        self.cleanup
            .validate()
            .map_err(anyhow::Error::msg)
            .context("invalid [cleanup] section")?;
        anyhow::ensure!(
            self.rate_limit.window_ms > 0 && self.rate_limit.max_submissions > 0,
            "invalid [rate_limit] section: window_ms and max_submissions must be positive"
        );
        Ok(())
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Audit trail file used when no path is configured and the backend
    /// has no audit database of its own.
    pub fn fallback_audit_path(&self) -> PathBuf {
        self.storage.path.join("audit.jsonl")
    }
}

impl Default for VouchConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            tokens: TokenConfig::default(),
            submission: SubmissionConfig::default(),
            rate_limit: RateLimitConfig::default(),
            cleanup: CleanupConfig::default(),
            audit: AuditConfig::default(),
            rpc: RpcConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_data_dir(),
            map_size: default_map_size(),
        }
    }
}
