//! Configuration for the codaport CLI.
//!
//! A single TOML file (no profiles: there is one Coda account per user)
//! layered under `CODAPORT_*` environment variables, plus the credential
//! stores the exporter reads its API key from. [`Config::to_export_settings`]
//! translates the file into `codaport_core::ExportSettings`.

mod store;

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use codaport_core::ExportSettings;

pub use store::{ConfiguredStore, KEYRING_SERVICE, KeySource, KeyringStore};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "CODAPORT_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Coda REST API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API key (plaintext, only used when the keyring is disabled).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Store and read the API key in the system keyring.
    #[serde(default = "default_true")]
    pub use_keyring: bool,

    /// Where `export` saves files when `--dir` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub export: ExportTuning,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            api_key_env: None,
            use_keyring: true,
            download_dir: None,
            defaults: Defaults::default(),
            export: ExportTuning::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

/// Retry and polling knobs. Defaults match the pacing Coda expects.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExportTuning {
    #[serde(default = "default_max_page_batches")]
    pub max_page_batches: u32,

    #[serde(default = "default_max_poll_attempts")]
    pub max_poll_attempts: u32,

    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ExportTuning {
    fn default() -> Self {
        Self {
            max_page_batches: default_max_page_batches(),
            max_poll_attempts: default_max_poll_attempts(),
            settle_delay_ms: default_settle_delay_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_api_base() -> String {
    codaport_core::ExportSettings::default().api_base
}
fn default_true() -> bool {
    true
}
fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_max_page_batches() -> u32 {
    50
}
fn default_max_poll_attempts() -> u32 {
    20
}
fn default_settle_delay_ms() -> u64 {
    1_000
}
fn default_poll_interval_ms() -> u64 {
    1_000
}
fn default_retry_backoff_ms() -> u64 {
    2_000
}

impl Config {
    /// Build the core export settings, validating the API base URL.
    pub fn to_export_settings(&self) -> Result<ExportSettings, ConfigError> {
        let base: url::Url = self
            .api_base
            .parse()
            .map_err(|e| ConfigError::Validation {
                field: "api_base".into(),
                reason: format!("invalid URL '{}': {e}", self.api_base),
            })?;
        if !matches!(base.scheme(), "https" | "http") {
            return Err(ConfigError::Validation {
                field: "api_base".into(),
                reason: format!("expected an http(s) URL, got '{}'", self.api_base),
            });
        }
        if self.defaults.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }

        Ok(ExportSettings {
            api_base: self.api_base.clone(),
            request_timeout: Duration::from_secs(self.defaults.timeout),
            max_page_batches: self.export.max_page_batches,
            max_poll_attempts: self.export.max_poll_attempts,
            settle_delay: Duration::from_millis(self.export.settle_delay_ms),
            poll_interval: Duration::from_millis(self.export.poll_interval_ms),
            retry_backoff: Duration::from_millis(self.export.retry_backoff_ms),
        })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `CODAPORT_CONFIG`, else the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    ProjectDirs::from("io", "codaport", "codaport").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("codaport");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path` + environment. A missing file yields the
/// defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CODAPORT_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load only what is written in the file at `path`, ignoring the
/// environment. Used before rewriting the file so env overrides are not
/// persisted.
pub fn load_file(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .extract()?;
    Ok(config)
}

/// Load config, returning a default if it can't be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_config_from(&dir.path().join("absent.toml")).expect("loads");

        assert_eq!(cfg.api_base, "https://coda.io/apis/v1/");
        assert!(cfg.use_keyring);
        assert_eq!(cfg.export.max_poll_attempts, 20);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
use_keyring = false
download_dir = "/tmp/exports"

[defaults]
output = "json"
timeout = 10

[export]
max_poll_attempts = 5
retry_backoff_ms = 250
"#,
        )
        .expect("write");

        let cfg = load_config_from(&path).expect("loads");
        assert!(!cfg.use_keyring);
        assert_eq!(cfg.download_dir, Some(PathBuf::from("/tmp/exports")));
        assert_eq!(cfg.defaults.output, "json");
        // Untouched keys keep their defaults.
        assert_eq!(cfg.defaults.color, "auto");
        assert_eq!(cfg.export.max_page_batches, 50);

        let settings = cfg.to_export_settings().expect("valid");
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
        assert_eq!(settings.max_poll_attempts, 5);
        assert_eq!(settings.retry_backoff, Duration::from_millis(250));
        assert_eq!(settings.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn default_settings_match_core_defaults() {
        let settings = Config::default().to_export_settings().expect("valid");
        assert_eq!(settings, ExportSettings::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config {
            api_key: Some("plaintext-key".into()),
            use_keyring: false,
            ..Config::default()
        };

        save_config_to(&cfg, &path).expect("saves");
        let loaded = load_config_from(&path).expect("loads");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn rejects_bad_api_base() {
        let cfg = Config {
            api_base: "not a url".into(),
            ..Config::default()
        };
        assert!(matches!(
            cfg.to_export_settings(),
            Err(ConfigError::Validation { field, .. }) if field == "api_base"
        ));

        let cfg = Config {
            api_base: "ftp://coda.io/apis/v1/".into(),
            ..Config::default()
        };
        assert!(cfg.to_export_settings().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let mut cfg = Config::default();
        cfg.defaults.timeout = 0;
        assert!(matches!(
            cfg.to_export_settings(),
            Err(ConfigError::Validation { field, .. }) if field == "timeout"
        ));
    }
}
