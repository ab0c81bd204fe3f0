//! CLI configuration: a thin wrapper around `codaport_config` that applies
//! `GlobalOpts` flag overrides (--api-base, --timeout, --api-key, ...).

use clap::ValueEnum;
use secrecy::SecretString;

use codaport_core::ExportSettings;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use codaport_config::{
    Config, ConfiguredStore, config_path, load_config, load_config_or_default, load_file,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Export settings from the config file with flag overrides applied.
pub fn export_settings(cfg: &Config, global: &GlobalOpts) -> Result<ExportSettings, CliError> {
    let mut cfg = cfg.clone();
    if let Some(base) = &global.api_base {
        cfg.api_base.clone_from(base);
    }
    if let Some(timeout) = global.timeout {
        cfg.defaults.timeout = timeout;
    }
    Ok(cfg.to_export_settings()?)
}

/// The credential store for exports: `--api-key` first, then the
/// configured chain.
pub fn credential_store(cfg: &Config, global: &GlobalOpts) -> ConfiguredStore {
    ConfiguredStore::new(cfg, config_path())
        .with_override(global.api_key.clone().map(SecretString::from))
}

/// The credential store as persisted: no `--api-key`, no `api_key_env`,
/// and the plaintext key only if it is actually written in the file. Used
/// by the `config` subcommands.
pub fn persistent_store(cfg: &Config) -> ConfiguredStore {
    let path = config_path();
    let persisted = Config {
        api_key: load_file(&path).ok().and_then(|file| file.api_key),
        api_key_env: None,
        ..cfg.clone()
    };
    ConfiguredStore::new(&persisted, path)
}

/// Output format: flag > config `defaults.output` > table.
pub fn output_format(cfg: &Config, global: &GlobalOpts) -> OutputFormat {
    global
        .output
        .or_else(|| OutputFormat::from_str(&cfg.defaults.output, true).ok())
        .unwrap_or(OutputFormat::Table)
}

/// Color mode: flag > config `defaults.color` > auto.
pub fn color_mode(cfg: &Config, global: &GlobalOpts) -> ColorMode {
    global
        .color
        .or_else(|| ColorMode::from_str(&cfg.defaults.color, true).ok())
        .unwrap_or(ColorMode::Auto)
}
