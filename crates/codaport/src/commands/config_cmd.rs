//! Config subcommand handlers.

use std::fmt::Write as _;
use std::io::{self, IsTerminal};

use dialoguer::Confirm;
use serde::Serialize;

use codaport_core::{API_KEY, MIN_API_KEY_LEN, SecretStore, is_valid_api_key};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, ConfiguredStore};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "****";

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::SetKey { key } => set_key(key, global),
        ConfigCommand::ClearKey => clear_key(global),
        ConfigCommand::Show => show(global),
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}

// ── set-key / clear-key ─────────────────────────────────────────────

fn set_key(key: Option<String>, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config()?;
    let store = config::persistent_store(&cfg);

    let key = match key {
        Some(key) => key,
        None => rpassword::prompt_password("Coda API key: ").map_err(prompt_err)?,
    };
    let key = key.trim();
    if !is_valid_api_key(key) {
        return Err(CliError::Validation {
            field: "api key".into(),
            reason: format!(
                "expected at least {MIN_API_KEY_LEN} characters of letters, digits, '-' or '_'"
            ),
        });
    }

    if stored_key(&store).is_some() && !confirm_replace(global)? {
        output::print_status("Keeping the existing API key.", global.quiet);
        return Ok(());
    }

    store.set(API_KEY, key)?;
    output::print_status(
        &format!(
            "{} API key saved to {}",
            output::success_mark(false),
            destination(&store)
        ),
        global.quiet,
    );
    Ok(())
}

fn clear_key(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config()?;
    let store = config::persistent_store(&cfg);

    store.delete(API_KEY)?;
    output::print_status(
        &format!("API key removed from {}", destination(&store)),
        global.quiet,
    );
    Ok(())
}

/// The key currently persisted, ignoring lookup failures.
fn stored_key(store: &ConfiguredStore) -> Option<String> {
    store.get(API_KEY).ok().flatten()
}

fn confirm_replace(global: &GlobalOpts) -> Result<bool, CliError> {
    if global.yes {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: "replace API key".into(),
        });
    }
    Confirm::new()
        .with_prompt("An API key is already stored. Replace it?")
        .default(false)
        .interact()
        .map_err(prompt_err)
}

fn destination(store: &ConfiguredStore) -> String {
    if store.uses_keyring() {
        "the system keyring".into()
    } else {
        store.path().display().to_string()
    }
}

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

// ── show ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ConfigView {
    path: String,
    api_key_status: String,
    #[serde(flatten)]
    config: Config,
}

fn show(global: &GlobalOpts) -> Result<(), CliError> {
    // Succeeds without a config file and renders the defaults.
    let cfg = config::load_config_or_default();
    let store = config::credential_store(&cfg, global);

    let api_key_status = match store.resolve_api_key() {
        Ok(Some((_, source))) => format!("set ({source})"),
        Ok(None) => "not set".into(),
        Err(e) => format!("unavailable ({e})"),
    };
    let view = ConfigView {
        path: config::config_path().display().to_string(),
        api_key_status,
        config: redacted(cfg),
    };

    let format = config::output_format(&view.config, global);
    let out = output::render_single(format, &view, format_view, |v| v.api_key_status.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}

fn redacted(mut cfg: Config) -> Config {
    if cfg.api_key.is_some() {
        cfg.api_key = Some(REDACTED.into());
    }
    cfg
}

/// TOML-ish listing of the effective config.
fn format_view(view: &ConfigView) -> String {
    let cfg = &view.config;
    let mut out = String::new();

    let _ = writeln!(out, "# {}", view.path);
    let _ = writeln!(out, "# api key: {}", view.api_key_status);
    let _ = writeln!(out);
    let _ = writeln!(out, "api_base = \"{}\"", cfg.api_base);
    let _ = writeln!(out, "use_keyring = {}", cfg.use_keyring);
    if let Some(key) = &cfg.api_key {
        let _ = writeln!(out, "api_key = \"{key}\"");
    }
    if let Some(env) = &cfg.api_key_env {
        let _ = writeln!(out, "api_key_env = \"{env}\"");
    }
    if let Some(dir) = &cfg.download_dir {
        let _ = writeln!(out, "download_dir = \"{}\"", dir.display());
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let _ = writeln!(out);
    let _ = writeln!(out, "[export]");
    let _ = writeln!(out, "max_page_batches = {}", cfg.export.max_page_batches);
    let _ = writeln!(out, "max_poll_attempts = {}", cfg.export.max_poll_attempts);
    let _ = writeln!(out, "settle_delay_ms = {}", cfg.export.settle_delay_ms);
    let _ = writeln!(out, "poll_interval_ms = {}", cfg.export.poll_interval_ms);
    let _ = write!(out, "retry_backoff_ms = {}", cfg.export.retry_backoff_ms);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_key_is_masked() {
        let cfg = Config {
            api_key: Some("super-secret-api-key-value-0123456789".into()),
            ..Config::default()
        };
        let view = ConfigView {
            path: "/tmp/config.toml".into(),
            api_key_status: "set (config file (plaintext))".into(),
            config: redacted(cfg),
        };

        let text = format_view(&view);
        assert!(text.contains("api_key = \"****\""));
        assert!(!text.contains("super-secret"));

        let json = serde_json::to_string(&view).unwrap_or_default();
        assert!(!json.contains("super-secret"));
        assert!(json.contains("\"api_base\""));
    }
}
