//! `codaport export` handler.

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use url::Url;

use codaport_core::{Dispatcher, ExportResult, Exporter};

use crate::cli::{ExportArgs, GlobalOpts, OutputFormat};
use crate::config;
use crate::download;
use crate::error::CliError;
use crate::output::{self, FieldRow};

/// What the command prints: the export result plus where the file landed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportReport {
    #[serde(flatten)]
    result: ExportResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved_to: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes: Option<usize>,
}

pub async fn handle(args: ExportArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config()?;
    let format = config::output_format(&cfg, global);
    let color = output::should_color(config::color_mode(&cfg, global));

    let mut settings = config::export_settings(&cfg, global)?;
    if let Some(attempts) = args.max_attempts {
        settings.max_poll_attempts = attempts;
    }
    let timeout = settings.request_timeout;

    let store = config::credential_store(&cfg, global);
    let dispatcher = Dispatcher::new(Exporter::new(settings, Arc::new(store)));

    let spinner = spinner(global.quiet, "Exporting page from Coda...");
    let result = dispatcher.export_page(&args.url).await;
    spinner.finish_and_clear();

    let (Some(link), Some(filename)) = (result.download_url.clone(), result.filename.clone())
    else {
        return Err(fail(result, format, global.quiet));
    };

    let mut report = ExportReport {
        result,
        saved_to: None,
        bytes: None,
    };

    if !args.no_download {
        let url = Url::parse(&link).map_err(|e| CliError::Internal {
            message: format!("validated link failed to parse: {e}"),
        })?;
        let dir = args
            .dir
            .or_else(|| cfg.download_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        let target = dir.join(&filename);

        let spinner = self::spinner(global.quiet, &format!("Downloading {filename}..."));
        let saved = download::save(&url, &target, args.force, timeout).await;
        spinner.finish_and_clear();

        report.bytes = Some(saved?);
        report.saved_to = Some(target);
    }

    let out = output::render_single(
        format,
        &report,
        |r| detail(r, color),
        |r| {
            r.saved_to
                .as_ref()
                .map_or_else(|| link.clone(), |p| p.display().to_string())
        },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Structured formats still print the failed result so scripts can read it;
/// the error itself goes to stderr with the exit code.
fn fail(result: ExportResult, format: OutputFormat, quiet: bool) -> CliError {
    if format.is_structured() {
        let report = ExportReport {
            result: result.clone(),
            saved_to: None,
            bytes: None,
        };
        let out = output::render_single(format, &report, |_| String::new(), |_| String::new());
        output::print_output(&out, quiet);
    }

    let message = result
        .error
        .unwrap_or_else(|| "Export failed for an unknown reason".into());
    match result.kind {
        Some(kind) => CliError::from_export(message, kind),
        None => CliError::Internal { message },
    }
}

fn detail(report: &ExportReport, color: bool) -> String {
    let mut rows = Vec::with_capacity(4);
    if let Some(filename) = &report.result.filename {
        rows.push(FieldRow::new("File", filename.clone()));
    }
    if let Some(path) = &report.saved_to {
        rows.push(FieldRow::new("Saved to", path.display().to_string()));
    }
    if let Some(bytes) = report.bytes {
        rows.push(FieldRow::new("Size", format!("{bytes} bytes")));
    }
    if let Some(link) = &report.result.download_url {
        rows.push(FieldRow::new("Link", output::muted(link, color)));
    }

    let headline = if report.saved_to.is_some() {
        "Export saved"
    } else {
        "Export ready"
    };
    format!(
        "{} {headline}\n{}",
        output::success_mark(color),
        output::render_table(&rows)
    )
}

/// Spinner on stderr, hidden when stderr is not a terminal or in quiet mode.
fn spinner(quiet: bool, message: &str) -> ProgressBar {
    if quiet || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
        .template("{spinner:.cyan} {msg} {elapsed:.dim}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_owned());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
