//! Clap derive structures for the `codaport` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// codaport -- export Coda pages to Markdown
#[derive(Debug, Parser)]
#[command(
    name = "codaport",
    version,
    about = "Export Coda pages to Markdown files",
    long_about = "Export a single Coda page to Markdown through the Coda REST API.\n\n\
        Paste the page URL from your browser; codaport finds the page,\n\
        starts a Markdown export, waits for it and downloads the file.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Coda API key (overrides the stored key)
    #[arg(long, env = "CODAPORT_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Coda API base URL
    #[arg(long, env = "CODAPORT_API_BASE", global = true)]
    pub api_base: Option<String>,

    /// Output format [default: table]
    #[arg(long, short = 'o', env = "CODAPORT_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds [default: 30]
    #[arg(long, env = "CODAPORT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

impl OutputFormat {
    /// JSON and YAML carry the full result, failures included.
    pub fn is_structured(self) -> bool {
        matches!(self, Self::Json | Self::JsonCompact | Self::Yaml)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Export a Coda page to Markdown
    #[command(alias = "x")]
    Export(ExportArgs),

    /// Manage the API key and configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Export ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Page URL, e.g. https://coda.io/d/My-Doc_dAbC123/My-Page_suXyZ
    pub url: String,

    /// Directory to save the Markdown file in
    #[arg(long, short = 'd')]
    pub dir: Option<PathBuf>,

    /// Only print the download link, do not save the file
    #[arg(long)]
    pub no_download: bool,

    /// Overwrite an existing file with the same name
    #[arg(long, short = 'f')]
    pub force: bool,

    /// Maximum number of export status checks
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Store the Coda API key (prompts when KEY is omitted)
    SetKey {
        /// API key from https://coda.io/account
        key: Option<String>,
    },

    /// Remove the stored API key
    ClearKey,

    /// Display the current configuration (secrets redacted)
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
