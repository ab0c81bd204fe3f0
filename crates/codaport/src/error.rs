//! CLI error types with miette diagnostics.
//!
//! Maps failed exports and configuration problems into user-facing errors
//! with actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use codaport_config::ConfigError;
use codaport_core::{CoreError, ErrorKind, StoreError};

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Export failures ──────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(codaport::invalid_url),
        help("Copy the page URL from your browser, e.g. https://coda.io/d/My-Doc_dAbC123/My-Page_suXyZ")
    )]
    InvalidUrl { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(codaport::no_api_key),
        help(
            "Store a key with: codaport config set-key\n\
             Or set the CODAPORT_API_KEY environment variable."
        )
    )]
    NoApiKey { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(codaport::auth_failed),
        help("Generate a new API token at https://coda.io/account and run: codaport config set-key")
    )]
    AuthFailed { message: String },

    #[error("{message}")]
    #[diagnostic(code(codaport::not_found))]
    NotFound { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(codaport::permission_denied),
        help("Ask the document owner for access, or check which account the API key belongs to.")
    )]
    PermissionDenied { message: String },

    #[error("{message}")]
    #[diagnostic(code(codaport::rate_limited), help("Coda limits export requests; wait a minute."))]
    RateLimited { message: String },

    #[error("{message}")]
    #[diagnostic(code(codaport::export_failed))]
    ExportFailed { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(codaport::timeout),
        help("Allow more status checks with --max-attempts, or try again later.")
    )]
    Timeout { message: String },

    #[error("{message}")]
    #[diagnostic(code(codaport::untrusted_download))]
    UntrustedDownload { message: String },

    #[error("{message}")]
    #[diagnostic(code(codaport::busy))]
    Busy { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(codaport::connection_failed),
        help("Check your network connection and --api-base.")
    )]
    Connection { message: String },

    #[error("{message}")]
    #[diagnostic(code(codaport::internal))]
    Internal { message: String },

    // ── Download ─────────────────────────────────────────────────────
    #[error("{} already exists", path.display())]
    #[diagnostic(
        code(codaport::file_exists),
        help("Use --force (-f) to overwrite it, or --dir to save elsewhere.")
    )]
    FileExists { path: std::path::PathBuf },

    #[error("Download failed: {message}")]
    #[diagnostic(
        code(codaport::download_failed),
        help("The export link is short-lived. Run the export again.")
    )]
    Download { message: String },

    // ── Credentials ──────────────────────────────────────────────────
    #[error("Credential store error: {0}")]
    #[diagnostic(
        code(codaport::credential_store),
        help("Set `use_keyring = false` in the config file to keep the key there instead.")
    )]
    CredentialStore(#[from] StoreError),

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(codaport::validation))]
    Validation { field: String, reason: String },

    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(codaport::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(codaport::config),
        help("Check the config file printed by: codaport config path")
    )]
    Config(#[from] ConfigError),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidUrl { .. }
            | Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::NoApiKey { .. } | Self::AuthFailed { .. } | Self::CredentialStore(_) => {
                exit_code::AUTH
            }
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::PermissionDenied { .. } | Self::UntrustedDownload { .. } => exit_code::PERMISSION,
            Self::Busy { .. } | Self::FileExists { .. } => exit_code::CONFLICT,
            Self::Connection { .. } | Self::Download { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            _ => exit_code::GENERAL,
        }
    }

    /// Build the error for a failed export from its message and class.
    pub fn from_export(message: String, kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Input => Self::InvalidUrl { message },
            ErrorKind::Authentication if message.starts_with("Invalid API key") => {
                Self::AuthFailed { message }
            }
            ErrorKind::Authentication => Self::NoApiKey { message },
            ErrorKind::Permission => Self::PermissionDenied { message },
            ErrorKind::NotFound => Self::NotFound { message },
            ErrorKind::RateLimited => Self::RateLimited { message },
            ErrorKind::RemoteFailure => Self::ExportFailed { message },
            ErrorKind::Timeout => Self::Timeout { message },
            ErrorKind::Security => Self::UntrustedDownload { message },
            ErrorKind::Busy => Self::Busy { message },
            ErrorKind::Transport => Self::Connection { message },
            ErrorKind::Internal => Self::Internal { message },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let kind = err.kind();
        Self::from_export(err.to_string(), kind)
    }
}
