// ── Core error types ──
//
// User-facing errors from codaport-core. Each variant is the single message
// an export attempt reports. HTTP status codes are translated per step,
// because a 404 from the page listing means something different from a 404
// on the export endpoint.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credentials::StoreError;

/// Error class, used by consumers to pick exit codes or styling.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    /// Malformed URL or unusable configuration.
    Input,
    /// Missing, unreadable, or rejected credential.
    Authentication,
    /// The credential is valid but lacks access.
    Permission,
    NotFound,
    RateLimited,
    /// The service reported the export job as failed.
    RemoteFailure,
    Timeout,
    /// Download link failed the scheme/host allow-list.
    Security,
    /// An export for the same URL is already running.
    Busy,
    /// Connection, protocol, or decoding failure.
    Transport,
    Internal,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Please provide a valid Coda URL")]
    NotCodaUrl,

    #[error("Invalid Coda URL format. Please ensure you're on a Coda page.")]
    InvalidUrlFormat,

    #[error(
        "API key not configured. Please set your Coda API key with `codaport config set-key`."
    )]
    ApiKeyNotConfigured,

    #[error("Failed to retrieve API key. Please try again.")]
    CredentialStore(#[source] StoreError),

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    // ── Authorization errors ─────────────────────────────────────────
    #[error("Invalid API key. Please check your Coda API key.")]
    InvalidApiKey,

    #[error("Access denied. Please ensure you have permission to access this document.")]
    DocumentAccessDenied,

    #[error("Access denied. You don't have permission to export this page.")]
    ExportAccessDenied,

    // ── Not-found errors ─────────────────────────────────────────────
    #[error("Document not found. Please check the URL.")]
    DocumentNotFound,

    #[error(
        "Could not find the page. Please ensure the URL is correct and you have access to this page."
    )]
    PageNotFound,

    #[error("Page not found. The page may have been deleted or moved.")]
    ExportPageNotFound,

    // ── Remote / rate-limit errors ───────────────────────────────────
    #[error("Rate limit exceeded. Please wait a moment and try again.")]
    RateLimited,

    #[error("Failed to fetch pages (Error {status})")]
    PageFetch { status: u16 },

    #[error("Failed to start export (Error {status})")]
    ExportStart { status: u16 },

    #[error("Failed to start the export process. Please try again.")]
    ExportNotStarted,

    #[error("Failed to check export status (Error {status})")]
    ExportStatus { status: u16 },

    #[error("{message}")]
    ExportFailed { message: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error(
        "Export process timed out. This might happen with very large pages. Please try again."
    )]
    TimedOut { attempts: u32 },

    // ── Security validation ──────────────────────────────────────────
    #[error("Security error: Invalid download URL. Please try again.")]
    UntrustedDownloadUrl { host: String },

    #[error("Security error: Invalid download URL format.")]
    MalformedDownloadUrl,

    // ── Dispatch ─────────────────────────────────────────────────────
    #[error("Export already in progress. Please wait for it to complete.")]
    AlreadyInProgress,

    // ── Transport / internal ─────────────────────────────────────────
    #[error("Could not reach Coda: {message}")]
    Transport { message: String },

    #[error("Unexpected error: {0}")]
    Internal(String),
}

/// Default message for a `failed` job that carries no error text.
pub(crate) const EXPORT_FAILED_FALLBACK: &str =
    "Export failed. The page may be too large or contain unsupported content.";

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotCodaUrl | Self::InvalidUrlFormat | Self::Config { .. } => ErrorKind::Input,
            Self::ApiKeyNotConfigured | Self::CredentialStore(_) | Self::InvalidApiKey => {
                ErrorKind::Authentication
            }
            Self::DocumentAccessDenied | Self::ExportAccessDenied => ErrorKind::Permission,
            Self::DocumentNotFound | Self::PageNotFound | Self::ExportPageNotFound => {
                ErrorKind::NotFound
            }
            Self::RateLimited => ErrorKind::RateLimited,
            Self::ExportNotStarted | Self::ExportFailed { .. } => ErrorKind::RemoteFailure,
            Self::TimedOut { .. } => ErrorKind::Timeout,
            Self::UntrustedDownloadUrl { .. } | Self::MalformedDownloadUrl => ErrorKind::Security,
            Self::AlreadyInProgress => ErrorKind::Busy,
            Self::PageFetch { .. }
            | Self::ExportStart { .. }
            | Self::ExportStatus { .. }
            | Self::Transport { .. } => ErrorKind::Transport,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Translate a failure of the page listing call.
    pub(crate) fn from_page_listing(err: codaport_api::Error) -> Self {
        match err.status() {
            Some(401) => Self::InvalidApiKey,
            Some(404) => Self::DocumentNotFound,
            Some(403) => Self::DocumentAccessDenied,
            Some(status) => Self::PageFetch { status },
            None => err.into(),
        }
    }

    /// Translate a failure of the export initiation call.
    pub(crate) fn from_export_start(err: codaport_api::Error) -> Self {
        match err.status() {
            Some(401) => Self::InvalidApiKey,
            Some(404) => Self::ExportPageNotFound,
            Some(403) => Self::ExportAccessDenied,
            Some(429) => Self::RateLimited,
            Some(status) => Self::ExportStart { status },
            None => err.into(),
        }
    }

    /// Translate a non-transient failure of the export status call.
    pub(crate) fn from_export_status(err: codaport_api::Error) -> Self {
        match err.status() {
            Some(status) => Self::ExportStatus { status },
            None => err.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<codaport_api::Error> for CoreError {
    fn from(err: codaport_api::Error) -> Self {
        match err {
            codaport_api::Error::InvalidApiKey | codaport_api::Error::Authentication { .. } => {
                Self::InvalidApiKey
            }
            codaport_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("invalid API base URL: {e}"),
            },
            codaport_api::Error::UnusableBaseUrl(url) => Self::Config {
                message: format!("API base URL cannot be used: {url}"),
            },
            codaport_api::Error::ClientBuild(message) => Self::Internal(message),
            codaport_api::Error::Api { status, message } => Self::Transport {
                message: format!("HTTP {status}: {message}"),
            },
            codaport_api::Error::Transport(e) => Self::Transport {
                message: e.to_string(),
            },
            codaport_api::Error::Deserialization { message, body: _ } => Self::Transport {
                message: format!("unexpected response: {message}"),
            },
        }
    }
}
