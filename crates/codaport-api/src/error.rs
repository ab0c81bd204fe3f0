use thiserror::Error;

/// Top-level error type for the `codaport-api` crate.
///
/// Covers transport failures and non-2xx responses from the Coda API.
/// `codaport-core` maps these into step-specific, user-facing messages
/// because the same status code means different things per endpoint.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Invalid API key (HTTP 401).
    #[error("Invalid API key")]
    InvalidApiKey,

    /// The key could not be turned into an `Authorization` header.
    #[error("Authentication setup failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The base URL cannot carry path segments (e.g. `mailto:`).
    #[error("Base URL cannot be used for API requests: {0}")]
    UnusableBaseUrl(String),

    /// Failed to build the underlying `reqwest::Client`.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-2xx response other than 401.
    #[error("Coda API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// HTTP status code carried by this error, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidApiKey => Some(401),
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` for rate limiting and server-side failures.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) if e.status().is_none() => e.is_timeout() || e.is_connect(),
            _ => self.status().is_some_and(|s| s == 429 || s >= 500),
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
