// ── Runtime export configuration ──
//
// These types describe *how* an export talks to Coda and how patiently it
// waits. They never touch disk: the CLI builds an `ExportSettings` from its
// config file and hands it in.

use std::time::Duration;

/// Tunables for a single export attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    /// Coda REST API base (e.g. `https://coda.io/apis/v1/`).
    pub api_base: String,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Upper bound on page-listing batches fetched while resolving a slug.
    pub max_page_batches: u32,
    /// Upper bound on export status polls.
    pub max_poll_attempts: u32,
    /// Wait between job creation and the first status poll.
    pub settle_delay: Duration,
    /// Wait after a poll that saw a non-terminal status.
    pub poll_interval: Duration,
    /// Wait after a transient poll failure (429, 5xx, 404).
    pub retry_backoff: Duration,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            api_base: codaport_api::DEFAULT_API_BASE.into(),
            request_timeout: Duration::from_secs(30),
            max_page_batches: 50,
            max_poll_attempts: 20,
            settle_delay: Duration::from_secs(1),
            poll_interval: Duration::from_secs(1),
            retry_backoff: Duration::from_secs(2),
        }
    }
}

impl ExportSettings {
    /// Same settings with every wait set to zero. Useful for tests and
    /// for embedders that drive their own pacing.
    pub fn without_delays(mut self) -> Self {
        self.settle_delay = Duration::ZERO;
        self.poll_interval = Duration::ZERO;
        self.retry_backoff = Duration::ZERO;
        self
    }
}
