// ── Export job polling state machine ──
//
// The exporter feeds each status fetch into `ExportPoller::observe`, which
// returns what to do next. Transitions are pure, so the retry/timeout rules
// are testable without a server or a clock.

use std::time::Duration;

use codaport_api::{ExportJobStatus, ExportState};

use crate::config::ExportSettings;
use crate::error::EXPORT_FAILED_FALLBACK;

/// Lifecycle of one export job as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// Job creation requested, no status fetched yet.
    Initiating,
    /// `attempt` status fetches have completed without a terminal result.
    Polling { attempt: u32 },
    Complete { download_link: String },
    Failed { message: String },
    TimedOut { attempts: u32 },
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Complete { .. } | Self::Failed { .. } | Self::TimedOut { .. }
        )
    }
}

/// Outcome of one status fetch, reduced to what the state machine needs.
#[derive(Debug, Clone, PartialEq)]
pub enum PollObservation {
    /// The server answered with a job status.
    Status(ExportJobStatus),
    /// Rate limited, server error, job not visible yet, or a dropped
    /// connection. Worth another attempt.
    Transient { status: Option<u16> },
}

/// What the exporter should do after an observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollAction {
    /// Sleep, then fetch the status again.
    Wait(Duration),
    /// The export finished with this download link.
    Finish(String),
    /// The service reported a failure with this message.
    Fail(String),
    /// Attempts exhausted.
    GiveUp { attempts: u32 },
}

/// Retry limits and pacing for the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub poll_interval: Duration,
    pub retry_backoff: Duration,
}

impl From<&ExportSettings> for PollPolicy {
    fn from(settings: &ExportSettings) -> Self {
        Self {
            max_attempts: settings.max_poll_attempts,
            poll_interval: settings.poll_interval,
            retry_backoff: settings.retry_backoff,
        }
    }
}

impl PollPolicy {
    /// Pure transition: `attempt` is the 1-based number of the fetch that
    /// produced `observation`.
    pub fn next_action(&self, observation: &PollObservation, attempt: u32) -> PollAction {
        let wait = match observation {
            PollObservation::Status(job) => match (job.status, job.download_link.as_deref()) {
                (ExportState::Complete, Some(link)) if !link.is_empty() => {
                    return PollAction::Finish(link.to_owned());
                }
                (ExportState::Failed, _) => {
                    let message = job
                        .error
                        .as_deref()
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or(EXPORT_FAILED_FALLBACK);
                    return PollAction::Fail(message.to_owned());
                }
                _ => self.poll_interval,
            },
            PollObservation::Transient { .. } => self.retry_backoff,
        };

        if attempt >= self.max_attempts {
            PollAction::GiveUp { attempts: attempt }
        } else {
            PollAction::Wait(wait)
        }
    }
}

/// Stateful wrapper that tracks the attempt count and current state.
#[derive(Debug, Clone)]
pub struct ExportPoller {
    policy: PollPolicy,
    state: PollState,
}

impl ExportPoller {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            state: PollState::Initiating,
        }
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// Attempt number the next fetch will have.
    pub fn next_attempt(&self) -> u32 {
        match self.state {
            PollState::Polling { attempt } => attempt + 1,
            _ => 1,
        }
    }

    /// Feed one fetch result and move to the next state.
    pub fn observe(&mut self, observation: &PollObservation) -> PollAction {
        let attempt = self.next_attempt();
        if self.policy.max_attempts == 0 {
            self.state = PollState::TimedOut { attempts: 0 };
            return PollAction::GiveUp { attempts: 0 };
        }

        let action = self.policy.next_action(observation, attempt);
        self.state = match &action {
            PollAction::Wait(_) => PollState::Polling { attempt },
            PollAction::Finish(link) => PollState::Complete {
                download_link: link.clone(),
            },
            PollAction::Fail(message) => PollState::Failed {
                message: message.clone(),
            },
            PollAction::GiveUp { attempts } => PollState::TimedOut {
                attempts: *attempts,
            },
        };
        action
    }
}
