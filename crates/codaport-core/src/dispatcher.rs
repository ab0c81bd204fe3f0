// ── Request dispatcher ──
//
// Entry point for "export page" commands. Holds the set of URLs with an
// export in flight; a second command for the same URL is rejected before
// any network activity. Membership is released by a guard on every exit
// path, including panics inside the exporter.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use dashmap::DashSet;
use futures::FutureExt;
use tracing::{error, info, warn};

use crate::error::CoreError;
use crate::exporter::PageExporter;
use crate::result::ExportResult;

/// Marks one URL as in flight for as long as it lives.
struct InFlightGuard<'a> {
    set: &'a DashSet<String>,
    url: String,
}

impl<'a> InFlightGuard<'a> {
    /// Returns `None` if the URL is already in flight.
    fn acquire(set: &'a DashSet<String>, url: &str) -> Option<Self> {
        set.insert(url.to_owned()).then(|| Self {
            set,
            url: url.to_owned(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.url);
    }
}

/// Serializes exports per URL and normalizes every outcome into an
/// [`ExportResult`].
pub struct Dispatcher<E> {
    exporter: E,
    in_flight: DashSet<String>,
}

impl<E: PageExporter> Dispatcher<E> {
    pub fn new(exporter: E) -> Self {
        Self {
            exporter,
            in_flight: DashSet::new(),
        }
    }

    pub fn exporter(&self) -> &E {
        &self.exporter
    }

    pub fn is_in_flight(&self, url: &str) -> bool {
        self.in_flight.contains(url)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Run one export command. Never returns an error or panics; failures
    /// are carried in the result.
    pub async fn export_page(&self, url: &str) -> ExportResult {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight, url) else {
            warn!(url, "export already in progress for this URL, ignoring duplicate request");
            return ExportResult::failed(&CoreError::AlreadyInProgress);
        };

        info!(url, "starting export");
        let outcome = AssertUnwindSafe(self.exporter.export(url))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(page)) => ExportResult::succeeded(&page),
            Ok(Err(err)) => {
                warn!(url, kind = %err.kind(), error = %err, "export failed");
                ExportResult::failed(&err)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(url, %message, "export panicked");
                ExportResult::failed(&CoreError::Internal(message))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "export task panicked".into())
}
