// ── Export orchestrator ──
//
// URL parsing → credential → page resolution → job start → settle →
// poll → link validation → filename. Each step is a hard gate; the first
// failure ends the attempt.

use std::future::Future;
use std::sync::Arc;

use codaport_api::{CodaClient, OutputFormat, TransportConfig};
use secrecy::SecretString;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::ExportSettings;
use crate::credentials::{API_KEY, SecretStore};
use crate::download_link::validate_download_link;
use crate::error::CoreError;
use crate::filename::markdown_filename;
use crate::link::DocumentRef;
use crate::poll::{ExportPoller, PollAction, PollObservation, PollPolicy};
use crate::result::ExportedPage;
use crate::tree::find_page;

/// Anything that can turn a page URL into a finished export.
///
/// The [`Dispatcher`](crate::Dispatcher) is generic over this so the
/// in-flight guard can be exercised without a server.
pub trait PageExporter: Send + Sync {
    fn export(&self, url: &str) -> impl Future<Output = Result<ExportedPage, CoreError>> + Send;
}

/// Runs the export sequence against the Coda API.
pub struct Exporter {
    settings: ExportSettings,
    store: Arc<dyn SecretStore>,
}

impl Exporter {
    pub fn new(settings: ExportSettings, store: Arc<dyn SecretStore>) -> Self {
        Self { settings, store }
    }

    /// Export the page behind `url` and return where to download it.
    pub async fn export_page(&self, url: &str) -> Result<ExportedPage, CoreError> {
        let doc = DocumentRef::parse(url)?;
        debug!(doc_id = %doc.doc_id, slug = %doc.page_slug, "parsed page URL");

        let api_key = self.api_key()?;
        let client = CodaClient::from_api_key(
            &self.settings.api_base,
            &api_key,
            &TransportConfig {
                timeout: self.settings.request_timeout,
            },
        )?;

        let page_id = self.resolve_page_id(&client, &doc).await?;
        let export_id = self.begin_export(&client, &doc, &page_id).await?;
        info!(%export_id, %page_id, "export initiated");

        // Coda needs a moment before a fresh export id is visible.
        sleep(self.settings.settle_delay).await;

        let link = self
            .wait_for_export(&client, &doc, &page_id, &export_id)
            .await?;
        let download_url = validate_download_link(&link)?;

        let page_name = self.page_name(&client, &doc, &page_id).await;
        let filename = markdown_filename(page_name.as_deref());

        info!(%page_id, %filename, "export ready");
        Ok(ExportedPage {
            doc_id: doc.doc_id,
            page_id,
            page_name,
            download_url,
            filename,
        })
    }

    // ── Steps ────────────────────────────────────────────────────────

    fn api_key(&self) -> Result<SecretString, CoreError> {
        match self.store.get(API_KEY) {
            Ok(Some(key)) if !key.trim().is_empty() => Ok(SecretString::from(key.trim().to_owned())),
            Ok(_) => Err(CoreError::ApiKeyNotConfigured),
            Err(e) => {
                error!(error = %e, "failed to retrieve API key");
                Err(CoreError::CredentialStore(e))
            }
        }
    }

    /// Walk the paginated page listing until a node matches the slug.
    async fn resolve_page_id(
        &self,
        client: &CodaClient,
        doc: &DocumentRef,
    ) -> Result<String, CoreError> {
        let max_batches = self.settings.max_page_batches;
        let mut token: Option<String> = None;

        for batch in 1..=max_batches {
            debug!(batch, token = token.as_deref(), "fetching page batch");
            let list = client
                .list_pages(&doc.doc_id, token.as_deref())
                .await
                .map_err(CoreError::from_page_listing)?;

            if let Some(page) = find_page(&list.items, &doc.page_slug) {
                info!(page_id = %page.id, batch, "resolved page");
                return Ok(page.id.clone());
            }

            match list.next_page_token {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => {
                    debug!(batches = batch, "page not found in listing");
                    return Err(CoreError::PageNotFound);
                }
            }
        }

        warn!(max_batches, "reached page batch limit while searching for page");
        Err(CoreError::PageNotFound)
    }

    async fn begin_export(
        &self,
        client: &CodaClient,
        doc: &DocumentRef,
        page_id: &str,
    ) -> Result<String, CoreError> {
        let job = client
            .begin_page_export(&doc.doc_id, page_id, OutputFormat::Markdown)
            .await
            .map_err(CoreError::from_export_start)?;

        job.id
            .filter(|id| !id.is_empty())
            .ok_or(CoreError::ExportNotStarted)
    }

    async fn wait_for_export(
        &self,
        client: &CodaClient,
        doc: &DocumentRef,
        page_id: &str,
        export_id: &str,
    ) -> Result<String, CoreError> {
        let policy = PollPolicy::from(&self.settings);
        if policy.max_attempts == 0 {
            return Err(CoreError::TimedOut { attempts: 0 });
        }
        let mut poller = ExportPoller::new(policy);

        loop {
            let attempt = poller.next_attempt();
            debug!(attempt, max = policy.max_attempts, %export_id, "polling export status");

            let observation = match client
                .page_export_status(&doc.doc_id, page_id, export_id)
                .await
            {
                Ok(status) => PollObservation::Status(status),
                Err(e) if e.is_transient() || e.is_not_found() => {
                    warn!(status = e.status(), error = %e, "temporary error checking export status, retrying");
                    PollObservation::Transient { status: e.status() }
                }
                Err(e) => return Err(CoreError::from_export_status(e)),
            };

            match poller.observe(&observation) {
                PollAction::Wait(delay) => sleep(delay).await,
                PollAction::Finish(link) => {
                    info!(attempt, "export completed");
                    return Ok(link);
                }
                PollAction::Fail(message) => return Err(CoreError::ExportFailed { message }),
                PollAction::GiveUp { attempts } => {
                    warn!(attempts, "export polling timed out");
                    return Err(CoreError::TimedOut { attempts });
                }
            }
        }
    }

    /// Best effort: any failure means "no name".
    async fn page_name(
        &self,
        client: &CodaClient,
        doc: &DocumentRef,
        page_id: &str,
    ) -> Option<String> {
        match client.get_page(&doc.doc_id, page_id).await {
            Ok(page) => page.name,
            Err(e) => {
                warn!(status = e.status(), error = %e, "failed to get page name");
                None
            }
        }
    }
}

impl PageExporter for Exporter {
    fn export(&self, url: &str) -> impl Future<Output = Result<ExportedPage, CoreError>> + Send {
        self.export_page(url)
    }
}
