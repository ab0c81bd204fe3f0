//! Request and response types for the Coda page endpoints.
//!
//! Field names use camelCase via `#[serde(rename_all = "camelCase")]`.
//! Only the fields the exporter reads are modeled; the rest are ignored.

use serde::{Deserialize, Serialize};

// ── Pages ────────────────────────────────────────────────────────────

/// One batch of the page listing — from `GET /docs/{docId}/pages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageList {
    #[serde(default)]
    pub items: Vec<PageNode>,
    /// Opaque continuation token; absent on the last batch.
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// A page in the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageNode {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Browser-facing URL, e.g. `https://coda.io/d/_dAbC/_suXyZ`.
    #[serde(default)]
    pub browser_link: Option<String>,
    #[serde(default)]
    pub children: Vec<PageNode>,
}

/// Page metadata — from `GET /docs/{docId}/pages/{pageId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDetails {
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub browser_link: Option<String>,
}

// ── Exports ──────────────────────────────────────────────────────────

/// Output format accepted by the page export endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Markdown,
}

/// Body of `POST /docs/{docId}/pages/{pageId}/export`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BeginExportRequest {
    pub output_format: OutputFormat,
}

/// Response of the export initiation call.
///
/// `id` is optional on purpose: a 2xx without an id is reported by the
/// caller as a failed start rather than a deserialization error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportJob {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
}

/// Server-side state of an export job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportState {
    Complete,
    Failed,
    /// `pending`, `inProgress`, or anything this client does not know yet.
    #[default]
    #[serde(other)]
    Pending,
}

/// Response of `GET /docs/{docId}/pages/{pageId}/export/{exportId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportJobStatus {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: ExportState,
    #[serde(default)]
    pub download_link: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
