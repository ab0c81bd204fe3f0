// ── Export results ──
//
// `ExportedPage` is the orchestrator's typed success value; `ExportResult`
// is the flattened record handed across the dispatch boundary.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CoreError, ErrorKind};

/// A finished export: where to download it and what to call it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedPage {
    pub doc_id: String,
    pub page_id: String,
    /// Display name as reported by Coda, when the lookup succeeded.
    pub page_name: Option<String>,
    /// Download link that passed the host allow-list.
    pub download_url: Url,
    /// Sanitized `<stem>.md` filename.
    pub filename: String,
}

/// Outcome of one export command.
///
/// Exactly one of (`download_url` + `filename`) or `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl ExportResult {
    pub fn succeeded(page: &ExportedPage) -> Self {
        Self {
            success: true,
            download_url: Some(page.download_url.to_string()),
            filename: Some(page.filename.clone()),
            error: None,
            kind: None,
        }
    }

    pub fn failed(err: &CoreError) -> Self {
        Self {
            success: false,
            download_url: None,
            filename: None,
            error: Some(err.to_string()),
            kind: Some(err.kind()),
        }
    }
}
