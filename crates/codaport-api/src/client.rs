// Hand-crafted async HTTP client for the Coda page-export endpoints.
//
// Base path: /apis/v1/
// Auth: Authorization: Bearer <api key>

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::types::{
    BeginExportRequest, ExportJob, ExportJobStatus, OutputFormat, PageDetails, PageList,
};
use crate::{Error, TransportConfig};

// ── Error response shape from the Coda API ───────────────────────────

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status_message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Coda REST API.
///
/// Every request carries the bearer token configured at construction.
/// The client is cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct CodaClient {
    http: reqwest::Client,
    base_url: Url,
}

impl CodaClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an API key and transport config.
    ///
    /// Injects `Authorization: Bearer <key>` as a sensitive default header.
    pub fn from_api_key(
        base_url: &str,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid API key header value: {e}"),
            })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = transport.build_client_with_headers(headers)?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Parse the base URL and make sure it can take path segments.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let url = Url::parse(raw)?;
        if url.cannot_be_a_base() {
            return Err(Error::UnusableBaseUrl(raw.to_owned()));
        }
        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append percent-encoded path segments onto the base URL.
    fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::UnusableBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, &str)],
    ) -> Result<T, Error> {
        let url = self.url(segments)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(segments)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        self.handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::InvalidApiKey;
        }

        let raw = resp.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), body = %raw, "Coda API returned an error");

        let message = match serde_json::from_str::<ErrorResponse>(&raw) {
            Ok(err) => err
                .message
                .or(err.status_message)
                .unwrap_or_else(|| status.to_string()),
            Err(_) if raw.is_empty() => status.to_string(),
            Err(_) => raw,
        };

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Pages ────────────────────────────────────────────────────────

    /// Fetch one batch of the document's page tree.
    pub async fn list_pages(
        &self,
        doc_id: &str,
        page_token: Option<&str>,
    ) -> Result<PageList, Error> {
        let params: Vec<(&str, &str)> = page_token
            .map(|token| vec![("pageToken", token)])
            .unwrap_or_default();
        self.get(&["docs", doc_id, "pages"], &params).await
    }

    pub async fn get_page(&self, doc_id: &str, page_id: &str) -> Result<PageDetails, Error> {
        self.get(&["docs", doc_id, "pages", page_id], &[]).await
    }

    // ── Exports ──────────────────────────────────────────────────────

    /// Start an asynchronous export of a page.
    pub async fn begin_page_export(
        &self,
        doc_id: &str,
        page_id: &str,
        format: OutputFormat,
    ) -> Result<ExportJob, Error> {
        self.post(
            &["docs", doc_id, "pages", page_id, "export"],
            &BeginExportRequest {
                output_format: format,
            },
        )
        .await
    }

    /// Fetch the current status of an export job.
    pub async fn page_export_status(
        &self,
        doc_id: &str,
        page_id: &str,
        export_id: &str,
    ) -> Result<ExportJobStatus, Error> {
        self.get(
            &["docs", doc_id, "pages", page_id, "export", export_id],
            &[],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_appended_to_base_path() {
        let client =
            CodaClient::from_reqwest("https://coda.io/apis/v1/", reqwest::Client::new())
                .expect("valid base");
        let url = client.url(&["docs", "abc", "pages"]).expect("url");
        assert_eq!(url.as_str(), "https://coda.io/apis/v1/docs/abc/pages");
    }

    #[test]
    fn base_without_trailing_slash_keeps_last_segment() {
        let client = CodaClient::from_reqwest("https://coda.io/apis/v1", reqwest::Client::new())
            .expect("valid base");
        let url = client.url(&["docs", "abc"]).expect("url");
        assert_eq!(url.as_str(), "https://coda.io/apis/v1/docs/abc");
    }

    #[test]
    fn segments_are_percent_encoded() {
        let client =
            CodaClient::from_reqwest("https://coda.io/apis/v1/", reqwest::Client::new())
                .expect("valid base");
        let url = client.url(&["docs", "a/b c"]).expect("url");
        assert_eq!(url.as_str(), "https://coda.io/apis/v1/docs/a%2Fb%20c");
    }

    #[test]
    fn rejects_non_base_urls() {
        let err = CodaClient::from_reqwest("mailto:someone@example.com", reqwest::Client::new())
            .expect_err("mailto cannot be a base");
        assert!(matches!(err, Error::UnusableBaseUrl(_)));
    }
}
