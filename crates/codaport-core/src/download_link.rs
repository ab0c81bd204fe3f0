//! Allow-list check for export download links.

use tracing::error;
use url::Url;

use crate::error::CoreError;

/// Hosts Coda serves export files from: its S3 workflow bucket and its own domain.
pub const TRUSTED_DOWNLOAD_HOSTS: &[&str] = &[
    "coda-us-west-2-prod-workflow-objects.s3.us-west-2.amazonaws.com",
    "coda.io",
];

/// Accept only `https` links whose host is exactly one of the trusted hosts.
pub fn validate_download_link(raw: &str) -> Result<Url, CoreError> {
    let url = Url::parse(raw).map_err(|e| {
        error!(link = raw, error = %e, "invalid download URL format");
        CoreError::MalformedDownloadUrl
    })?;

    let host = url.host_str().unwrap_or_default();
    if url.scheme() != "https" || !TRUSTED_DOWNLOAD_HOSTS.contains(&host) {
        error!(scheme = url.scheme(), host, "invalid download URL origin");
        return Err(CoreError::UntrustedDownloadUrl {
            host: host.to_owned(),
        });
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_https_on_trusted_hosts() {
        for link in [
            "https://coda-us-west-2-prod-workflow-objects.s3.us-west-2.amazonaws.com/exports/a.md?X-Amz-Signature=abc",
            "https://coda.io/blobs/export.md",
        ] {
            assert!(validate_download_link(link).is_ok(), "{link} should pass");
        }
    }

    #[test]
    fn rejects_plain_http() {
        assert!(matches!(
            validate_download_link("http://coda.io/blobs/export.md"),
            Err(CoreError::UntrustedDownloadUrl { .. })
        ));
    }

    #[test]
    fn rejects_lookalike_hosts() {
        for link in [
            "https://evil.com/export.md",
            "https://coda.io.evil.com/export.md",
            "https://www.coda.io/export.md",
            "https://evil-bucket.s3.us-west-2.amazonaws.com/export.md",
        ] {
            assert!(
                matches!(
                    validate_download_link(link),
                    Err(CoreError::UntrustedDownloadUrl { .. })
                ),
                "{link} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_unparseable_links() {
        assert!(matches!(
            validate_download_link("not a link"),
            Err(CoreError::MalformedDownloadUrl)
        ));
    }
}
