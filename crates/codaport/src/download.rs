//! Download sink: streams an export file to disk.
//!
//! The body goes to a hidden `.<name>.part` file next to the target and is
//! renamed into place once complete, so an interrupted download never
//! leaves a truncated `.md` behind.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use codaport_api::TransportConfig;

use crate::error::CliError;

/// Download `url` into `path`. Returns the number of bytes written.
///
/// Refuses to replace an existing file unless `force` is set. The request
/// carries no Coda credentials; export links are pre-signed.
pub async fn save(url: &Url, path: &Path, force: bool, timeout: Duration) -> Result<usize, CliError> {
    if !force && path.exists() {
        return Err(CliError::FileExists {
            path: path.to_path_buf(),
        });
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let client = TransportConfig { timeout }
        .build_client()
        .map_err(|e| download_err(&e))?;

    debug!(%url, "downloading export");
    let mut response = client
        .get(url.clone())
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| download_err(&e))?;

    let part = part_path(path);
    let written = match write_body(&mut response, &part).await {
        Ok(written) => written,
        Err(e) => {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e);
        }
    };
    tokio::fs::rename(&part, path).await?;

    info!(path = %path.display(), bytes = written, "export saved");
    Ok(written)
}

async fn write_body(response: &mut reqwest::Response, part: &Path) -> Result<usize, CliError> {
    let mut file = tokio::fs::File::create(part).await?;
    let mut written = 0;
    while let Some(chunk) = response.chunk().await.map_err(|e| download_err(&e))? {
        file.write_all(&chunk).await?;
        written += chunk.len();
    }
    file.flush().await?;
    Ok(written)
}

fn part_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.part"))
}

fn download_err(e: &impl std::fmt::Display) -> CliError {
    CliError::Download {
        message: e.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BODY: &str = "# Weekly Notes\n\n- shipped the exporter\n";

    async fn serve(status: u16) -> (MockServer, Url) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/exports/notes.md"))
            .respond_with(ResponseTemplate::new(status).set_body_string(BODY))
            .mount(&server)
            .await;
        let url = Url::parse(&format!("{}/exports/notes.md", server.uri())).unwrap();
        (server, url)
    }

    #[tokio::test]
    async fn writes_file_and_cleans_up_part() {
        let (_server, url) = serve(200).await;
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("sub").join("Weekly_Notes.md");

        let written = save(&url, &target, false, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(written, BODY.len());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), BODY);
        assert!(!part_path(&target).exists());
    }

    #[tokio::test]
    async fn refuses_to_overwrite_without_force() {
        let (_server, url) = serve(200).await;
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("Weekly_Notes.md");
        std::fs::write(&target, "keep me").unwrap();

        let err = save(&url, &target, false, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::FileExists { .. }));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "keep me");

        save(&url, &target, true, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), BODY);
    }

    #[tokio::test]
    async fn http_error_leaves_no_file() {
        let (_server, url) = serve(403).await;
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("Weekly_Notes.md");

        let err = save(&url, &target, false, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Download { .. }));
        assert!(!target.exists());
        assert!(!part_path(&target).exists());
    }

    #[test]
    fn part_file_is_hidden_sibling() {
        assert_eq!(
            part_path(Path::new("/tmp/out/notes.md")),
            PathBuf::from("/tmp/out/.notes.md.part")
        );
    }
}
