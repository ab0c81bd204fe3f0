//! Coda page URL parsing.
//!
//! A page URL looks like `https://coda.io/d/<Doc-Name>_d<docId>/<Page-Name>_s<section>`.
//! The document id follows the last `_d` of the first segment after `/d/`;
//! the page slug is the `s`-prefixed token after the last `_` of the next
//! segment.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::CoreError;

const CODA_HOSTS: &[&str] = &["coda.io", "www.coda.io"];

static PAGE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/d/[^/]*_d([^/]+)/[^/]*_(s[^/_]+)").expect("page path pattern should compile")
});

/// Document id and page slug extracted from a page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub doc_id: String,
    /// Section token including its leading `s`, e.g. `suXyZ`.
    pub page_slug: String,
}

impl DocumentRef {
    /// Parse a browser URL. Never touches the network.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let url = parse_lenient(raw.trim()).ok_or(CoreError::NotCodaUrl)?;

        let on_coda = matches!(url.scheme(), "https" | "http")
            && url
                .host_str()
                .is_some_and(|host| CODA_HOSTS.iter().any(|h| host.eq_ignore_ascii_case(h)));
        if !on_coda {
            return Err(CoreError::NotCodaUrl);
        }

        let caps = PAGE_PATH
            .captures(url.path())
            .ok_or(CoreError::InvalidUrlFormat)?;
        match (caps.get(1), caps.get(2)) {
            (Some(doc), Some(slug)) => Ok(Self {
                doc_id: doc.as_str().to_owned(),
                page_slug: slug.as_str().to_owned(),
            }),
            _ => Err(CoreError::InvalidUrlFormat),
        }
    }
}

/// Accept `coda.io/d/...` pasted without a scheme.
fn parse_lenient(raw: &str) -> Option<Url> {
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{raw}")).ok(),
        Err(_) => None,
    }
}
