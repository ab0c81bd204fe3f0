// ── Credential storage seam ──
//
// The exporter reads the Coda API key through `SecretStore` on every
// attempt. Concrete stores live with their consumers (keyring + config file
// in codaport-config); `MemoryStore` covers tests and embedders.

use dashmap::DashMap;
use thiserror::Error;

/// Key under which the Coda API key is stored.
pub const API_KEY: &str = "coda-api-key";

/// Shortest key the format check accepts.
pub const MIN_API_KEY_LEN: usize = 30;

/// Failure of the backing store itself, as opposed to a missing entry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    #[error("failed to write credential: {0}")]
    Write(String),
}

/// Persistent key-value storage for secrets.
///
/// `get` returns `Ok(None)` for a missing entry and reserves `Err` for a
/// store that could not be read at all.
pub trait SecretStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store backed by a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds an API key.
    pub fn with_api_key(key: impl Into<String>) -> Self {
        let store = Self::new();
        store.entries.insert(API_KEY.to_owned(), key.into());
        store
    }
}

impl SecretStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Check the shape of a Coda API key before storing it.
///
/// Coda keys are long opaque tokens of ASCII letters, digits, `-` and `_`.
pub fn is_valid_api_key(key: &str) -> bool {
    key.len() >= MIN_API_KEY_LEN
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips_entries() {
        let store = MemoryStore::new();
        assert_eq!(store.get(API_KEY).expect("readable"), None);

        store.set(API_KEY, "secret").expect("writable");
        assert_eq!(store.get(API_KEY).expect("readable").as_deref(), Some("secret"));

        store.delete(API_KEY).expect("writable");
        assert_eq!(store.get(API_KEY).expect("readable"), None);
    }

    #[test]
    fn api_key_format() {
        assert!(is_valid_api_key("0123456789abcdef0123456789-_ABCD"));
        assert!(!is_valid_api_key("too-short"));
        assert!(!is_valid_api_key("0123456789abcdef0123456789 spaces"));
        assert!(!is_valid_api_key("0123456789abcdef0123456789/slash!"));
        assert!(!is_valid_api_key(""));
    }
}
