// ── Credential stores ──
//
// `KeyringStore` talks to the platform secret service. `ConfiguredStore`
// is what the CLI hands to the exporter: it walks the credential chain for
// reads and routes writes to the keyring or the config file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use codaport_core::{API_KEY, SecretStore, StoreError};

use crate::{Config, load_file, save_config_to};

/// Keyring service name all codaport secrets live under.
pub const KEYRING_SERVICE: &str = "codaport";

// ── Keyring ─────────────────────────────────────────────────────────

/// System keyring, one entry per key under [`KEYRING_SERVICE`].
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(KEYRING_SERVICE)
    }
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, StoreError> {
        keyring::Entry::new(&self.service, key)
            .map_err(|e| StoreError::Unavailable(format!("failed to access keyring: {e}")))
    }
}

impl SecretStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.entry(key)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(StoreError::Unavailable(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| StoreError::Write(format!("failed to store in keyring: {e}")))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(StoreError::Write(format!(
                "failed to delete from keyring: {e}"
            ))),
        }
    }
}

// ── Resolution chain ────────────────────────────────────────────────

/// Where a resolved API key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// `--api-key` flag or `CODAPORT_API_KEY`.
    Override,
    /// The variable named by `api_key_env`.
    EnvVar,
    Keyring,
    ConfigFile,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Override => "command line / CODAPORT_API_KEY",
            Self::EnvVar => "environment variable",
            Self::Keyring => "system keyring",
            Self::ConfigFile => "config file (plaintext)",
        })
    }
}

/// The store the CLI uses.
///
/// Reads walk: explicit override → `api_key_env` → keyring (when enabled)
/// → plaintext `api_key`. Writes go to the keyring, or to the config file
/// when `use_keyring = false`.
pub struct ConfiguredStore {
    override_key: Option<SecretString>,
    api_key_env: Option<String>,
    use_keyring: bool,
    keyring: Box<dyn SecretStore>,
    plaintext: RwLock<Option<String>>,
    path: PathBuf,
}

impl ConfiguredStore {
    pub fn new(config: &Config, path: impl Into<PathBuf>) -> Self {
        Self {
            override_key: None,
            api_key_env: config.api_key_env.clone(),
            use_keyring: config.use_keyring,
            keyring: Box::new(KeyringStore::default()),
            plaintext: RwLock::new(config.api_key.clone()),
            path: path.into(),
        }
    }

    /// Key supplied on the command line; wins over every other source.
    pub fn with_override(mut self, key: Option<SecretString>) -> Self {
        self.override_key = key.filter(|k| !k.expose_secret().trim().is_empty());
        self
    }

    pub fn uses_keyring(&self) -> bool {
        self.use_keyring
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve the API key along with the source that provided it.
    pub fn resolve_api_key(&self) -> Result<Option<(String, KeySource)>, StoreError> {
        if let Some(key) = &self.override_key {
            return Ok(Some((key.expose_secret().to_owned(), KeySource::Override)));
        }

        if let Some(name) = &self.api_key_env {
            match std::env::var(name) {
                Ok(val) if !val.trim().is_empty() => return Ok(Some((val, KeySource::EnvVar))),
                _ => debug!(var = %name, "api_key_env variable not set"),
            }
        }

        // A broken keyring only matters if nothing later in the chain has a key.
        let mut keyring_err = None;
        if self.use_keyring {
            match self.keyring.get(API_KEY) {
                Ok(Some(key)) => return Ok(Some((key, KeySource::Keyring))),
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "keyring unavailable");
                    keyring_err = Some(e);
                }
            }
        }

        if let Some(key) = self.plaintext()?.filter(|k| !k.trim().is_empty()) {
            return Ok(Some((key, KeySource::ConfigFile)));
        }

        keyring_err.map_or(Ok(None), Err)
    }

    fn plaintext(&self) -> Result<Option<String>, StoreError> {
        self.plaintext
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| StoreError::Unavailable("config lock poisoned".into()))
    }

    fn write_plaintext(&self, value: Option<&str>) -> Result<(), StoreError> {
        let mut file = load_file(&self.path).map_err(|e| StoreError::Write(e.to_string()))?;
        file.api_key = value.map(str::to_owned);
        save_config_to(&file, &self.path).map_err(|e| StoreError::Write(e.to_string()))?;

        let mut guard = self
            .plaintext
            .write()
            .map_err(|_| StoreError::Write("config lock poisoned".into()))?;
        *guard = file.api_key;
        Ok(())
    }
}

impl SecretStore for ConfiguredStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if key == API_KEY {
            return Ok(self.resolve_api_key()?.map(|(value, _)| value));
        }
        if self.use_keyring {
            self.keyring.get(key)
        } else {
            Ok(None)
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.use_keyring {
            return self.keyring.set(key, value);
        }
        if key != API_KEY {
            return Err(StoreError::Write(format!(
                "'{key}' can only be stored in the system keyring"
            )));
        }
        self.write_plaintext(Some(value))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        if self.use_keyring {
            self.keyring.delete(key)?;
        }
        if key == API_KEY && self.plaintext()?.is_some() {
            self.write_plaintext(None)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file_store(dir: &tempfile::TempDir, api_key: Option<&str>) -> ConfiguredStore {
        let config = Config {
            api_key: api_key.map(str::to_owned),
            use_keyring: false,
            ..Config::default()
        };
        ConfiguredStore::new(&config, dir.path().join("config.toml"))
    }

    #[test]
    fn override_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = file_store(&dir, Some("from-file"))
            .with_override(Some(SecretString::from("from-flag")));

        assert_eq!(
            store.resolve_api_key().expect("readable"),
            Some(("from-flag".to_owned(), KeySource::Override))
        );
    }

    #[test]
    fn blank_override_is_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store =
            file_store(&dir, Some("from-file")).with_override(Some(SecretString::from("  ")));

        assert_eq!(
            store.get(API_KEY).expect("readable").as_deref(),
            Some("from-file")
        );
    }

    #[test]
    fn unset_env_var_falls_through() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config {
            api_key: Some("from-file".into()),
            api_key_env: Some("CODAPORT_TEST_SURELY_UNSET_VARIABLE".into()),
            use_keyring: false,
            ..Config::default()
        };
        let store = ConfiguredStore::new(&config, dir.path().join("config.toml"));

        assert_eq!(
            store.resolve_api_key().expect("readable"),
            Some(("from-file".to_owned(), KeySource::ConfigFile))
        );
    }

    #[test]
    fn missing_everywhere_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = file_store(&dir, None);
        assert_eq!(store.get(API_KEY).expect("readable"), None);
    }

    #[test]
    fn writes_go_to_config_file_without_keyring() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = file_store(&dir, None);

        store.set(API_KEY, "written-key").expect("writable");
        assert_eq!(
            store.get(API_KEY).expect("readable").as_deref(),
            Some("written-key")
        );
        let on_disk = load_file(store.path()).expect("loads");
        assert_eq!(on_disk.api_key.as_deref(), Some("written-key"));

        store.delete(API_KEY).expect("writable");
        assert_eq!(store.get(API_KEY).expect("readable"), None);
        let on_disk = load_file(store.path()).expect("loads");
        assert_eq!(on_disk.api_key, None);
    }

    struct LockedKeyring;

    impl SecretStore for LockedKeyring {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("keyring is locked".into()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Write("keyring is locked".into()))
        }

        fn delete(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Write("keyring is locked".into()))
        }
    }

    fn locked_keyring_store(dir: &tempfile::TempDir, api_key: Option<&str>) -> ConfiguredStore {
        let store = file_store(dir, api_key);
        ConfiguredStore {
            use_keyring: true,
            keyring: Box::new(LockedKeyring),
            ..store
        }
    }

    #[test]
    fn keyring_failure_falls_back_to_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = locked_keyring_store(&dir, Some("from-file"));

        assert_eq!(
            store.resolve_api_key().expect("config file has a key"),
            Some(("from-file".to_owned(), KeySource::ConfigFile))
        );
    }

    #[test]
    fn keyring_failure_surfaces_without_fallback() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = locked_keyring_store(&dir, None);

        let err = store.get(API_KEY).expect_err("nothing else has a key");
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn other_keys_need_keyring() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = file_store(&dir, None);
        assert!(matches!(
            store.set("something-else", "v"),
            Err(StoreError::Write(_))
        ));
        assert_eq!(store.get("something-else").expect("readable"), None);
    }
}
