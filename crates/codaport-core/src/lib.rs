//! Export orchestration between `codaport-api` and the CLI.
//!
//! This crate owns the business logic of turning a Coda page URL into a
//! downloadable Markdown file:
//!
//! - **[`Exporter`]**: runs one export end to end. It parses the URL, reads
//!   the API key from a [`SecretStore`], resolves the page id from the
//!   paginated listing, starts the export job, polls it to completion and
//!   validates the download link.
//!
//! - **[`Dispatcher`]**: the command entry point. Rejects a second export
//!   for a URL that is still running and folds every outcome (including
//!   panics) into an [`ExportResult`].
//!
//! - **Pure pieces**: URL parsing ([`DocumentRef`]), page-tree search
//!   ([`find_page`]), the poll state machine ([`ExportPoller`]), the
//!   download-host allow-list and filename sanitizing. None of these touch
//!   the network.

pub mod config;
pub mod credentials;
pub mod dispatcher;
pub mod download_link;
pub mod error;
pub mod exporter;
pub mod filename;
pub mod link;
pub mod poll;
pub mod result;
pub mod tree;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::ExportSettings;
pub use credentials::{
    API_KEY, MIN_API_KEY_LEN, MemoryStore, SecretStore, StoreError, is_valid_api_key,
};
pub use dispatcher::Dispatcher;
pub use download_link::{TRUSTED_DOWNLOAD_HOSTS, validate_download_link};
pub use error::{CoreError, ErrorKind};
pub use exporter::{Exporter, PageExporter};
pub use filename::{DEFAULT_STEM, markdown_filename, sanitize_stem};
pub use link::DocumentRef;
pub use poll::{ExportPoller, PollAction, PollObservation, PollPolicy, PollState};
pub use result::{ExportResult, ExportedPage};
pub use tree::{MAX_TREE_DEPTH, find_page};
