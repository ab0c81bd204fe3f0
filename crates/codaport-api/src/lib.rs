// codaport-api: Async Rust client for the Coda page-export endpoints

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::CodaClient;
pub use error::Error;
pub use transport::TransportConfig;
pub use types::{ExportJob, ExportJobStatus, ExportState, OutputFormat, PageDetails, PageList, PageNode};

/// Base URL of the public Coda REST API.
pub const DEFAULT_API_BASE: &str = "https://coda.io/apis/v1/";
