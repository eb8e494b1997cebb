//! # rest-request
//!
//! Send files to a REST endpoint, one request per file, and store each response body
//! in a local output directory.
//!
//! ## Design Philosophy
//!
//! rest-request is designed to be:
//! - **Explicitly configured** - Everything a run needs lives in one [`Config`]
//! - **Sensible defaults** - POST, `text/plain` uploads, outputs under `target/rest`
//! - **Failure tolerant** - One failed file never stops the others; every failure is
//!   reported together at the end
//! - **Sequential** - Files are processed one at a time, in selection order
//!
//! ## Quick Start
//!
//! ```no_run
//! use rest_request::{Config, FileSetConfig, RemapRule, Runner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         resource: Some("convert".to_string()),
//!         fileset: Some(FileSetConfig::new("docs").include("**/*.md")),
//!         file_mapper: Some(RemapRule::Extension {
//!             extension: "pdf".to_string(),
//!         }),
//!         ..Config::new("http://localhost:8080/md2pdf")
//!     };
//!
//!     let summary = Runner::new(config)?.run().await?;
//!     println!("wrote {} files", summary.written.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// File selection
pub mod fileset;
/// Output filename remapping
pub mod remap;
/// Request construction
pub mod request;
/// Response classification and persistence
pub mod response;
/// Run coordination
pub mod runner;

// Re-export commonly used types
pub use config::{Config, FileSetConfig, TransportConfig};
pub use error::{Error, ErrorRecord, NON_HTTP_STATUS, Result, RunFailure};
pub use fileset::FileSelector;
pub use remap::{FilenameRemapper, RemapRule};
pub use request::RequestTemplate;
pub use response::{ResponseHandler, StatusFamily};
pub use runner::{RunSummary, Runner, run};
