//! Configuration types for rest-request

use crate::error::{Error, Result};
use crate::remap::RemapRule;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path, path::PathBuf, time::Duration};

/// Transport behaviour of the HTTP client
///
/// Used as a flattened sub-config within [`Config`], so the keys sit at the top level
/// of the configuration file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TransportConfig {
    /// Follow redirect responses (default: true)
    #[serde(default = "default_true")]
    pub follow_redirects: bool,

    /// Maximum number of redirect hops when following (default: 1)
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Skip TLS certificate validation (default: false)
    #[serde(default)]
    pub accept_invalid_certs: bool,

    /// Per-request timeout in seconds (None = transport default)
    #[serde(default, with = "optional_duration_serde")]
    pub timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            follow_redirects: true,
            max_redirects: default_max_redirects(),
            accept_invalid_certs: false,
            timeout: None,
        }
    }
}

/// File-selection rule
///
/// Patterns are Ant-style globs relative to `directory`: `*` stays within one path
/// segment, `**` spans segments, and a trailing `/` selects everything below.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct FileSetConfig {
    /// Base directory to search (rules without one are skipped)
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Patterns to include (empty = everything)
    #[serde(default)]
    pub includes: Vec<String>,

    /// Patterns to exclude (exclude overrides include)
    #[serde(default)]
    pub excludes: Vec<String>,

    /// Also exclude VCS metadata and editor leftovers (default: true)
    #[serde(default = "default_true")]
    pub use_default_excludes: bool,
}

impl FileSetConfig {
    /// Rule selecting every file below `directory`
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
            includes: Vec::new(),
            excludes: Vec::new(),
            use_default_excludes: true,
        }
    }

    /// Add an include pattern
    #[must_use]
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.includes.push(pattern.into());
        self
    }

    /// Add an exclude pattern
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.excludes.push(pattern.into());
        self
    }
}

/// Main configuration for one run
///
/// Immutable once the run starts. Maps are ordered so query parameters and headers are
/// applied in a deterministic order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Base URL of the REST service (required)
    #[serde(default)]
    pub endpoint: String,

    /// Path appended to the endpoint to reach the resource
    #[serde(default)]
    pub resource: Option<String>,

    /// HTTP method (default: "POST")
    #[serde(default = "default_method")]
    pub method: String,

    /// Single file-selection rule, processed after `filesets`
    #[serde(default)]
    pub fileset: Option<FileSetConfig>,

    /// File-selection rules; one request is made per selected file
    #[serde(default)]
    pub filesets: Vec<FileSetConfig>,

    /// Where response bodies are stored (default: "target/rest")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Output name for the bodyless GET/DELETE request (default: "rest.file")
    #[serde(default = "default_output_filename")]
    pub output_filename: String,

    /// Query parameters added to the request URL
    #[serde(default)]
    pub query_params: BTreeMap<String, String>,

    /// Headers added to every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Content-Type of uploaded files (default: "text/plain")
    #[serde(default = "default_request_type")]
    pub request_type: String,

    /// Accepted response type (default: "application/octet-stream")
    #[serde(default = "default_response_type")]
    pub response_type: String,

    /// Single remap rule; when set, `file_mappers` is ignored
    #[serde(default)]
    pub file_mapper: Option<RemapRule>,

    /// Remap rules applied in order to derive output names
    #[serde(default)]
    pub file_mappers: Vec<RemapRule>,

    /// HTTP client behaviour
    #[serde(flatten)]
    pub transport: TransportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            resource: None,
            method: default_method(),
            fileset: None,
            filesets: Vec::new(),
            output_dir: default_output_dir(),
            output_filename: default_output_filename(),
            query_params: BTreeMap::new(),
            headers: BTreeMap::new(),
            request_type: default_request_type(),
            response_type: default_response_type(),
            file_mapper: None,
            file_mappers: Vec::new(),
            transport: TransportConfig::default(),
        }
    }
}

impl Config {
    /// Configuration for `endpoint` with every other field at its default
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Load a JSON configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Check the settings that can be verified without touching the network or disk
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::config("endpoint", "endpoint URL is required"));
        }
        if self.method.trim().is_empty() {
            return Err(Error::config("method", "method must not be empty"));
        }
        if self.output_filename.trim().is_empty() {
            return Err(Error::config(
                "output_filename",
                "output filename must not be empty",
            ));
        }
        if self.transport.follow_redirects && self.transport.max_redirects == 0 {
            return Err(Error::config(
                "max_redirects",
                "max_redirects must be at least 1 when follow_redirects is enabled",
            ));
        }
        Ok(())
    }

    /// Whether an empty selection still warrants a single bodyless request
    pub fn is_bodyless_method(&self) -> bool {
        let method = self.method.trim();
        method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("DELETE")
    }
}

fn default_true() -> bool {
    true
}

fn default_max_redirects() -> usize {
    1
}

fn default_method() -> String {
    "POST".into()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("target").join("rest")
}

fn default_output_filename() -> String {
    "rest.file".into()
}

fn default_request_type() -> String {
    "text/plain".into()
}

fn default_response_type() -> String {
    "application/octet-stream".into()
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
