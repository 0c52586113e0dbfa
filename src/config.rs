//! Configuration System
//!
//! Client configuration for API access, query defaults, the resolved-schema file
//! and logging. Values are layered from defaults, a user-level file, workspace
//! files and environment variables by [`ConfigLoader`].

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

mod loader;
mod merge;
mod sources;

pub use loader::ConfigLoader;

/// Largest page the wire protocol will return
pub const MAX_PAGE_SIZE: u32 = 100;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub schema: SchemaConfig,

    /// What to do with a written field that has no wire mapping
    #[serde(default)]
    pub unmapped: UnmappedPolicy,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Workspace API access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value of the API version header
    #[serde(default = "default_version")]
    pub version: String,

    /// Integration token; usually supplied through the environment
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.notion.com/v1".to_string()
}

fn default_version() -> String {
    "2022-06-28".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            version: default_version(),
            token: None,
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Page size used when a query does not ask for one
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Resolved-schema file written by the schema resolver (JSON or TOML)
    #[serde(default = "default_schema_path")]
    pub path: PathBuf,
}

fn default_schema_path() -> PathBuf {
    PathBuf::from("notion-schema.json")
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            path: default_schema_path(),
        }
    }
}

/// Handling of written properties with no resolved wire mapping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedPolicy {
    /// Drop the field and emit a warning
    #[default]
    Skip,
    /// Fail the call
    Error,
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    Api(String),
    Query(String),
    Schema(String),
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValidationError::Api(msg) => write!(f, "api: {}", msg),
            ConfigValidationError::Query(msg) => write!(f, "query: {}", msg),
            ConfigValidationError::Schema(msg) => write!(f, "schema: {}", msg),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

impl ClientConfig {
    /// Validate the entire configuration, collecting every problem
    pub fn validate(&self) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        if !(self.api.base_url.starts_with("https://") || self.api.base_url.starts_with("http://")) {
            errors.push(ConfigValidationError::Api(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.api.base_url
            )));
        }
        if self.api.version.trim().is_empty() {
            errors.push(ConfigValidationError::Api("version cannot be empty".to_string()));
        }
        if self.api.connect_timeout_secs == 0 || self.api.request_timeout_secs == 0 {
            errors.push(ConfigValidationError::Api(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if self.query.default_page_size == 0 || self.query.default_page_size > MAX_PAGE_SIZE {
            errors.push(ConfigValidationError::Query(format!(
                "default_page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.query.default_page_size
            )));
        }
        if self.schema.path.as_os_str().is_empty() {
            errors.push(ConfigValidationError::Schema("path cannot be empty".to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
