//! Error types for the typed Notion facade.

use crate::validation::{ValidationMode, Violation};
use thiserror::Error;

/// Resolved-schema construction and loading errors
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Duplicate database name: {0}")]
    DuplicateDatabase(String),

    #[error("Database '{database}': duplicate logical property name '{property}'")]
    DuplicateLogicalName { database: String, property: String },

    #[error("Database '{database}': duplicate wire property name '{property}'")]
    DuplicateWireName { database: String, property: String },

    #[error("Database '{database}': property '{property}' of type {property_type} cannot carry options")]
    UnexpectedOptions {
        database: String,
        property: String,
        property_type: String,
    },

    #[error("Database '{database}': property '{property}' of type {property_type} cannot carry status groups")]
    UnexpectedGroups {
        database: String,
        property: String,
        property_type: String,
    },

    #[error("Database '{database}': status group '{group}' on '{property}' references unknown option id '{option_id}'")]
    UnknownGroupOption {
        database: String,
        property: String,
        group: String,
        option_id: String,
    },

    #[error("Failed to read schema file {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse schema file: {0}")]
    Parse(String),
}

/// Property codec errors
#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("Property type {0} is read-only and cannot be written")]
    ReadOnly(String),

    #[error("Invalid value for {property_type} property: expected {expected}")]
    InvalidValue {
        property_type: String,
        expected: &'static str,
    },
}

/// Errors raised while parsing caller-supplied filter or sort JSON
#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("Filter node must be a JSON object")]
    NotAnObject,

    #[error("Compound filter '{0}' must hold an array of filters")]
    InvalidCompound(&'static str),

    #[error("Property filter on '{0}' has no condition")]
    MissingCondition(String),

    #[error("Property filter on '{0}' has more than one condition")]
    AmbiguousCondition(String),

    #[error("Unknown timestamp kind: {0}")]
    UnknownTimestamp(String),

    #[error("Filter node has none of 'and', 'or', 'property', 'timestamp'")]
    UnrecognizedNode,

    #[error("Invalid sort entry: {0}")]
    InvalidSort(String),
}

/// Transport-level errors, classified by HTTP status
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Payload rejected by the validator before any wire call
#[derive(Debug, Error)]
#[error("Validation failed for {database} ({mode}): {}", summarize(.violations))]
pub struct ValidationError {
    pub database: String,
    pub mode: ValidationMode,
    pub violations: Vec<Violation>,
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors surfaced by [`crate::facade::TypedClient`]
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Unknown database: {0}")]
    UnknownDatabase(String),

    #[error("Database '{database}': property '{property}' has no resolved wire mapping")]
    UnmappedProperty { database: String, property: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Property '{property}': {source}")]
    Codec {
        property: String,
        #[source]
        source: CodecError,
    },

    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        ClientError::Config(err.to_string())
    }
}
