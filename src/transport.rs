//! Transport Abstraction
//!
//! The five wire primitives the facade is built on. Implementations own
//! authentication, HTTP and any retry policy; the engine calls them one at a time
//! and propagates their errors unchanged.

use crate::error::TransportError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod http;

pub use http::HttpTransport;

/// Body of a database query call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sorts: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// One batch of raw page objects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Body of an update call: new property values, the archive flag, or both
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

impl PageUpdate {
    pub fn properties(properties: Map<String, Value>) -> Self {
        Self {
            properties: Some(properties),
            archived: None,
        }
    }

    /// Soft delete; the protocol has no hard delete
    pub fn archive() -> Self {
        Self {
            properties: None,
            archived: Some(true),
        }
    }
}

/// Wire transport trait
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch a database object, including its live property schema
    async fn retrieve_database(&self, database_id: &str) -> Result<Value, TransportError>;

    /// Fetch one page of query results
    async fn query_database(
        &self,
        database_id: &str,
        request: &QueryRequest,
    ) -> Result<Page, TransportError>;

    /// Create a page inside a database and return the created page object
    async fn create_page(
        &self,
        database_id: &str,
        properties: Map<String, Value>,
    ) -> Result<Value, TransportError>;

    async fn retrieve_page(&self, page_id: &str) -> Result<Value, TransportError>;

    async fn update_page(&self, page_id: &str, update: PageUpdate)
        -> Result<Value, TransportError>;
}
