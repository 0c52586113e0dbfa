//! Shared test utilities for integration tests
//!
//! Provides a recording in-memory transport and a resolved schema fixture so the
//! facade can be exercised end to end without network access.

use async_trait::async_trait;
use notion_typed::error::TransportError;
use notion_typed::schema::{PropertyOption, StatusGroup};
use notion_typed::transport::{Page, PageUpdate, QueryRequest};
use notion_typed::{
    PropertyType, ResolvedDatabaseSchema, ResolvedPropertyConfig, SchemaRegistry, Transport,
    TypedClient,
};
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};

/// One call observed by [`MockTransport`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    RetrieveDatabase(String),
    Query { database_id: String, body: Value },
    Create { database_id: String, properties: Value },
    RetrievePage(String),
    Update { page_id: String, body: Value },
}

/// In-memory transport that records every call.
///
/// Queries are served from `pages` of `total` synthetic results each, walked with
/// cursors `c1`, `c2`, ...; page writes echo the written properties back.
pub struct MockTransport {
    calls: Mutex<Vec<Call>>,
    total: usize,
    page_size: usize,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Self::with_results(0, 100)
    }

    /// Serve `total` query results, `page_size` per page
    pub fn with_results(total: usize, page_size: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            total,
            page_size,
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn query_bodies(&self) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Query { body, .. } => Some(body),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn result_page(n: usize) -> Value {
    json!({
        "object": "page",
        "id": format!("page-{}", n),
        "archived": false,
        "properties": {
            "Name": { "id": "ti", "type": "title", "title": [{ "plain_text": format!("Task {}", n) }] },
            "Estimate (h)": { "id": "nu", "type": "number", "number": n }
        }
    })
}

fn echo_page(id: &str, properties: Option<&Map<String, Value>>, archived: bool) -> Value {
    json!({
        "object": "page",
        "id": id,
        "archived": archived,
        "properties": properties.cloned().unwrap_or_default(),
    })
}

#[async_trait]
impl Transport for MockTransport {
    async fn retrieve_database(&self, database_id: &str) -> Result<Value, TransportError> {
        self.record(Call::RetrieveDatabase(database_id.to_string()));
        Ok(json!({ "object": "database", "id": database_id, "properties": {} }))
    }

    async fn query_database(
        &self,
        database_id: &str,
        request: &QueryRequest,
    ) -> Result<Page, TransportError> {
        self.record(Call::Query {
            database_id: database_id.to_string(),
            body: serde_json::to_value(request).map_err(|e| TransportError::Decode(e.to_string()))?,
        });

        let page_index = match &request.start_cursor {
            None => 0,
            Some(cursor) => cursor
                .trim_start_matches('c')
                .parse::<usize>()
                .map_err(|_| TransportError::NotFound(cursor.clone()))?,
        };
        let start = page_index * self.page_size;
        let end = (start + self.page_size).min(self.total);
        let has_more = end < self.total;

        Ok(Page {
            results: (start..end).map(|n| result_page(n + 1)).collect(),
            has_more,
            next_cursor: has_more.then(|| format!("c{}", page_index + 1)),
        })
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: Map<String, Value>,
    ) -> Result<Value, TransportError> {
        self.record(Call::Create {
            database_id: database_id.to_string(),
            properties: Value::Object(properties.clone()),
        });
        Ok(echo_page("page-new", Some(&properties), false))
    }

    async fn retrieve_page(&self, page_id: &str) -> Result<Value, TransportError> {
        self.record(Call::RetrievePage(page_id.to_string()));
        Ok(result_page(7))
    }

    async fn update_page(
        &self,
        page_id: &str,
        update: PageUpdate,
    ) -> Result<Value, TransportError> {
        self.record(Call::Update {
            page_id: page_id.to_string(),
            body: serde_json::to_value(&update).map_err(|e| TransportError::Decode(e.to_string()))?,
        });
        Ok(echo_page(
            page_id,
            update.properties.as_ref(),
            update.archived.unwrap_or(false),
        ))
    }
}

fn option(id: &str, name: &str) -> PropertyOption {
    PropertyOption {
        id: id.to_string(),
        name: name.to_string(),
        color: None,
        description: None,
    }
}

fn group(id: &str, name: &str, option_ids: &[&str]) -> StatusGroup {
    StatusGroup {
        id: id.to_string(),
        name: name.to_string(),
        color: "default".to_string(),
        option_ids: option_ids.iter().map(|s| s.to_string()).collect(),
    }
}

/// `tasks` database: status options Backlog/Ready (To-do), In progress,
/// Done/Shipped (Complete), plus an empty Abandoned group
pub fn tasks_schema() -> ResolvedDatabaseSchema {
    ResolvedDatabaseSchema {
        id: "db-tasks".to_string(),
        logical_name: "tasks".to_string(),
        label: "Tasks".to_string(),
        wire_name: "Tasks".to_string(),
        properties: vec![
            ResolvedPropertyConfig::new("ti", "name", "Name", PropertyType::Title).required(),
            ResolvedPropertyConfig::new("nu", "estimate", "Estimate (h)", PropertyType::Number),
            ResolvedPropertyConfig::new("se", "priority", "Priority", PropertyType::Select)
                .with_options(vec![option("p1", "High"), option("p2", "Low")]),
            ResolvedPropertyConfig::new("st", "status", "Status", PropertyType::Status)
                .with_options(vec![
                    option("o1", "Backlog"),
                    option("o2", "Ready"),
                    option("o3", "In progress"),
                    option("o4", "Done"),
                    option("o5", "Shipped"),
                ])
                .with_groups(vec![
                    group("g1", "To-do", &["o1", "o2"]),
                    group("g2", "In progress", &["o3"]),
                    group("g3", "Complete", &["o4", "o5"]),
                    group("g4", "Abandoned", &[]),
                ]),
            ResolvedPropertyConfig::new("dd", "due", "Due date", PropertyType::Date),
            ResolvedPropertyConfig::new("ct", "created", "Created", PropertyType::CreatedTime),
        ],
    }
}

pub fn registry() -> Arc<SchemaRegistry> {
    Arc::new(SchemaRegistry::new(vec![tasks_schema()]).unwrap())
}

/// Client over `transport` using the built-in schema validator
pub fn client(transport: Arc<MockTransport>) -> TypedClient {
    TypedClient::with_schema_validator(registry(), transport)
}
