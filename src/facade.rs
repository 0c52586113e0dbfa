//! Typed Facade
//!
//! Entry point for callers: create, read, update, archive and query pages using
//! logical database and property names. Each call validates (writes only),
//! encodes through the schema, invokes the transport, and decodes the response.
//! Nothing is kept between calls except the read-only schema registry.

use crate::config::{ClientConfig, UnmappedPolicy, MAX_PAGE_SIZE};
use crate::error::{ClientError, ValidationError};
use crate::pagination::{DatabaseQuery, Paginator, QueryResult, RecordStream};
use crate::query::{translate_filter, translate_sorts, FilterNode, SortSpec};
use crate::record::{PageRecord, RecordCodec};
use crate::schema::SchemaRegistry;
use crate::transport::{HttpTransport, PageUpdate, Transport};
use crate::validation::{SchemaValidator, ValidationMode, Validator};
use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Filter, sort and paging options for a database query
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub filter: Option<FilterNode>,
    pub sorts: Vec<SortSpec>,
    /// Start cursor; only meaningful for single-page queries
    pub cursor: Option<String>,
    pub page_size: Option<u32>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: FilterNode) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sorts.push(sort);
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// Schema-aware client over a [`Transport`]
pub struct TypedClient {
    schema: Arc<SchemaRegistry>,
    transport: Arc<dyn Transport>,
    validator: Arc<dyn Validator>,
    default_page_size: u32,
    unmapped: UnmappedPolicy,
}

impl TypedClient {
    pub fn new(
        schema: Arc<SchemaRegistry>,
        transport: Arc<dyn Transport>,
        validator: Arc<dyn Validator>,
    ) -> Self {
        Self {
            schema,
            transport,
            validator,
            default_page_size: MAX_PAGE_SIZE,
            unmapped: UnmappedPolicy::Skip,
        }
    }

    /// Client validating writes with the built-in [`SchemaValidator`]
    pub fn with_schema_validator(schema: Arc<SchemaRegistry>, transport: Arc<dyn Transport>) -> Self {
        let validator = Arc::new(SchemaValidator::new(schema.clone()));
        Self::new(schema, transport, validator)
    }

    /// Build a client from configuration: loads the resolved schema file and
    /// talks to the REST API over HTTP
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ClientError::Config(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;

        let schema = Arc::new(SchemaRegistry::load_from_file(&config.schema.path)?);
        let transport = Arc::new(HttpTransport::new(&config.api)?);

        Ok(Self::with_schema_validator(schema, transport)
            .with_default_page_size(config.query.default_page_size)
            .with_unmapped_policy(config.unmapped))
    }

    pub fn with_default_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_unmapped_policy(mut self, unmapped: UnmappedPolicy) -> Self {
        self.unmapped = unmapped;
        self
    }

    pub fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// Wire id of a configured database
    pub fn database_id(&self, db_name: &str) -> Result<&str, ClientError> {
        self.schema
            .database_id(db_name)
            .ok_or_else(|| ClientError::UnknownDatabase(db_name.to_string()))
    }

    /// Raw database object, including the live property schema
    pub async fn retrieve_database(&self, db_name: &str) -> Result<Value, ClientError> {
        let database_id = self.database_id(db_name)?;
        Ok(self.transport.retrieve_database(database_id).await?)
    }

    #[instrument(skip(self, properties))]
    pub async fn create_page(
        &self,
        db_name: &str,
        properties: &Map<String, Value>,
    ) -> Result<PageRecord, ClientError> {
        let database_id = self.database_id(db_name)?;
        self.validate(db_name, ValidationMode::Create, properties)?;

        let codec = self.codec(db_name);
        let wire_properties = codec.encode(properties)?;
        let page = self
            .transport
            .create_page(database_id, wire_properties)
            .await?;
        let record = codec.decode(&page)?;
        info!(page_id = record.id.as_str(), "Created page");
        Ok(record)
    }

    #[instrument(skip(self, properties))]
    pub async fn update_page(
        &self,
        page_id: &str,
        db_name: &str,
        properties: &Map<String, Value>,
    ) -> Result<PageRecord, ClientError> {
        self.database_id(db_name)?;
        self.validate(db_name, ValidationMode::Update, properties)?;

        let codec = self.codec(db_name);
        let wire_properties = codec.encode(properties)?;
        let page = self
            .transport
            .update_page(page_id, PageUpdate::properties(wire_properties))
            .await?;
        codec.decode(&page)
    }

    #[instrument(skip(self))]
    pub async fn get_page(&self, page_id: &str, db_name: &str) -> Result<PageRecord, ClientError> {
        self.database_id(db_name)?;
        let page = self.transport.retrieve_page(page_id).await?;
        self.codec(db_name).decode(&page)
    }

    /// Archive a page. The protocol has no hard delete.
    #[instrument(skip(self))]
    pub async fn delete_page(&self, page_id: &str) -> Result<(), ClientError> {
        self.transport
            .update_page(page_id, PageUpdate::archive())
            .await?;
        info!("Archived page");
        Ok(())
    }

    /// One page of results; the caller drives `cursor`
    #[instrument(skip(self, options))]
    pub async fn query_database(
        &self,
        db_name: &str,
        options: QueryOptions,
    ) -> Result<QueryResult, ClientError> {
        let cursor = options.cursor.clone();
        match self.paginator(db_name, &options)? {
            Some(paginator) => paginator.single(cursor).await,
            None => Ok(QueryResult::default()),
        }
    }

    /// Every result, held in memory. Use [`Self::query_database_iter`] for large sets.
    #[instrument(skip(self, options))]
    pub async fn query_database_all(
        &self,
        db_name: &str,
        options: QueryOptions,
    ) -> Result<Vec<PageRecord>, ClientError> {
        match self.paginator(db_name, &options)? {
            Some(paginator) => paginator.all().await,
            None => Ok(Vec::new()),
        }
    }

    /// Lazy stream of every result. Nothing is fetched until the stream is
    /// polled; dropping it stops further fetches.
    pub fn query_database_iter(
        &self,
        db_name: &str,
        options: QueryOptions,
    ) -> Result<RecordStream, ClientError> {
        match self.paginator(db_name, &options)? {
            Some(paginator) => Ok(paginator.into_stream()),
            None => Ok(stream::empty().boxed()),
        }
    }

    fn validate(
        &self,
        db_name: &str,
        mode: ValidationMode,
        properties: &Map<String, Value>,
    ) -> Result<(), ClientError> {
        self.validator
            .validate(db_name, mode, properties)
            .map_err(|violations| {
                ClientError::Validation(ValidationError {
                    database: db_name.to_string(),
                    mode,
                    violations,
                })
            })
    }

    fn codec(&self, db_name: &str) -> RecordCodec {
        RecordCodec::new(self.schema.clone(), db_name, self.unmapped)
    }

    /// Translate the query and build its paginator; `None` when the filter can
    /// never match, so no request needs to be made
    fn paginator(
        &self,
        db_name: &str,
        options: &QueryOptions,
    ) -> Result<Option<Paginator>, ClientError> {
        let database_id = self.database_id(db_name)?;

        let filter = match &options.filter {
            Some(node) => {
                let wire = translate_filter(&self.schema, db_name, node);
                if wire.is_unsatisfiable() {
                    debug!(database = db_name, "Filter is unsatisfiable, skipping request");
                    return Ok(None);
                }
                Some(wire.to_json())
            }
            None => None,
        };
        let sorts = translate_sorts(&self.schema, db_name, &options.sorts)
            .iter()
            .map(SortSpec::to_json)
            .collect();
        let page_size = options
            .page_size
            .unwrap_or(self.default_page_size)
            .clamp(1, MAX_PAGE_SIZE);

        let query = DatabaseQuery::new(
            self.transport.clone(),
            database_id,
            filter,
            sorts,
            Some(page_size),
        );
        Ok(Some(Paginator::new(Arc::new(query), self.codec(db_name))))
    }
}
