//! notion-typed: Schema-Aware Typed Facade over the Notion Database API
//!
//! Callers work with logical database and property names and plain domain values.
//! A resolved schema maps those names to the remote wire names, the property codec
//! translates values in both directions, and query filters and sorts are rewritten
//! (including the client-side `status_group` condition) before they reach the
//! transport.

pub mod codec;
pub mod config;
pub mod error;
pub mod facade;
pub mod logging;
pub mod pagination;
pub mod query;
pub mod record;
pub mod schema;
pub mod transport;
pub mod validation;

pub use config::{ClientConfig, ConfigLoader, UnmappedPolicy};
pub use error::{ClientError, ValidationError};
pub use facade::{QueryOptions, TypedClient};
pub use pagination::{QueryResult, RecordStream};
pub use query::{FilterNode, SortDirection, SortSpec, StatusGroupCondition};
pub use record::PageRecord;
pub use schema::{PropertyType, ResolvedDatabaseSchema, ResolvedPropertyConfig, SchemaRegistry};
pub use transport::{HttpTransport, Transport};
pub use validation::{SchemaValidator, ValidationMode, Validator, Violation};
