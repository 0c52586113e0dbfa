//! Integration tests for the typed Notion facade

mod facade_queries;
pub mod test_utils;
