//! Payload validation
//!
//! The facade runs a [`Validator`] before every create and update; a failure stops
//! the call before anything reaches the transport. [`SchemaValidator`] is the
//! built-in implementation driven by the resolved schema.

use crate::codec;
use crate::error::CodecError;
use crate::schema::{PropertyType, ResolvedPropertyConfig, SchemaRegistry};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    Create,
    Update,
}

impl std::fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationMode::Create => f.write_str("create"),
            ValidationMode::Update => f.write_str("update"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    UnknownDatabase,
    Missing,
    ReadOnly,
    InvalidType,
    UnknownOption,
    InvalidDate,
}

/// One field-level problem with a payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    fn new(field: &str, kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Payload validator
pub trait Validator: Send + Sync {
    /// Check a domain payload keyed by logical names; all violations are returned at once
    fn validate(
        &self,
        db_name: &str,
        mode: ValidationMode,
        payload: &Map<String, Value>,
    ) -> Result<(), Vec<Violation>>;
}

/// Validator driven by the resolved schema.
///
/// Fields the schema does not know are not reported; they are handled by the
/// facade's unmapped-property policy.
pub struct SchemaValidator {
    schema: Arc<SchemaRegistry>,
}

impl SchemaValidator {
    pub fn new(schema: Arc<SchemaRegistry>) -> Self {
        Self { schema }
    }
}

impl Validator for SchemaValidator {
    fn validate(
        &self,
        db_name: &str,
        mode: ValidationMode,
        payload: &Map<String, Value>,
    ) -> Result<(), Vec<Violation>> {
        let Some(database) = self.schema.database(db_name) else {
            return Err(vec![Violation::new(
                db_name,
                ViolationKind::UnknownDatabase,
                "database is not in the resolved schema",
            )]);
        };

        let mut violations = Vec::new();

        for (field, value) in payload {
            let Some(config) = self.schema.lookup_by_logical_name(db_name, field) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            check_value(field, config, value, &mut violations);
        }

        if mode == ValidationMode::Create {
            for prop in database.properties.iter().filter(|p| p.required) {
                let present = payload
                    .get(&prop.logical_name)
                    .map(|v| !v.is_null())
                    .unwrap_or(false);
                if !present {
                    violations.push(Violation::new(
                        &prop.logical_name,
                        ViolationKind::Missing,
                        "required field is missing",
                    ));
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

fn check_value(
    field: &str,
    config: &ResolvedPropertyConfig,
    value: &Value,
    violations: &mut Vec<Violation>,
) {
    match codec::encode(config.property_type, value) {
        Err(CodecError::ReadOnly(ty)) => {
            violations.push(Violation::new(
                field,
                ViolationKind::ReadOnly,
                format!("{} properties cannot be written", ty),
            ));
            return;
        }
        Err(err) => {
            violations.push(Violation::new(field, ViolationKind::InvalidType, err.to_string()));
            return;
        }
        Ok(_) => {}
    }

    match config.property_type {
        PropertyType::Select | PropertyType::Status => {
            let name = value
                .as_str()
                .or_else(|| value.get("name").and_then(Value::as_str));
            if let Some(name) = name {
                check_option(field, config, name, violations);
            }
        }
        PropertyType::MultiSelect => {
            for name in value.as_array().into_iter().flatten().filter_map(Value::as_str) {
                check_option(field, config, name, violations);
            }
        }
        PropertyType::Date => {
            for key in ["start", "end"] {
                if let Some(s) = value.get(key).and_then(Value::as_str) {
                    if !is_iso_date(s) {
                        violations.push(Violation::new(
                            field,
                            ViolationKind::InvalidDate,
                            format!("'{}' is not an ISO-8601 date or date-time", s),
                        ));
                    }
                }
            }
        }
        _ => {}
    }
}

fn check_option(
    field: &str,
    config: &ResolvedPropertyConfig,
    name: &str,
    violations: &mut Vec<Violation>,
) {
    // No catalog means nothing to check against
    if config.options.is_none() || config.option_by_name(name).is_some() {
        return;
    }
    violations.push(Violation::new(
        field,
        ViolationKind::UnknownOption,
        format!("'{}' is not an option of {}", name, config.wire_name),
    ));
}

fn is_iso_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").is_ok()
}
