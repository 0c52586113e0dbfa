//! Sort specifications and logical-to-wire name rewriting.

use crate::error::FilterError;
use crate::schema::SchemaRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::filter::TimestampKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// One sort entry, keyed either by property or by page timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortSpec {
    Property {
        property: String,
        #[serde(default)]
        direction: SortDirection,
    },
    Timestamp {
        timestamp: TimestampKind,
        #[serde(default)]
        direction: SortDirection,
    },
}

impl SortSpec {
    pub fn property(property: impl Into<String>, direction: SortDirection) -> Self {
        SortSpec::Property {
            property: property.into(),
            direction,
        }
    }

    pub fn timestamp(timestamp: TimestampKind, direction: SortDirection) -> Self {
        SortSpec::Timestamp {
            timestamp,
            direction,
        }
    }

    pub fn from_json(value: &Value) -> Result<Self, FilterError> {
        serde_json::from_value(value.clone()).map_err(|_| FilterError::InvalidSort(value.to_string()))
    }

    pub fn to_json(&self) -> Value {
        // Both variants are plain strings and enums
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Rewrite logical property names to wire names. Entries without a mapping,
/// and timestamp entries, are returned unchanged.
pub fn translate_sorts(schema: &SchemaRegistry, db_name: &str, sorts: &[SortSpec]) -> Vec<SortSpec> {
    sorts
        .iter()
        .map(|sort| match sort {
            SortSpec::Property {
                property,
                direction,
            } => match schema.lookup_by_logical_name(db_name, property) {
                Some(config) => SortSpec::property(config.wire_name.clone(), *direction),
                None => {
                    debug!(
                        database = db_name,
                        property = property.as_str(),
                        "No wire mapping for sort property, passing name through"
                    );
                    sort.clone()
                }
            },
            SortSpec::Timestamp { .. } => sort.clone(),
        })
        .collect()
}
