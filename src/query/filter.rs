//! Filter trees: the domain-level `FilterNode` callers build, the wire-level
//! `WireFilter` sent to the API, and the recursive translation between them.

use super::status_group::{self, StatusGroupCondition};
use crate::error::FilterError;
use crate::schema::{PropertyType, SchemaRegistry};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Option name that never exists on a real property; a status `equals` on it matches nothing
pub const UNSATISFIABLE_OPTION: &str = "__notion_typed_unsatisfiable__";

/// No page is created before this instant
const UNSATISFIABLE_CREATED_BEFORE: &str = "1970-01-01T00:00:00.000Z";

/// Page timestamps filterable without a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampKind {
    CreatedTime,
    LastEditedTime,
}

impl TimestampKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampKind::CreatedTime => "created_time",
            TimestampKind::LastEditedTime => "last_edited_time",
        }
    }

    fn parse(s: &str) -> Result<Self, FilterError> {
        match s {
            "created_time" => Ok(TimestampKind::CreatedTime),
            "last_edited_time" => Ok(TimestampKind::LastEditedTime),
            other => Err(FilterError::UnknownTimestamp(other.to_string())),
        }
    }
}

/// Condition attached to a property filter
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyCondition {
    /// Wire-native condition nested under a type key, e.g. `"rich_text": {"contains": "x"}`
    Typed { key: String, body: Value },
    /// Derived status-group condition, expanded during translation
    StatusGroup(StatusGroupCondition),
}

/// Domain filter tree, keyed by logical property names
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    And(Vec<FilterNode>),
    Or(Vec<FilterNode>),
    Property {
        property: String,
        condition: PropertyCondition,
    },
    Timestamp {
        timestamp: TimestampKind,
        condition: Value,
    },
}

impl FilterNode {
    pub fn and(children: Vec<FilterNode>) -> Self {
        FilterNode::And(children)
    }

    pub fn or(children: Vec<FilterNode>) -> Self {
        FilterNode::Or(children)
    }

    /// Wire-native condition on a logical property
    pub fn property(property: impl Into<String>, key: impl Into<String>, body: Value) -> Self {
        FilterNode::Property {
            property: property.into(),
            condition: PropertyCondition::Typed {
                key: key.into(),
                body,
            },
        }
    }

    pub fn status_group(property: impl Into<String>, condition: StatusGroupCondition) -> Self {
        FilterNode::Property {
            property: property.into(),
            condition: PropertyCondition::StatusGroup(condition),
        }
    }

    pub fn timestamp(timestamp: TimestampKind, condition: Value) -> Self {
        FilterNode::Timestamp {
            timestamp,
            condition,
        }
    }

    /// Parse the loosely-typed JSON form callers pass at the API boundary.
    ///
    /// Nodes are recognized by key: `and`, `or`, `timestamp`, then `property`.
    pub fn from_json(value: &Value) -> Result<Self, FilterError> {
        let obj = value.as_object().ok_or(FilterError::NotAnObject)?;

        if let Some(children) = obj.get("and") {
            return Ok(FilterNode::And(parse_children(children, "and")?));
        }
        if let Some(children) = obj.get("or") {
            return Ok(FilterNode::Or(parse_children(children, "or")?));
        }

        if let Some(timestamp) = obj.get("timestamp") {
            let kind = timestamp
                .as_str()
                .ok_or_else(|| FilterError::UnknownTimestamp(timestamp.to_string()))
                .and_then(TimestampKind::parse)?;
            let condition = obj
                .get(kind.as_str())
                .cloned()
                .ok_or_else(|| FilterError::MissingCondition(kind.as_str().to_string()))?;
            return Ok(FilterNode::Timestamp {
                timestamp: kind,
                condition,
            });
        }

        if let Some(property) = obj.get("property").and_then(Value::as_str) {
            let mut conditions = obj.iter().filter(|(k, _)| k.as_str() != "property");
            let (key, body) = conditions
                .next()
                .ok_or_else(|| FilterError::MissingCondition(property.to_string()))?;
            if conditions.next().is_some() {
                return Err(FilterError::AmbiguousCondition(property.to_string()));
            }

            let condition = if key == status_group::CONDITION_KEY {
                PropertyCondition::StatusGroup(StatusGroupCondition::from_json(body))
            } else {
                PropertyCondition::Typed {
                    key: key.clone(),
                    body: body.clone(),
                }
            };
            return Ok(FilterNode::Property {
                property: property.to_string(),
                condition,
            });
        }

        Err(FilterError::UnrecognizedNode)
    }
}

fn parse_children(children: &Value, kind: &'static str) -> Result<Vec<FilterNode>, FilterError> {
    children
        .as_array()
        .ok_or(FilterError::InvalidCompound(kind))?
        .iter()
        .map(FilterNode::from_json)
        .collect()
}

impl TryFrom<&Value> for FilterNode {
    type Error = FilterError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        FilterNode::from_json(value)
    }
}

/// Wire filter tree, keyed by wire property names
#[derive(Debug, Clone, PartialEq)]
pub enum WireFilter {
    And(Vec<WireFilter>),
    Or(Vec<WireFilter>),
    Property {
        property: String,
        key: String,
        condition: Value,
    },
    Timestamp {
        timestamp: TimestampKind,
        condition: Value,
    },
    /// Matches no page. `property` is the status property whose sentinel
    /// stands in for it on the wire; `None` for an empty `OR`.
    Unsatisfiable { property: Option<String> },
}

impl WireFilter {
    pub fn property(property: impl Into<String>, key: impl Into<String>, condition: Value) -> Self {
        WireFilter::Property {
            property: property.into(),
            key: key.into(),
            condition,
        }
    }

    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self, WireFilter::Unsatisfiable { .. })
    }

    /// `AND` over translated children; an unsatisfiable child makes the whole node unsatisfiable
    fn all_of(mut children: Vec<WireFilter>) -> Self {
        match children.iter().position(WireFilter::is_unsatisfiable) {
            Some(i) => children.swap_remove(i),
            None => WireFilter::And(children),
        }
    }

    /// `OR` over translated children. An empty `OR` matches nothing. Unsatisfiable
    /// children are dropped; a single survivor replaces the node, and if nothing
    /// survives the node itself is unsatisfiable.
    fn any_of(children: Vec<WireFilter>) -> Self {
        if children.is_empty() {
            return WireFilter::Unsatisfiable { property: None };
        }
        let (never, mut live): (Vec<_>, Vec<_>) =
            children.into_iter().partition(WireFilter::is_unsatisfiable);
        match (live.len(), never.into_iter().next()) {
            (0, Some(unsatisfiable)) => unsatisfiable,
            (1, Some(_)) => live.swap_remove(0),
            _ => WireFilter::Or(live),
        }
    }

    /// Wire JSON for the `filter` field of a database query
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        match self {
            WireFilter::And(children) => {
                obj.insert(
                    "and".to_string(),
                    Value::Array(children.iter().map(WireFilter::to_json).collect()),
                );
            }
            WireFilter::Or(children) => {
                obj.insert(
                    "or".to_string(),
                    Value::Array(children.iter().map(WireFilter::to_json).collect()),
                );
            }
            WireFilter::Property {
                property,
                key,
                condition,
            } => {
                obj.insert("property".to_string(), Value::String(property.clone()));
                obj.insert(key.clone(), condition.clone());
            }
            WireFilter::Timestamp {
                timestamp,
                condition,
            } => {
                obj.insert(
                    "timestamp".to_string(),
                    Value::String(timestamp.as_str().to_string()),
                );
                obj.insert(timestamp.as_str().to_string(), condition.clone());
            }
            WireFilter::Unsatisfiable {
                property: Some(property),
            } => {
                obj.insert("property".to_string(), Value::String(property.clone()));
                obj.insert(
                    PropertyType::Status.wire_key().to_string(),
                    serde_json::json!({ "equals": UNSATISFIABLE_OPTION }),
                );
            }
            WireFilter::Unsatisfiable { property: None } => {
                let created = TimestampKind::CreatedTime.as_str();
                obj.insert("timestamp".to_string(), Value::String(created.to_string()));
                obj.insert(
                    created.to_string(),
                    serde_json::json!({ "before": UNSATISFIABLE_CREATED_BEFORE }),
                );
            }
        }
        Value::Object(obj)
    }
}

/// Translate a domain filter tree for `db_name` into a wire filter tree.
///
/// Never fails: properties without a resolved mapping keep their logical name,
/// and status groups that resolve to no options become [`WireFilter::Unsatisfiable`].
pub fn translate_filter(schema: &SchemaRegistry, db_name: &str, node: &FilterNode) -> WireFilter {
    match node {
        FilterNode::And(children) => WireFilter::all_of(
            children
                .iter()
                .map(|c| translate_filter(schema, db_name, c))
                .collect(),
        ),
        FilterNode::Or(children) => WireFilter::any_of(
            children
                .iter()
                .map(|c| translate_filter(schema, db_name, c))
                .collect(),
        ),
        FilterNode::Timestamp {
            timestamp,
            condition,
        } => WireFilter::Timestamp {
            timestamp: *timestamp,
            condition: condition.clone(),
        },
        FilterNode::Property {
            property,
            condition,
        } => {
            let config = schema.lookup_by_logical_name(db_name, property);
            let wire_name = match config {
                Some(config) => config.wire_name.as_str(),
                None => {
                    debug!(
                        database = db_name,
                        property = property.as_str(),
                        "No wire mapping for filter property, passing name through"
                    );
                    property.as_str()
                }
            };

            match condition {
                PropertyCondition::Typed { key, body } => {
                    WireFilter::property(wire_name, key.clone(), body.clone())
                }
                PropertyCondition::StatusGroup(group_condition) => match config {
                    Some(config)
                        if config.property_type == PropertyType::Status
                            && config.groups().is_some() =>
                    {
                        status_group::expand(config, group_condition)
                    }
                    _ => WireFilter::property(
                        wire_name,
                        status_group::CONDITION_KEY,
                        group_condition.to_json(),
                    ),
                },
            }
        }
    }
}
