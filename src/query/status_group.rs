//! Status-group expansion
//!
//! The wire protocol filters status properties by option name only. A status
//! group condition is rewritten into an equivalent tree of per-option conditions:
//!
//! | condition          | option set S                  | \|S\|=0         | \|S\|=1          | \|S\|>1                  |
//! |--------------------|-------------------------------|-----------------|------------------|--------------------------|
//! | `equals g`         | G(g)                          | unsatisfiable   | `equals`         | `OR` of `equals`         |
//! | `does_not_equal g` | G(g)                          | `is_not_empty`  | `does_not_equal` | `AND` of `does_not_equal`|
//! | `in_any gs`        | ∪ G(gi)                       | unsatisfiable   | `equals`         | `OR` of `equals`         |
//! | `not_in_any gs`    | ALL \ ∪ G(gi)                 | `is_empty`      | `equals`         | `OR` of `equals`         |

use super::filter::WireFilter;
use crate::schema::{PropertyType, ResolvedPropertyConfig};
use serde_json::{json, Value};
use tracing::info;

/// Filter key carrying a status-group condition in the domain filter JSON
pub const CONDITION_KEY: &str = "status_group";

#[derive(Debug, Clone, PartialEq)]
pub enum StatusGroupCondition {
    Equals(String),
    DoesNotEqual(String),
    InAny(Vec<String>),
    NotInAny(Vec<String>),
    IsEmpty,
    IsNotEmpty,
    /// Unrecognized shape, passed through as-is
    Other(Value),
}

impl StatusGroupCondition {
    pub fn from_json(body: &Value) -> Self {
        let Some(obj) = body.as_object().filter(|o| o.len() == 1) else {
            return StatusGroupCondition::Other(body.clone());
        };
        let parsed = obj.iter().next().and_then(|(key, arg)| match key.as_str() {
            "equals" => arg.as_str().map(|g| StatusGroupCondition::Equals(g.to_string())),
            "does_not_equal" => arg
                .as_str()
                .map(|g| StatusGroupCondition::DoesNotEqual(g.to_string())),
            "in_any" => string_list(arg).map(StatusGroupCondition::InAny),
            "not_in_any" => string_list(arg).map(StatusGroupCondition::NotInAny),
            "is_empty" if arg == &Value::Bool(true) => Some(StatusGroupCondition::IsEmpty),
            "is_not_empty" if arg == &Value::Bool(true) => Some(StatusGroupCondition::IsNotEmpty),
            _ => None,
        });
        parsed.unwrap_or_else(|| StatusGroupCondition::Other(body.clone()))
    }

    pub fn to_json(&self) -> Value {
        match self {
            StatusGroupCondition::Equals(g) => json!({ "equals": g }),
            StatusGroupCondition::DoesNotEqual(g) => json!({ "does_not_equal": g }),
            StatusGroupCondition::InAny(gs) => json!({ "in_any": gs }),
            StatusGroupCondition::NotInAny(gs) => json!({ "not_in_any": gs }),
            StatusGroupCondition::IsEmpty => json!({ "is_empty": true }),
            StatusGroupCondition::IsNotEmpty => json!({ "is_not_empty": true }),
            StatusGroupCondition::Other(v) => v.clone(),
        }
    }
}

fn string_list(arg: &Value) -> Option<Vec<String>> {
    arg.as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

/// Expand a status-group condition on a status property that has groups configured
pub fn expand(config: &ResolvedPropertyConfig, condition: &StatusGroupCondition) -> WireFilter {
    let property = config.wire_name.as_str();
    match condition {
        StatusGroupCondition::Equals(group) => any_option(property, group_options(config, &[group])),
        StatusGroupCondition::DoesNotEqual(group) => {
            let excluded = group_options(config, &[group]);
            match excluded.len() {
                0 => status(property, json!({ "is_not_empty": true })),
                1 => status(property, json!({ "does_not_equal": excluded[0] })),
                _ => WireFilter::And(
                    excluded
                        .iter()
                        .map(|name| status(property, json!({ "does_not_equal": name })))
                        .collect(),
                ),
            }
        }
        StatusGroupCondition::InAny(groups) => any_option(property, group_options(config, groups)),
        StatusGroupCondition::NotInAny(groups) => {
            let excluded = group_options(config, groups);
            let remaining: Vec<&str> = config
                .options()
                .iter()
                .map(|o| o.name.as_str())
                .filter(|name| !excluded.contains(name))
                .collect();
            if remaining.is_empty() {
                status(property, json!({ "is_empty": true }))
            } else {
                any_option(property, remaining)
            }
        }
        StatusGroupCondition::IsEmpty => status(property, json!({ "is_empty": true })),
        StatusGroupCondition::IsNotEmpty => status(property, json!({ "is_not_empty": true })),
        StatusGroupCondition::Other(body) => {
            WireFilter::property(property, CONDITION_KEY, body.clone())
        }
    }
}

/// Option names belonging to any of `groups`, deduplicated, in group order.
/// Unknown group names contribute nothing.
fn group_options<'a, S: AsRef<str>>(config: &'a ResolvedPropertyConfig, groups: &[S]) -> Vec<&'a str> {
    let mut names: Vec<&str> = Vec::new();
    for group in groups.iter().filter_map(|g| config.group_by_name(g.as_ref())) {
        for option_id in &group.option_ids {
            if let Some(option) = config.option_by_id(option_id) {
                if !names.contains(&option.name.as_str()) {
                    names.push(option.name.as_str());
                }
            }
        }
    }
    names
}

fn any_option(property: &str, names: Vec<&str>) -> WireFilter {
    match names.as_slice() {
        [] => {
            info!(
                property,
                "Status group condition matches no options, query will return no results"
            );
            WireFilter::Unsatisfiable {
                property: Some(property.to_string()),
            }
        }
        [name] => status(property, json!({ "equals": name })),
        _ => WireFilter::Or(
            names
                .iter()
                .map(|name| status(property, json!({ "equals": name })))
                .collect(),
        ),
    }
}

fn status(property: &str, condition: Value) -> WireFilter {
    WireFilter::property(property, PropertyType::Status.wire_key(), condition)
}
