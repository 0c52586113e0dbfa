//! Property Codec
//!
//! Bidirectional marshalling between domain values (plain JSON shaped the way
//! callers think about a field) and the wire protocol's per-type property
//! payloads. Both directions dispatch on [`PropertyType`].

use crate::error::CodecError;
use crate::schema::{PropertyType, ResolvedPropertyConfig};
use serde_json::{json, Map, Value};

/// Encode a domain value into the wire payload for a property of `property_type`.
///
/// Returns `Ok(None)` when the value is null: the field must be left out of the
/// outgoing payload entirely rather than sent as an explicit null.
pub fn encode(property_type: PropertyType, value: &Value) -> Result<Option<Value>, CodecError> {
    if value.is_null() {
        return Ok(None);
    }
    let key = property_type.wire_key();
    let payload = match property_type {
        PropertyType::Title | PropertyType::RichText => {
            let text = expect_str(property_type, value, "a string")?;
            json!([{ "type": "text", "text": { "content": text } }])
        }
        PropertyType::Number => {
            if !value.is_number() {
                return Err(invalid(property_type, "a number"));
            }
            value.clone()
        }
        PropertyType::Select => json!({ "name": expect_str(property_type, value, "an option name")? }),
        PropertyType::Status => {
            // Group is derived on read; only the option name is ever written
            let name = match value {
                Value::String(s) => s.as_str(),
                Value::Object(obj) => obj
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| invalid(property_type, "an option name or {name}"))?,
                _ => return Err(invalid(property_type, "an option name or {name}")),
            };
            json!({ "name": name })
        }
        PropertyType::MultiSelect => {
            let names = expect_str_array(property_type, value, "an array of option names")?;
            Value::Array(names.into_iter().map(|n| json!({ "name": n })).collect())
        }
        PropertyType::Date => {
            let has_start = value.get("start").map(Value::is_string).unwrap_or(false);
            if !has_start {
                return Err(invalid(property_type, "an object with a string 'start'"));
            }
            value.clone()
        }
        PropertyType::People | PropertyType::Relation => {
            let ids = expect_str_array(property_type, value, "an array of ids")?;
            Value::Array(ids.into_iter().map(|id| json!({ "id": id })).collect())
        }
        PropertyType::Checkbox => {
            if !value.is_boolean() {
                return Err(invalid(property_type, "a boolean"));
            }
            value.clone()
        }
        PropertyType::Url | PropertyType::Email | PropertyType::PhoneNumber => {
            Value::String(expect_str(property_type, value, "a string")?.to_string())
        }
        PropertyType::Files => {
            let entries = value
                .as_array()
                .ok_or_else(|| invalid(property_type, "an array of {name, url}"))?;
            let mut files = Vec::with_capacity(entries.len());
            for entry in entries {
                let name = entry.get("name").and_then(Value::as_str);
                let url = entry.get("url").and_then(Value::as_str);
                match (name, url) {
                    (Some(name), Some(url)) => files.push(json!({
                        "name": name,
                        "type": "external",
                        "external": { "url": url },
                    })),
                    _ => return Err(invalid(property_type, "an array of {name, url}")),
                }
            }
            Value::Array(files)
        }
        PropertyType::Formula
        | PropertyType::Rollup
        | PropertyType::CreatedTime
        | PropertyType::CreatedBy
        | PropertyType::LastEditedTime
        | PropertyType::LastEditedBy
        | PropertyType::UniqueId => {
            return Err(CodecError::ReadOnly(property_type.to_string()));
        }
    };

    let mut wrapped = Map::with_capacity(1);
    wrapped.insert(key.to_string(), payload);
    Ok(Some(Value::Object(wrapped)))
}

/// Decode a wire property object (`{"id", "type", "<type>": ...}`) into a domain value.
///
/// Absent or null input yields the type's empty value.
pub fn decode(config: &ResolvedPropertyConfig, wire: Option<&Value>) -> Value {
    let inner = wire.and_then(|w| w.get(config.property_type.wire_key()));
    match inner {
        Some(inner) if !inner.is_null() => decode_inner(config.property_type, Some(config), inner),
        _ => empty_value(config.property_type),
    }
}

/// Empty domain value for a type: null for scalars, `[]` for lists, `false` for checkbox
pub fn empty_value(property_type: PropertyType) -> Value {
    match property_type {
        PropertyType::MultiSelect
        | PropertyType::People
        | PropertyType::Relation
        | PropertyType::Files => Value::Array(Vec::new()),
        PropertyType::Checkbox => Value::Bool(false),
        _ => Value::Null,
    }
}

fn decode_inner(
    property_type: PropertyType,
    config: Option<&ResolvedPropertyConfig>,
    inner: &Value,
) -> Value {
    match property_type {
        PropertyType::Title | PropertyType::RichText => decode_text(inner),
        PropertyType::Select => inner.get("name").cloned().unwrap_or(Value::Null),
        PropertyType::Status => decode_status(config, inner),
        PropertyType::MultiSelect => collect_field(inner, "name"),
        PropertyType::People | PropertyType::Relation => collect_field(inner, "id"),
        PropertyType::Files => decode_files(inner),
        PropertyType::Checkbox => Value::Bool(inner.as_bool().unwrap_or(false)),
        PropertyType::CreatedBy | PropertyType::LastEditedBy => {
            inner.get("id").cloned().unwrap_or(Value::Null)
        }
        PropertyType::Formula => tagged_value(inner),
        PropertyType::Rollup => decode_rollup(inner),
        PropertyType::Number
        | PropertyType::Date
        | PropertyType::Url
        | PropertyType::Email
        | PropertyType::PhoneNumber
        | PropertyType::CreatedTime
        | PropertyType::LastEditedTime
        | PropertyType::UniqueId => inner.clone(),
    }
}

fn decode_text(runs: &Value) -> Value {
    let Some(runs) = runs.as_array() else {
        return Value::Null;
    };
    if runs.is_empty() {
        return Value::Null;
    }
    let text: String = runs
        .iter()
        .filter_map(|run| {
            run.get("plain_text")
                .or_else(|| run.get("text").and_then(|t| t.get("content")))
                .and_then(Value::as_str)
        })
        .collect();
    Value::String(text)
}

fn decode_status(config: Option<&ResolvedPropertyConfig>, inner: &Value) -> Value {
    let Some(name) = inner.get("name").and_then(Value::as_str) else {
        return Value::Null;
    };

    let mut out = Map::new();
    out.insert("name".to_string(), Value::String(name.to_string()));

    if let Some(config) = config {
        let option_id = inner
            .get("id")
            .and_then(Value::as_str)
            .or_else(|| config.option_by_name(name).map(|o| o.id.as_str()));
        if let Some(group) = option_id.and_then(|id| config.group_of_option(id)) {
            out.insert("group".to_string(), Value::String(group.name.clone()));
        }
    }

    Value::Object(out)
}

fn collect_field(items: &Value, field: &str) -> Value {
    let values = items
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|item| item.get(field).cloned())
                .collect()
        })
        .unwrap_or_default();
    Value::Array(values)
}

fn decode_files(items: &Value) -> Value {
    let files = items
        .as_array()
        .map(|arr| {
            arr.iter()
                .map(|item| {
                    let kind = item.get("type").and_then(Value::as_str).unwrap_or("external");
                    let url = item
                        .get(kind)
                        .and_then(|f| f.get("url"))
                        .cloned()
                        .unwrap_or(Value::Null);
                    json!({
                        "name": item.get("name").cloned().unwrap_or(Value::Null),
                        "url": url,
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Value::Array(files)
}

/// Formula results are `{"type": "number", "number": 3}`
fn tagged_value(inner: &Value) -> Value {
    inner
        .get("type")
        .and_then(Value::as_str)
        .and_then(|tag| inner.get(tag))
        .cloned()
        .unwrap_or(Value::Null)
}

fn decode_rollup(inner: &Value) -> Value {
    match inner.get("type").and_then(Value::as_str) {
        Some("array") => {
            let items = inner
                .get("array")
                .and_then(Value::as_array)
                .map(|arr| arr.iter().map(decode_tagged_item).collect())
                .unwrap_or_default();
            Value::Array(items)
        }
        _ => tagged_value(inner),
    }
}

/// Rollup array items carry their own type tag
fn decode_tagged_item(item: &Value) -> Value {
    let tag = item.get("type").cloned().unwrap_or(Value::Null);
    match serde_json::from_value::<PropertyType>(tag) {
        Ok(property_type) => match item.get(property_type.wire_key()) {
            Some(inner) if !inner.is_null() => decode_inner(property_type, None, inner),
            _ => empty_value(property_type),
        },
        Err(_) => item.clone(),
    }
}

fn invalid(property_type: PropertyType, expected: &'static str) -> CodecError {
    CodecError::InvalidValue {
        property_type: property_type.to_string(),
        expected,
    }
}

fn expect_str<'a>(
    property_type: PropertyType,
    value: &'a Value,
    expected: &'static str,
) -> Result<&'a str, CodecError> {
    value.as_str().ok_or_else(|| invalid(property_type, expected))
}

fn expect_str_array<'a>(
    property_type: PropertyType,
    value: &'a Value,
    expected: &'static str,
) -> Result<Vec<&'a str>, CodecError> {
    value
        .as_array()
        .and_then(|arr| arr.iter().map(Value::as_str).collect::<Option<Vec<_>>>())
        .ok_or_else(|| invalid(property_type, expected))
}
