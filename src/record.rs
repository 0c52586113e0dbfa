//! Page records: whole-payload encoding and decoding for one database.

use crate::codec;
use crate::config::UnmappedPolicy;
use crate::error::{ClientError, TransportError};
use crate::schema::SchemaRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// A decoded page: page metadata plus properties keyed by logical name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub last_edited_time: Option<String>,
    pub properties: Map<String, Value>,
}

impl PageRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.properties.get(field)
    }
}

/// Encodes and decodes property bags for a single database
#[derive(Clone)]
pub struct RecordCodec {
    schema: Arc<SchemaRegistry>,
    db_name: String,
    unmapped: UnmappedPolicy,
}

impl RecordCodec {
    pub fn new(schema: Arc<SchemaRegistry>, db_name: impl Into<String>, unmapped: UnmappedPolicy) -> Self {
        Self {
            schema,
            db_name: db_name.into(),
            unmapped,
        }
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    /// Encode a domain payload into the wire `properties` object.
    ///
    /// Null fields are omitted. Fields with no wire mapping are dropped with a
    /// warning, or rejected under [`UnmappedPolicy::Error`].
    pub fn encode(&self, payload: &Map<String, Value>) -> Result<Map<String, Value>, ClientError> {
        let mut properties = Map::with_capacity(payload.len());

        for (field, value) in payload {
            let Some(config) = self.schema.lookup_by_logical_name(&self.db_name, field) else {
                match self.unmapped {
                    UnmappedPolicy::Skip => {
                        warn!(
                            database = self.db_name.as_str(),
                            property = field.as_str(),
                            "Dropping property with no wire mapping"
                        );
                        continue;
                    }
                    UnmappedPolicy::Error => {
                        return Err(ClientError::UnmappedProperty {
                            database: self.db_name.clone(),
                            property: field.clone(),
                        });
                    }
                }
            };

            let encoded = codec::encode(config.property_type, value).map_err(|source| {
                ClientError::Codec {
                    property: field.clone(),
                    source,
                }
            })?;
            if let Some(wire_value) = encoded {
                properties.insert(config.wire_name.clone(), wire_value);
            }
        }

        Ok(properties)
    }

    /// Decode a raw page object.
    ///
    /// Every resolved property appears in the result, with the type's empty value
    /// when the page does not carry it. Wire properties outside the schema are ignored.
    pub fn decode(&self, page: &Value) -> Result<PageRecord, ClientError> {
        let id = page
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| TransportError::Decode("page object has no id".to_string()))?;

        let empty = Map::new();
        let wire_properties = page
            .get("properties")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let (properties, ignored) = self.decode_properties(wire_properties);
        for wire_name in ignored {
            debug!(
                database = self.db_name.as_str(),
                property = wire_name,
                "Ignoring wire property with no logical mapping"
            );
        }

        Ok(PageRecord {
            id: id.to_string(),
            archived: page.get("archived").and_then(Value::as_bool).unwrap_or(false),
            url: string_field(page, "url"),
            created_time: string_field(page, "created_time"),
            last_edited_time: string_field(page, "last_edited_time"),
            properties,
        })
    }
}

impl RecordCodec {
    /// Decode every resolved property. Also returns the wire keys that matched no
    /// resolved property, either by name or by stable id.
    fn decode_properties<'a>(
        &self,
        wire_properties: &'a Map<String, Value>,
    ) -> (Map<String, Value>, Vec<&'a str>) {
        let mut properties = Map::new();
        let mut consumed: HashSet<&str> = HashSet::new();

        if let Some(database) = self.schema.database(&self.db_name) {
            for config in &database.properties {
                // Fall back to the stable id when the property was renamed remotely
                let wire = wire_properties
                    .get_key_value(&config.wire_name)
                    .or_else(|| {
                        wire_properties.iter().find(|(_, p)| {
                            p.get("id").and_then(Value::as_str) == Some(config.id.as_str())
                        })
                    });
                if let Some((key, _)) = wire {
                    consumed.insert(key.as_str());
                }
                properties.insert(
                    config.logical_name.clone(),
                    codec::decode(config, wire.map(|(_, value)| value)),
                );
            }
        }

        let ignored = wire_properties
            .keys()
            .map(String::as_str)
            .filter(|key| !consumed.contains(key))
            .collect();
        (properties, ignored)
    }
}

fn string_field(page: &Value, key: &str) -> Option<String> {
    page.get(key).and_then(Value::as_str).map(str::to_string)
}
