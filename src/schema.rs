//! Resolved Schema Model
//!
//! Immutable, per-database registry mapping logical property names to the wire
//! names and ids the workspace API uses, along with the option and status-group
//! catalogs of choice-like properties. Built once from the output of the schema
//! resolver and shared read-only by every facade call.

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Wire property type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Title,
    RichText,
    Number,
    Select,
    MultiSelect,
    Status,
    Date,
    People,
    Files,
    Checkbox,
    Url,
    Email,
    PhoneNumber,
    Relation,
    Formula,
    Rollup,
    CreatedTime,
    CreatedBy,
    LastEditedTime,
    LastEditedBy,
    UniqueId,
}

impl PropertyType {
    /// Key under which the wire protocol nests this type's value and filter condition
    pub fn wire_key(&self) -> &'static str {
        match self {
            PropertyType::Title => "title",
            PropertyType::RichText => "rich_text",
            PropertyType::Number => "number",
            PropertyType::Select => "select",
            PropertyType::MultiSelect => "multi_select",
            PropertyType::Status => "status",
            PropertyType::Date => "date",
            PropertyType::People => "people",
            PropertyType::Files => "files",
            PropertyType::Checkbox => "checkbox",
            PropertyType::Url => "url",
            PropertyType::Email => "email",
            PropertyType::PhoneNumber => "phone_number",
            PropertyType::Relation => "relation",
            PropertyType::Formula => "formula",
            PropertyType::Rollup => "rollup",
            PropertyType::CreatedTime => "created_time",
            PropertyType::CreatedBy => "created_by",
            PropertyType::LastEditedTime => "last_edited_time",
            PropertyType::LastEditedBy => "last_edited_by",
            PropertyType::UniqueId => "unique_id",
        }
    }

    /// Types whose values are computed by the workspace and never written
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            PropertyType::Formula
                | PropertyType::Rollup
                | PropertyType::CreatedTime
                | PropertyType::CreatedBy
                | PropertyType::LastEditedTime
                | PropertyType::LastEditedBy
                | PropertyType::UniqueId
        )
    }

    /// Types that carry an option catalog
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            PropertyType::Select | PropertyType::MultiSelect | PropertyType::Status
        )
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_key())
    }
}

/// One option of a select, multi-select or status property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyOption {
    /// Stable across renames
    pub id: String,
    /// Human-editable label used in values and filters
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Named bucket of status options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    pub option_ids: Vec<String>,
}

/// Resolved configuration of a single property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPropertyConfig {
    pub id: String,
    pub logical_name: String,
    #[serde(default)]
    pub label: String,
    pub wire_name: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    /// Required on create by the built-in validator
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<PropertyOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<StatusGroup>>,
}

impl ResolvedPropertyConfig {
    pub fn new(
        id: impl Into<String>,
        logical_name: impl Into<String>,
        wire_name: impl Into<String>,
        property_type: PropertyType,
    ) -> Self {
        let logical_name = logical_name.into();
        Self {
            id: id.into(),
            label: logical_name.clone(),
            logical_name,
            wire_name: wire_name.into(),
            property_type,
            required: false,
            options: None,
            groups: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_options(mut self, options: Vec<PropertyOption>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_groups(mut self, groups: Vec<StatusGroup>) -> Self {
        self.groups = Some(groups);
        self
    }

    pub fn options(&self) -> &[PropertyOption] {
        self.options.as_deref().unwrap_or(&[])
    }

    pub fn groups(&self) -> Option<&[StatusGroup]> {
        self.groups.as_deref()
    }

    pub fn option_by_id(&self, id: &str) -> Option<&PropertyOption> {
        self.options().iter().find(|o| o.id == id)
    }

    pub fn option_by_name(&self, name: &str) -> Option<&PropertyOption> {
        self.options().iter().find(|o| o.name == name)
    }

    pub fn group_by_name(&self, name: &str) -> Option<&StatusGroup> {
        self.groups()?.iter().find(|g| g.name == name)
    }

    /// Group containing the given option id
    pub fn group_of_option(&self, option_id: &str) -> Option<&StatusGroup> {
        self.groups()?
            .iter()
            .find(|g| g.option_ids.iter().any(|id| id == option_id))
    }
}

/// Resolved schema of one database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedDatabaseSchema {
    pub id: String,
    pub logical_name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub wire_name: String,
    #[serde(default)]
    pub properties: Vec<ResolvedPropertyConfig>,
}

/// On-disk layout of the resolver output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaFile {
    #[serde(default)]
    pub databases: Vec<ResolvedDatabaseSchema>,
}

struct DatabaseEntry {
    schema: ResolvedDatabaseSchema,
    by_logical: HashMap<String, usize>,
    by_wire: HashMap<String, usize>,
}

/// Read-only registry of every resolved database, keyed by logical database name
pub struct SchemaRegistry {
    databases: HashMap<String, DatabaseEntry>,
}

impl SchemaRegistry {
    /// Build the registry, checking every per-database invariant
    pub fn new(databases: Vec<ResolvedDatabaseSchema>) -> Result<Self, SchemaError> {
        let mut entries = HashMap::with_capacity(databases.len());

        for schema in databases {
            let entry = index_database(schema)?;
            let name = entry.schema.logical_name.clone();
            if entries.insert(name.clone(), entry).is_some() {
                return Err(SchemaError::DuplicateDatabase(name));
            }
        }

        Ok(Self { databases: entries })
    }

    /// Load the resolver output from a JSON or TOML file (chosen by extension)
    pub fn load_from_file(path: &Path) -> Result<Self, SchemaError> {
        let content = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let file: SchemaFile = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content).map_err(|e| SchemaError::Parse(e.to_string()))?,
            _ => serde_json::from_str(&content).map_err(|e| SchemaError::Parse(e.to_string()))?,
        };

        Self::new(file.databases)
    }

    pub fn database(&self, db_name: &str) -> Option<&ResolvedDatabaseSchema> {
        self.databases.get(db_name).map(|e| &e.schema)
    }

    pub fn database_id(&self, db_name: &str) -> Option<&str> {
        self.databases.get(db_name).map(|e| e.schema.id.as_str())
    }

    pub fn database_names(&self) -> impl Iterator<Item = &str> {
        self.databases.keys().map(String::as_str)
    }

    pub fn lookup_by_logical_name(
        &self,
        db_name: &str,
        logical_name: &str,
    ) -> Option<&ResolvedPropertyConfig> {
        let entry = self.databases.get(db_name)?;
        entry
            .by_logical
            .get(logical_name)
            .map(|&i| &entry.schema.properties[i])
    }

    pub fn lookup_by_wire_name(
        &self,
        db_name: &str,
        wire_name: &str,
    ) -> Option<&ResolvedPropertyConfig> {
        let entry = self.databases.get(db_name)?;
        entry
            .by_wire
            .get(wire_name)
            .map(|&i| &entry.schema.properties[i])
    }
}

fn index_database(schema: ResolvedDatabaseSchema) -> Result<DatabaseEntry, SchemaError> {
    let mut by_logical = HashMap::with_capacity(schema.properties.len());
    let mut by_wire = HashMap::with_capacity(schema.properties.len());

    for (i, prop) in schema.properties.iter().enumerate() {
        if by_logical.insert(prop.logical_name.clone(), i).is_some() {
            return Err(SchemaError::DuplicateLogicalName {
                database: schema.logical_name.clone(),
                property: prop.logical_name.clone(),
            });
        }
        if by_wire.insert(prop.wire_name.clone(), i).is_some() {
            return Err(SchemaError::DuplicateWireName {
                database: schema.logical_name.clone(),
                property: prop.wire_name.clone(),
            });
        }
        check_catalogs(&schema.logical_name, prop)?;
    }

    Ok(DatabaseEntry {
        schema,
        by_logical,
        by_wire,
    })
}

fn check_catalogs(database: &str, prop: &ResolvedPropertyConfig) -> Result<(), SchemaError> {
    if prop.options.is_some() && !prop.property_type.is_choice() {
        return Err(SchemaError::UnexpectedOptions {
            database: database.to_string(),
            property: prop.logical_name.clone(),
            property_type: prop.property_type.to_string(),
        });
    }

    let Some(groups) = prop.groups() else {
        return Ok(());
    };

    if prop.property_type != PropertyType::Status {
        return Err(SchemaError::UnexpectedGroups {
            database: database.to_string(),
            property: prop.logical_name.clone(),
            property_type: prop.property_type.to_string(),
        });
    }

    let known: HashSet<&str> = prop.options().iter().map(|o| o.id.as_str()).collect();
    for group in groups {
        if let Some(missing) = group.option_ids.iter().find(|id| !known.contains(id.as_str())) {
            return Err(SchemaError::UnknownGroupOption {
                database: database.to_string(),
                property: prop.logical_name.clone(),
                group: group.name.clone(),
                option_id: missing.clone(),
            });
        }
    }

    Ok(())
}
