#![deny(unsafe_code)]

use std::collections::BTreeMap;

use crate::enums::EnumTable;
use crate::error::StandardsError;
use crate::schema::{ObjectSchema, ValueKind};

/// Object schemas and enumeration tables of one file format.
#[derive(Debug, Clone)]
pub struct SchemaSet {
    pub name: String,
    pub(crate) types: BTreeMap<String, ObjectSchema>,
    pub(crate) enums: BTreeMap<String, EnumTable>,
}

impl SchemaSet {
    /// Schema of an object type. Unknown names are not fatal for callers:
    /// the section is kept as unclassified content.
    pub fn schema_for(&self, type_name: &str) -> Result<&ObjectSchema, StandardsError> {
        self.types
            .get(type_name)
            .ok_or_else(|| StandardsError::UnknownObjectType {
                name: type_name.to_string(),
            })
    }

    pub fn get(&self, type_name: &str) -> Option<&ObjectSchema> {
        self.types.get(type_name)
    }

    pub fn enum_table(&self, name: &str) -> Option<&EnumTable> {
        self.enums.get(name)
    }

    /// Object types in name order.
    pub fn types(&self) -> impl Iterator<Item = &ObjectSchema> {
        self.types.values()
    }

    pub fn enum_tables(&self) -> impl Iterator<Item = &EnumTable> {
        self.enums.values()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn enum_count(&self) -> usize {
        self.enums.len()
    }

    /// Types declaring at least one reference attribute targeting `target`.
    pub fn referencing_types(&self, target: &str) -> Vec<&str> {
        self.types
            .values()
            .filter(|schema| {
                schema.attributes().iter().any(|def| {
                    matches!(&def.kind, ValueKind::Reference { target: t, .. } if t == target)
                })
            })
            .map(|schema| schema.name.as_str())
            .collect()
    }

    /// Adds tables from `other` that this set does not define itself.
    pub(crate) fn inherit_tables(&mut self, other: &SchemaSet) {
        for (name, table) in &other.enums {
            self.enums
                .entry(name.clone())
                .or_insert_with(|| table.clone());
        }
    }
}
