//! The descriptor as a document of foreign objects typed by the Hauptwerk
//! schema set.

use std::collections::BTreeSet;

use odf_ingest::make_entry;
use odf_model::{
    AttributeEntry, BodyLine, Diagnostic, Document, LineEnding, ObjectId, ObjectRef, OrganObject, RuleId,
    SectionName, TextEncoding, TypedValue,
};
use odf_standards::{IdShape, ObjectSchema, Requirement, SchemaSet};
use tracing::debug;

use crate::xml::ForeignRecord;

/// Foreign objects keyed by type and identifier.
#[derive(Debug, Clone)]
pub struct ForeignOrgan {
    document: Document,
}

impl ForeignOrgan {
    /// Types and validates `records`. Objects without a usable identifier
    /// or with a missing or out-of-range required value are left out and
    /// reported. Optional values outside their range are dropped and
    /// reported.
    pub fn build(records: Vec<ForeignRecord>, set: &SchemaSet) -> (Self, Vec<Diagnostic>) {
        let mut document = Document::new(TextEncoding::Utf8 { bom: false }, LineEnding::Lf);
        let mut diagnostics = Vec::new();
        let mut unknown = BTreeSet::new();
        let mut seen = BTreeSet::new();

        for record in records {
            let Some(schema) = set.get(&record.object_type) else {
                if unknown.insert(record.object_type.clone()) {
                    debug!(object_type = %record.object_type, "ignoring object list");
                }
                continue;
            };
            match typed_object(&record, schema, set) {
                Ok((object, dropped)) => {
                    for reason in dropped {
                        diagnostics.push(skipped(describe(&record, schema), reason));
                    }
                    if seen.insert((object.type_name().to_string(), object.id())) {
                        document.push_object(object);
                    } else {
                        diagnostics.push(skipped(
                            describe(&record, schema),
                            "identifier is used by an earlier object".to_string(),
                        ));
                    }
                }
                Err(reason) => diagnostics.push(skipped(describe(&record, schema), reason)),
            }
        }
        debug!(
            objects = document.object_count(),
            skipped = diagnostics.len(),
            "typed descriptor objects"
        );
        (Self { document }, diagnostics)
    }

    pub fn get(&self, type_name: &str, id: u32) -> Option<&OrganObject> {
        self.document.resolve(type_name, ObjectId::indexed(id))
    }

    pub fn singleton(&self, type_name: &str) -> Option<&OrganObject> {
        self.document.resolve(type_name, ObjectId::SINGLETON)
    }

    /// Objects of a type in ascending identifier order.
    pub fn objects(&self, type_name: &str) -> Vec<&OrganObject> {
        let mut objects: Vec<&OrganObject> = self.document.objects_of_type(type_name).collect();
        objects.sort_by_key(|object| object.id());
        objects
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

fn typed_object(
    record: &ForeignRecord,
    schema: &ObjectSchema,
    set: &SchemaSet,
) -> Result<(OrganObject, Vec<String>), String> {
    let mut entries = Vec::with_capacity(record.values.len());
    let mut dropped = Vec::new();
    for (key, value) in &record.values {
        let entry = make_entry(schema, set, key, value);
        match outside_range(schema, &entry) {
            Some(problem) if is_required(schema, &entry) => return Err(problem),
            Some(problem) => dropped.push(format!("{problem}; value ignored")),
            None => entries.push(entry),
        }
    }

    for def in schema.attributes() {
        if !matches!(def.requirement, Requirement::Required) {
            continue;
        }
        match entries.iter().find(|entry| entry.canonical() == Some(def.name.as_str())) {
            None => return Err(format!("{} is missing", def.name)),
            Some(entry) => {
                if let TypedValue::Invalid { reason } = entry.typed() {
                    return Err(format!("{}: {reason}", def.name));
                }
            }
        }
    }

    let id = match (&schema.id_attribute, schema.shape) {
        (_, IdShape::Singleton) => ObjectId::SINGLETON,
        (Some(attribute), _) => {
            let value = entries
                .iter()
                .find(|entry| entry.canonical() == Some(attribute.as_str()))
                .and_then(|entry| entry.typed().as_integer())
                .and_then(|value| u32::try_from(value).ok())
                .ok_or_else(|| format!("{attribute} is missing"))?;
            ObjectId::indexed(value)
        }
        (None, _) => ObjectId::indexed(record.ordinal),
    };

    let mut object = OrganObject::new(SectionName::new(schema.name.clone(), id));
    for entry in entries {
        object.push_line(BodyLine::Attribute(entry));
    }
    for def in schema.attributes() {
        if let Some(default) = &def.default
            && !def.is_template()
            && !object.has_attribute(&def.name)
        {
            object.push_line(BodyLine::Attribute(make_entry(schema, set, &def.name, default)));
        }
    }
    Ok((object, dropped))
}

fn outside_range(schema: &ObjectSchema, entry: &AttributeEntry) -> Option<String> {
    let matched = schema.resolve_key(entry.key())?;
    let value = match entry.typed() {
        TypedValue::Integer { value } => *value as f64,
        TypedValue::Real { value } => *value,
        _ => return None,
    };
    (!matched.def.range.contains(value)).then(|| {
        format!(
            "{}={} is outside {}",
            matched.def.name,
            entry.value(),
            matched.def.range
        )
    })
}

fn is_required(schema: &ObjectSchema, entry: &AttributeEntry) -> bool {
    schema
        .resolve_key(entry.key())
        .is_some_and(|matched| matches!(matched.def.requirement, Requirement::Required))
}

fn describe(record: &ForeignRecord, schema: &ObjectSchema) -> String {
    let id = schema.id_attribute.as_ref().and_then(|attribute| {
        record.values.iter().find_map(|(key, value)| {
            schema
                .resolve_key(key)
                .filter(|matched| &matched.def.name == attribute)
                .map(|_| value.as_str())
        })
    });
    match id {
        Some(id) if !id.is_empty() => format!("{} {id}", record.object_type),
        _ => format!("{} #{}", record.object_type, record.ordinal),
    }
}

pub(crate) fn skipped(object: String, reason: String) -> Diagnostic {
    Diagnostic::new(RuleId::ConversionSkipped, reason).with_object(ObjectRef::named(object))
}

/// Typed reads of foreign values; invalid or empty values read as absent.
pub(crate) trait Fields {
    fn number(&self) -> u32;
    fn text(&self, name: &str) -> Option<&str>;
    fn integer(&self, name: &str) -> Option<i64>;
    fn real(&self, name: &str) -> Option<f64>;
    fn flag(&self, name: &str) -> Option<bool>;
    fn link(&self, name: &str) -> Option<u32>;
    fn code(&self, name: &str) -> Option<&str>;
}

impl Fields for OrganObject {
    fn number(&self) -> u32 {
        self.id().index.unwrap_or(0)
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.value(name).filter(|value| !value.is_empty())
    }

    fn integer(&self, name: &str) -> Option<i64> {
        self.typed(name)?.as_integer()
    }

    fn real(&self, name: &str) -> Option<f64> {
        self.typed(name)?.as_real()
    }

    fn flag(&self, name: &str) -> Option<bool> {
        self.typed(name)?.as_bool()
    }

    fn link(&self, name: &str) -> Option<u32> {
        match self.typed(name)? {
            TypedValue::Reference(reference) => reference.id.index,
            _ => None,
        }
    }

    fn code(&self, name: &str) -> Option<&str> {
        let entry = self.attribute(name)?;
        (!entry.typed().is_invalid()).then(|| entry.value())
    }
}
