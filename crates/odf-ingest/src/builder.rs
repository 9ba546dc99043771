//! Turns lexed records into a [`Document`] of schema-typed objects.

use std::path::Path;
use std::time::Instant;

use odf_model::{
    AttributeEntry, BodyLine, Diagnostic, Document, LineEnding, OrganObject, RawSection, Section,
    SectionName, TextEncoding, TextLine, TypedValue,
};
use odf_standards::{IdShape, ObjectSchema, PanelFormat, PredicateContext, SchemaSet, classify};
use tracing::{debug, info, info_span};

use crate::encoding::decode;
use crate::error::IngestError;
use crate::lexer::{Record, RecordKind, lex};
use crate::structure::structural_diagnostics;

/// A built document together with the findings of the load.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

/// How a section header maps onto the schema set.
#[derive(Debug, Clone)]
pub enum HeaderClass<'a> {
    Object {
        name: SectionName,
        schema: &'a ObjectSchema,
    },
    InvalidName {
        reason: String,
    },
    UnknownType {
        type_name: String,
    },
    ShapeMismatch {
        type_name: String,
        expected: IdShape,
    },
}

pub fn classify_header<'a>(name: &str, set: &'a SchemaSet) -> HeaderClass<'a> {
    let section = match SectionName::parse(name) {
        Ok(section) => section,
        Err(err) => {
            return HeaderClass::InvalidName {
                reason: err.to_string(),
            };
        }
    };
    let schema = match set.schema_for(section.type_name()) {
        Ok(schema) => schema,
        Err(_) => {
            return HeaderClass::UnknownType {
                type_name: section.type_name().to_string(),
            };
        }
    };
    let id = section.id();
    let shape = match (id.parent, id.index) {
        (None, None) => IdShape::Singleton,
        (None, Some(_)) => IdShape::Indexed,
        _ => IdShape::Nested,
    };
    if shape != schema.shape {
        return HeaderClass::ShapeMismatch {
            type_name: section.type_name().to_string(),
            expected: schema.shape,
        };
    }
    HeaderClass::Object {
        name: section,
        schema,
    }
}

/// Canonical name and typed value of `key=value` under `schema`. Unknown
/// keys yield no canonical name and an opaque value.
pub fn type_value(
    schema: &ObjectSchema,
    set: &SchemaSet,
    key: &str,
    value: &str,
) -> (Option<String>, TypedValue) {
    match schema.resolve_key(key) {
        Some(matched) => (
            Some(matched.canonical()),
            classify(matched.def, value, set),
        ),
        None => (None, TypedValue::Opaque),
    }
}

/// A fresh attribute entry, as created by an edit.
pub fn make_entry(schema: &ObjectSchema, set: &SchemaSet, key: &str, value: &str) -> AttributeEntry {
    let (canonical, typed) = type_value(schema, set, key, value);
    AttributeEntry::new(key, value, canonical, typed)
}

/// Inserts `entry` before the first attribute the schema declares later,
/// so an added attribute lands in declaration order.
pub fn insert_in_schema_order(object: &mut OrganObject, schema: &ObjectSchema, entry: AttributeEntry) {
    let position = schema.position_of(entry.key());
    let before = object
        .attributes()
        .find(|existing| schema.position_of(existing.key()) > position)
        .map(|existing| existing.name().to_string());
    object.insert_attribute(before.as_deref(), entry);
}

/// Appends every required attribute the object lacks and the schema gives a
/// default for. Returns the names added.
pub fn fill_required_defaults(
    object: &mut OrganObject,
    schema: &ObjectSchema,
    set: &SchemaSet,
    panel_format: PanelFormat,
) -> Vec<String> {
    let missing: Vec<(String, String)> = {
        let context = PredicateContext::new(&*object, panel_format);
        schema
            .attributes()
            .iter()
            .filter(|def| !def.is_template() && !object.has_attribute(&def.name))
            .filter(|def| def.requirement.applies(&context))
            .filter_map(|def| Some((def.name.clone(), def.default.clone()?)))
            .collect()
    };
    let mut added = Vec::with_capacity(missing.len());
    for (name, value) in missing {
        insert_in_schema_order(object, schema, make_entry(schema, set, &name, &value));
        added.push(name);
    }
    added
}

enum OpenSection<'a> {
    Object(OrganObject, &'a ObjectSchema),
    Raw(RawSection),
}

fn body_line(kind: RecordKind, line: TextLine, schema: Option<&ObjectSchema>, set: &SchemaSet) -> BodyLine {
    match (kind, schema) {
        (RecordKind::Attribute { key, value }, Some(schema)) => {
            let (canonical, typed) = type_value(schema, set, &key, &value);
            BodyLine::Attribute(AttributeEntry::from_source(key, value, canonical, typed, line))
        }
        (RecordKind::Attribute { key, value }, None) => {
            BodyLine::Attribute(AttributeEntry::from_source(key, value, None, TypedValue::Opaque, line))
        }
        (RecordKind::Comment, _) => BodyLine::Comment(line),
        (RecordKind::Blank, _) => BodyLine::Blank(line),
        (RecordKind::Malformed | RecordKind::Header { .. }, _) => BodyLine::Malformed(line),
    }
}

fn close(document: &mut Document, section: Option<OpenSection<'_>>) {
    match section {
        Some(OpenSection::Object(object, _)) => {
            debug!(section = %object.label(), lines = object.body().len(), "built object");
            document.push_object(object);
        }
        Some(OpenSection::Raw(raw)) => {
            debug!(section = %raw.name(), "kept unclassified section");
            document.push_section(Section::Unclassified(raw));
        }
        None => {}
    }
}

/// Assembles lexed records into a document. Never fails: anything the
/// schema does not recognise is kept verbatim.
pub fn build_document(records: Vec<Record>, encoding: TextEncoding, set: &SchemaSet) -> Document {
    let newline = records
        .iter()
        .map(|record| record.line.ending)
        .find(|ending| *ending != LineEnding::None)
        .unwrap_or_default();
    let mut document = Document::new(encoding, newline);
    let mut open: Option<OpenSection<'_>> = None;

    for Record { kind, line } in records {
        if let RecordKind::Header { name } = &kind {
            close(&mut document, open.take());
            open = Some(match classify_header(name, set) {
                HeaderClass::Object { name, schema } => {
                    OpenSection::Object(OrganObject::from_source(name, line), schema)
                }
                _ => OpenSection::Raw(RawSection {
                    header: line,
                    lines: Vec::new(),
                }),
            });
            continue;
        }
        match &mut open {
            None => document.push_preamble_line(body_line(kind, line, None, set)),
            Some(OpenSection::Raw(raw)) => raw.lines.push(line),
            Some(OpenSection::Object(object, schema)) => {
                object.push_line(body_line(kind, line, Some(*schema), set));
            }
        }
    }
    close(&mut document, open);
    document
}

/// Builds a document from already decoded text.
pub fn parse_text(text: &str, encoding: TextEncoding, set: &SchemaSet) -> LoadOutcome {
    let document = build_document(lex(text), encoding, set);
    let diagnostics = structural_diagnostics(&document, set);
    LoadOutcome {
        document,
        diagnostics,
    }
}

/// Builds a document from a string, remembering it as BOM-less UTF-8.
pub fn parse_str(text: &str, set: &SchemaSet) -> LoadOutcome {
    parse_text(text, TextEncoding::Utf8 { bom: false }, set)
}

pub fn parse_bytes(bytes: &[u8], set: &SchemaSet) -> LoadOutcome {
    let (text, encoding) = decode(bytes);
    parse_text(&text, encoding, set)
}

/// Reads and builds one organ definition file.
pub fn read_file(path: &Path, set: &SchemaSet) -> Result<LoadOutcome, IngestError> {
    let span = info_span!("read_odf", path = %path.display());
    let _guard = span.enter();
    let start = Instant::now();

    let bytes = std::fs::read(path).map_err(|e| IngestError::io(path, e))?;
    let outcome = parse_bytes(&bytes, set);
    info!(
        bytes = bytes.len(),
        objects = outcome.document.object_count(),
        sections = outcome.document.sections().len(),
        encoding = ?outcome.document.encoding(),
        diagnostics = outcome.diagnostics.len(),
        duration_ms = start.elapsed().as_millis(),
        "loaded organ definition"
    );
    Ok(outcome)
}
