//! Findings that follow from the shape of the text alone: malformed lines,
//! unclassified sections, unknown or duplicated keys and unparsable values.
//!
//! These are recomputed from the document on every validation run, so an
//! edit that fixes a line also drops its diagnostic.

use std::collections::HashSet;

use odf_model::{
    BodyLine, Diagnostic, Document, ObjectRef, OrganObject, RawSection, RuleId, Section, TypedValue,
};
use odf_standards::{IdShape, ObjectSchema, SchemaSet};
use rapidfuzz::distance::jaro_winkler;

use crate::builder::{HeaderClass, classify_header};

const SUGGESTION_THRESHOLD: f64 = 0.85;

pub fn structural_diagnostics(document: &Document, set: &SchemaSet) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for line in document.preamble() {
        match line {
            BodyLine::Malformed(text) => diagnostics.push(
                Diagnostic::new(
                    RuleId::MalformedLine,
                    format!("'{}' is outside any section", text.text.trim()),
                )
                .with_line(text.number),
            ),
            BodyLine::Attribute(entry) => diagnostics.push(
                Diagnostic::new(
                    RuleId::UnknownAttribute,
                    format!("{} appears before the first section and belongs to no object", entry.key()),
                )
                .with_attribute(entry.key())
                .with_line(entry.line_number()),
            ),
            BodyLine::Comment(_) | BodyLine::Blank(_) => {}
        }
    }

    for (position, section) in document.sections().iter().enumerate() {
        match section {
            Section::Unclassified(raw) => {
                diagnostics.extend(unclassified(raw, position, set));
            }
            Section::Object(object) => {
                if let Some(schema) = set.get(object.type_name()) {
                    check_object(object, position, schema, &mut diagnostics);
                }
            }
        }
    }
    diagnostics
}

fn unclassified(raw: &RawSection, position: usize, set: &SchemaSet) -> Option<Diagnostic> {
    let message = match classify_header(raw.name(), set) {
        HeaderClass::Object { .. } => return None,
        HeaderClass::InvalidName { reason } => reason,
        HeaderClass::UnknownType { type_name } => match suggest_type(set, &type_name) {
            Some(suggestion) => format!(
                "unknown object type {type_name}; did you mean {suggestion}? section kept as is"
            ),
            None => format!("unknown object type {type_name}; section kept as is"),
        },
        HeaderClass::ShapeMismatch {
            type_name,
            expected,
        } => format!(
            "{type_name} sections use the {} identifier form; section kept as is",
            match expected {
                IdShape::Singleton => "singleton",
                IdShape::Indexed => "indexed",
                IdShape::Nested => "nested",
            }
        ),
    };
    Some(
        Diagnostic::new(RuleId::UnclassifiedSection, message)
            .with_object(ObjectRef {
                name: raw.name().to_string(),
                handle: None,
                position: Some(position),
            })
            .with_line(raw.header.number),
    )
}

fn check_object(
    object: &OrganObject,
    position: usize,
    schema: &ObjectSchema,
    out: &mut Vec<Diagnostic>,
) {
    let at = || ObjectRef::of(object, position);

    if let Some(index) = object.id().index
        && !schema.id_range_allows(index)
    {
        out.push(
            Diagnostic::new(
                RuleId::InvalidIdentifier,
                format!("{} objects are numbered from 001", schema.name),
            )
            .with_object(at())
            .with_line(object.header_line_number()),
        );
    }

    if let Some(id_attribute) = &schema.id_attribute
        && let Some(declared) = object.value(id_attribute)
        && object.id().index.is_some_and(|index| declared.parse::<u32>().ok() != Some(index))
    {
        out.push(
            Diagnostic::new(
                RuleId::IdentifierMismatch,
                format!(
                    "{id_attribute}={declared} disagrees with section {}; the section number is used",
                    object.label()
                ),
            )
            .with_object(at())
            .with_attribute(id_attribute.clone())
            .with_line(object.attribute(id_attribute).and_then(|e| e.line_number())),
        );
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for line in object.body() {
        let entry = match line {
            BodyLine::Attribute(entry) => entry,
            BodyLine::Malformed(text) => {
                out.push(
                    Diagnostic::new(
                        RuleId::MalformedLine,
                        format!("'{}' has no '='", text.text.trim()),
                    )
                    .with_object(at())
                    .with_line(text.number),
                );
                continue;
            }
            BodyLine::Comment(_) | BodyLine::Blank(_) => continue,
        };

        if !entry.is_known() {
            let message = match suggest(schema, entry.key()) {
                Some(suggestion) => format!(
                    "{} is not an attribute of {}; did you mean {suggestion}?",
                    entry.key(),
                    schema.name
                ),
                None => format!("{} is not an attribute of {}", entry.key(), schema.name),
            };
            out.push(
                Diagnostic::new(RuleId::UnknownAttribute, message)
                    .with_object(at())
                    .with_attribute(entry.key())
                    .with_line(entry.line_number()),
            );
            continue;
        }

        if !seen.insert(entry.name()) {
            out.push(
                Diagnostic::new(
                    RuleId::DuplicateAttribute,
                    format!("{} is set more than once; the first value is used", entry.name()),
                )
                .with_object(at())
                .with_attribute(entry.name())
                .with_line(entry.line_number()),
            );
            continue;
        }

        if let TypedValue::Invalid { reason } = entry.typed() {
            out.push(
                Diagnostic::new(RuleId::TypeMismatch, reason.clone())
                    .with_object(at())
                    .with_attribute(entry.name())
                    .with_line(entry.line_number()),
            );
        }
    }
}

/// Closest known spelling of an unknown key.
pub fn suggest(schema: &ObjectSchema, key: &str) -> Option<String> {
    closest(key, schema.attributes().iter().map(|def| def.spelling(&[1, 1])))
}

/// Closest object type of `set` to an unknown type name.
pub fn suggest_type(set: &SchemaSet, type_name: &str) -> Option<String> {
    closest(type_name, set.types().map(|schema| schema.name.clone()))
}

fn closest(word: &str, candidates: impl Iterator<Item = String>) -> Option<String> {
    let probe = word.to_ascii_lowercase();
    candidates
        .map(|candidate| {
            let score = jaro_winkler::similarity(
                probe.chars(),
                candidate.to_ascii_lowercase().chars(),
            );
            (candidate, score)
        })
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate)
}
