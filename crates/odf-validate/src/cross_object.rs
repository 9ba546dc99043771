//! Rules that look across objects: reference resolution, identifier
//! collisions, population counts, panel layout affinity and orphans.

use std::collections::BTreeSet;

use odf_model::{Diagnostic, Document, ObjectRef, OrganObject, RuleId, Section, SectionName};
use odf_standards::{ObjectSchema, PanelFormat, SchemaSet};
use tracing::debug;

pub(crate) fn check(
    document: &Document,
    set: &SchemaSet,
    panel_format: PanelFormat,
    check_orphans: bool,
    out: &mut Vec<Diagnostic>,
) {
    dangling_references(document, out);
    duplicate_identifiers(document, out);

    let present: BTreeSet<&str> = document.objects().map(OrganObject::type_name).collect();
    for (position, object) in document.positioned_objects() {
        let Some(schema) = set.get(object.type_name()) else {
            continue;
        };
        let at = || ObjectRef::of(object, position);
        counts(document, object, position, schema, out);
        if let Some(expected) = schema.panel_format
            && expected != panel_format
        {
            out.push(
                Diagnostic::new(
                    RuleId::PanelFormatMismatch,
                    format!(
                        "{} belongs to the {} panel layout but the document uses the {} layout",
                        schema.name,
                        expected.as_str(),
                        panel_format.as_str()
                    ),
                )
                .with_object(at())
                .with_line(object.header_line_number()),
            );
        }
        if check_orphans && is_orphan(document, object, schema, &present) {
            out.push(
                Diagnostic::new(
                    RuleId::OrphanObject,
                    format!(
                        "not referenced by any {}",
                        schema.orphan_if_unreferenced_by.join(" or ")
                    ),
                )
                .with_object(at())
                .with_line(object.header_line_number()),
            );
        }
    }
}

fn dangling_references(document: &Document, out: &mut Vec<Diagnostic>) {
    for (position, object) in document.positioned_objects() {
        for entry in object.attributes() {
            for (target, id) in entry.typed().targets() {
                if document.resolve(target, id).is_some() {
                    continue;
                }
                let missing = SectionName::new(target, id).canonical();
                out.push(
                    Diagnostic::new(
                        RuleId::DanglingReference,
                        format!("{}={} points at missing [{missing}]", entry.key(), entry.value()),
                    )
                    .with_object(ObjectRef::of(object, position))
                    .with_attribute(entry.name())
                    .with_line(entry.line_number()),
                );
            }
        }
    }
}

fn duplicate_identifiers(document: &Document, out: &mut Vec<Diagnostic>) {
    let sections = document.sections();
    for collision in document.index().collisions() {
        let (Some(Section::Object(first)), Some(Section::Object(duplicate))) =
            (sections.get(collision.first), sections.get(collision.duplicate))
        else {
            continue;
        };
        let message = format!(
            "{} has the same identifier as {}",
            located(duplicate),
            located(first)
        );
        debug!(object = %duplicate.label(), "identifier collision");
        out.push(
            Diagnostic::new(RuleId::DuplicateIdentifier, message)
                .with_object(ObjectRef::of(duplicate, collision.duplicate))
                .with_line(duplicate.header_line_number()),
        );
    }
}

fn located(object: &OrganObject) -> String {
    match object.header_line_number() {
        Some(line) => format!("[{}] (line {line})", object.label()),
        None => format!("[{}]", object.label()),
    }
}

fn counts(
    document: &Document,
    object: &OrganObject,
    position: usize,
    schema: &ObjectSchema,
    out: &mut Vec<Diagnostic>,
) {
    for def in schema.attributes() {
        let Some(counted) = &def.counts else {
            continue;
        };
        let entry = object.attribute(&def.name);
        let declared = match entry {
            Some(entry) => match entry.typed().as_integer() {
                Some(value) => value,
                // Unparsable counts are already a type mismatch.
                None => continue,
            },
            None => 0,
        };
        let parent = object.id().index;
        let actual = document
            .objects_of_type(counted)
            .filter(|candidate| {
                let id = candidate.id();
                let in_scope = match id.parent {
                    Some(owner) => Some(owner) == parent,
                    None => true,
                };
                in_scope && id.index.is_some_and(|index| index > 0)
            })
            .count() as i64;
        if declared != actual {
            out.push(
                Diagnostic::new(
                    RuleId::CountMismatch,
                    format!("{}={declared} but {actual} {counted} objects are defined", def.name),
                )
                .with_object(ObjectRef::of(object, position))
                .with_attribute(def.name.clone())
                .with_line(
                    entry
                        .and_then(|entry| entry.line_number())
                        .or(object.header_line_number()),
                ),
            );
        }
    }
}

/// An object is orphaned when a type expected to reference it is present
/// in the document but none of its objects does.
fn is_orphan(
    document: &Document,
    object: &OrganObject,
    schema: &ObjectSchema,
    present: &BTreeSet<&str>,
) -> bool {
    let expected = &schema.orphan_if_unreferenced_by;
    if !expected.iter().any(|name| present.contains(name.as_str())) {
        return false;
    }
    let sections = document.sections();
    !document
        .referrers(object.type_name(), object.id())
        .iter()
        .any(|site| match sections.get(site.position) {
            Some(Section::Object(from)) => expected.iter().any(|name| name == from.type_name()),
            _ => false,
        })
}
