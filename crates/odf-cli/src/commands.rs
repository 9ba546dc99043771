use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use odf_core::Session;
use odf_ingest::parse_bytes;
use odf_map::ConversionOptions;
use odf_model::{AttributeEntry, Document, Section, TypedValue};
use odf_output::serialize_to_bytes;
use odf_standards::{IdShape, ObjectSchema, SchemaRegistry, SchemaSet};
use odf_validate::ValidationOptions;
use tracing::{info, info_span};

use crate::types::{
    AttributeSummary, AttributeView, CheckResult, ConvertResult, ObjectView, RoundtripResult,
    TypeDetail, TypeListing, TypeSummary,
};

/// Loads and validates one organ definition.
pub fn run_check(path: &Path, samples: Option<&Path>) -> Result<CheckResult> {
    let span = info_span!("check", path = %path.display());
    let _guard = span.enter();
    let start = Instant::now();

    let mut options = ValidationOptions::new();
    if let Some(dir) = samples {
        options = options.with_sample_dir(dir);
    }
    let session = Session::open(path)
        .with_context(|| format!("open {}", path.display()))?
        .with_validation_options(options);
    let report = session.validate();
    let document = session.document();
    let unclassified_sections = document
        .sections()
        .iter()
        .filter(|section| matches!(section, Section::Unclassified(_)))
        .count();

    let result = CheckResult {
        path: path.to_path_buf(),
        encoding: document.encoding(),
        objects_by_type: count_by_type(document),
        unclassified_sections,
        report,
    };
    info!(
        objects = result.object_count(),
        errors = result.report.error_count(),
        warnings = result.report.warning_count(),
        duration_ms = start.elapsed().as_millis(),
        "check complete"
    );
    Ok(result)
}

/// Parses and re-serializes a file without edits and compares the bytes.
pub fn run_roundtrip(path: &Path) -> Result<RoundtripResult> {
    let span = info_span!("roundtrip", path = %path.display());
    let _guard = span.enter();

    let original = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let registry = SchemaRegistry::bundled().context("load schema registry")?;
    let outcome = parse_bytes(&original, registry.odf());
    let written = serialize_to_bytes(&outcome.document).context("encode document")?;

    let first_difference = first_difference(&original, &written);
    info!(bytes = original.len(), identical = first_difference.is_none(), "roundtrip complete");
    Ok(RoundtripResult {
        path: path.to_path_buf(),
        bytes: original.len(),
        first_difference,
    })
}

fn first_difference(original: &[u8], written: &[u8]) -> Option<usize> {
    if original == written {
        return None;
    }
    let offset = original
        .iter()
        .zip(written)
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| original.len().min(written.len()));
    let line = original[..offset].iter().filter(|&&b| b == b'\n').count() + 1;
    Some(line)
}

/// Converts a Hauptwerk descriptor, validates the result and writes it.
pub fn run_convert(input: &Path, output: &Path, organ_name: Option<&str>) -> Result<ConvertResult> {
    let span = info_span!("convert", input = %input.display(), output = %output.display());
    let _guard = span.enter();
    let start = Instant::now();

    let mut options = ConversionOptions::new();
    if let Some(name) = organ_name {
        options = options.with_organ_name(name);
    }
    let mut session =
        Session::convert(input, options).with_context(|| format!("convert {}", input.display()))?;
    let report = session.validate();
    session
        .save_as(output)
        .with_context(|| format!("write {}", output.display()))?;

    let result = ConvertResult {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        objects_by_type: count_by_type(session.document()),
        skipped: session.conversion_diagnostics().to_vec(),
        report,
    };
    info!(
        skipped = result.skipped.len(),
        errors = result.report.error_count(),
        duration_ms = start.elapsed().as_millis(),
        "conversion written"
    );
    Ok(result)
}

/// Lists the object types, or the attributes of one type.
pub fn run_types(type_name: Option<&str>) -> Result<TypeListing> {
    let set = SchemaRegistry::bundled().context("load schema registry")?.odf();
    let Some(type_name) = type_name else {
        let types = set
            .types()
            .map(|schema| TypeSummary {
                name: schema.name.clone(),
                shape: shape_name(schema.shape).to_string(),
                attributes: schema.attributes().len(),
                description: schema.description.clone(),
            })
            .collect();
        return Ok(TypeListing::All(types));
    };

    let schema = find_type(set, type_name)?;
    let attributes = schema
        .attributes()
        .iter()
        .map(|def| AttributeSummary {
            name: def.name.clone(),
            kind: def.kind.to_string(),
            requirement: def.requirement.to_string(),
            range: (!def.range.is_unbounded()).then(|| def.range.to_string()),
            default: def.default.clone(),
            aliases: def.aliases.clone(),
        })
        .collect();
    Ok(TypeListing::One(TypeDetail {
        name: schema.name.clone(),
        shape: shape_name(schema.shape).to_string(),
        id_attribute: schema.id_attribute.clone(),
        description: schema.description.clone(),
        attributes,
    }))
}

/// Objects of one type with their attributes and the places that point at
/// them.
pub fn run_show(path: &Path, type_name: &str) -> Result<Vec<ObjectView>> {
    let session = Session::open(path).with_context(|| format!("open {}", path.display()))?;
    let schema = find_type(session.schemas(), type_name)?;
    let document = session.document();

    let mut views = Vec::new();
    for object in session.objects_of_type(&schema.name) {
        let attributes = object
            .attributes()
            .map(|entry| AttributeView {
                key: entry.key().to_string(),
                value: entry.value().to_string(),
                note: note_for(entry, document),
            })
            .collect();
        let referrers = session
            .referrers(object.handle())?
            .iter()
            .map(|site| {
                let from = document
                    .object(site.from)
                    .map_or_else(|| site.from.to_string(), |o| o.label());
                format!("{from}.{}", site.attribute)
            })
            .collect();
        views.push(ObjectView {
            label: object.label(),
            attributes,
            referrers,
        });
    }
    Ok(views)
}

fn note_for(entry: &AttributeEntry, document: &Document) -> Option<String> {
    match entry.typed() {
        TypedValue::Invalid { reason } => Some(reason.clone()),
        TypedValue::Opaque => Some("unknown attribute".to_string()),
        TypedValue::Code { label: Some(label) } => Some(label.clone()),
        TypedValue::Reference(reference) => Some(
            document
                .resolve(&reference.target, reference.id)
                .map_or_else(|| format!("missing {}", reference.target), |o| o.label()),
        ),
        _ if entry.key() != entry.name() => Some(format!("alias of {}", entry.name())),
        _ => None,
    }
}

fn find_type<'a>(set: &'a SchemaSet, name: &str) -> Result<&'a ObjectSchema> {
    set.get(name)
        .or_else(|| set.types().find(|schema| schema.name.eq_ignore_ascii_case(name)))
        .ok_or_else(|| anyhow!("unknown object type '{name}' (see `odfedit types`)"))
}

fn count_by_type(document: &Document) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for object in document.objects() {
        *counts.entry(object.type_name().to_string()).or_insert(0) += 1;
    }
    counts
}

fn shape_name(shape: IdShape) -> &'static str {
    match shape {
        IdShape::Singleton => "singleton",
        IdShape::Indexed => "indexed",
        IdShape::Nested => "nested",
    }
}
