//! Builds a [`SchemaSet`] from its TOML object file and CSV enum file.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::condition::{CompiledCondition, Condition, PanelFormat};
use crate::enums::parse_enum_csv;
use crate::error::StandardsError;
use crate::schema::{
    AttributeDef, IdShape, ObjectSchema, PLACEHOLDERS, Range, Requirement, Template, ValueKind,
};
use crate::set::SchemaSet;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSchemaFile {
    schema: String,
    #[serde(default)]
    short_codes: bool,
    #[serde(default)]
    groups: BTreeMap<String, Vec<RawAttribute>>,
    types: BTreeMap<String, RawType>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAttribute {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    kind: String,
    table: Option<String>,
    target: Option<String>,
    #[serde(default)]
    signed: bool,
    min: Option<f64>,
    max: Option<f64>,
    #[serde(default)]
    required: bool,
    required_if: Option<Condition>,
    default: Option<String>,
    counts: Option<String>,
    #[serde(default)]
    count: Vec<String>,
    indices: Option<[u32; 2]>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawType {
    shape: IdShape,
    id_attribute: Option<String>,
    #[serde(default)]
    allow_zero_index: bool,
    panel_format: Option<PanelFormat>,
    #[serde(default)]
    orphan_if_unreferenced_by: Vec<String>,
    description: Option<String>,
    #[serde(default)]
    include: Vec<RawInclude>,
    #[serde(default)]
    attributes: Vec<RawAttribute>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawInclude {
    group: String,
    when: Option<Condition>,
    /// Demotes every requirement of the group to optional.
    #[serde(default)]
    optional: bool,
}

/// Parses and cross-checks one schema set.
///
/// `inherited` supplies enumeration tables the set may use without defining
/// them itself.
pub fn load_schema_set(
    objects_path: &Path,
    objects_toml: &str,
    enums_path: &Path,
    enums_csv: &str,
    inherited: Option<&SchemaSet>,
) -> Result<SchemaSet, StandardsError> {
    let raw: RawSchemaFile = toml::from_str(objects_toml).map_err(|e| StandardsError::Toml {
        path: objects_path.to_path_buf(),
        source: e,
    })?;
    let enums = parse_enum_csv(enums_path, enums_csv)?;

    let mut types = BTreeMap::new();
    for (type_name, raw_type) in &raw.types {
        let schema = build_type(objects_path, &raw, type_name, raw_type)?;
        debug!(
            schema = %raw.schema,
            object_type = %type_name,
            attributes = schema.attributes().len(),
            "loaded object schema"
        );
        types.insert(type_name.clone(), schema);
    }

    let mut set = SchemaSet {
        name: raw.schema.clone(),
        types,
        enums,
    };
    if let Some(parent) = inherited {
        set.inherit_tables(parent);
    }
    check_links(objects_path, &set)?;
    Ok(set)
}

fn build_type(
    path: &Path,
    raw: &RawSchemaFile,
    type_name: &str,
    raw_type: &RawType,
) -> Result<ObjectSchema, StandardsError> {
    let mut merged: Vec<(RawAttribute, Requirement)> = Vec::new();

    for include in &raw_type.include {
        let group = raw.groups.get(&include.group).ok_or_else(|| {
            StandardsError::schema(
                path,
                format!("type {type_name} includes unknown group {}", include.group),
            )
        })?;
        for attribute in group {
            let mut requirement = requirement_of(attribute);
            if include.optional {
                requirement = Requirement::Optional;
            } else if let Some(when) = &include.when {
                requirement = gate(requirement, when);
            }
            merged.push((attribute.clone(), requirement));
        }
    }
    for attribute in &raw_type.attributes {
        merged.push((attribute.clone(), requirement_of(attribute)));
    }

    let mut attributes: Vec<AttributeDef> = Vec::new();
    let mut exact: HashMap<String, (usize, bool)> = HashMap::new();
    let mut templates = Vec::new();

    for (attribute, requirement) in merged {
        if attributes.iter().any(|def| def.name == attribute.name) {
            debug!(object_type = %type_name, attribute = %attribute.name, "skipping duplicate attribute from group");
            continue;
        }
        let position = attributes.len();
        let def = build_attribute(path, type_name, attribute, requirement, position, raw.short_codes)?;

        match &def.template {
            Some(template) => {
                let regex = template
                    .regex()
                    .map_err(|e| StandardsError::schema(path, e.to_string()))?;
                templates.push((regex, position, false));
                for alias in &def.aliases {
                    let alias_template = Template::parse(alias, Vec::new(), None).ok_or_else(|| {
                        StandardsError::schema(
                            path,
                            format!("alias {alias} of {}.{} has no placeholder", type_name, def.name),
                        )
                    })?;
                    let regex = alias_template
                        .regex()
                        .map_err(|e| StandardsError::schema(path, e.to_string()))?;
                    templates.push((regex, position, true));
                }
            }
            None => {
                exact.insert(def.name.clone(), (position, false));
                for alias in &def.aliases {
                    exact.entry(alias.clone()).or_insert((position, true));
                }
            }
        }
        if let Some(code) = &def.short_code {
            exact.entry(code.clone()).or_insert((position, true));
        }
        attributes.push(def);
    }

    if let Some(id_attribute) = &raw_type.id_attribute
        && !attributes.iter().any(|def| &def.name == id_attribute)
    {
        return Err(StandardsError::schema(
            path,
            format!("type {type_name} names unknown id attribute {id_attribute}"),
        ));
    }

    Ok(ObjectSchema {
        name: type_name.to_string(),
        shape: raw_type.shape,
        id_attribute: raw_type.id_attribute.clone(),
        allow_zero_index: raw_type.allow_zero_index,
        panel_format: raw_type.panel_format,
        orphan_if_unreferenced_by: raw_type.orphan_if_unreferenced_by.clone(),
        description: raw_type.description.clone(),
        attributes,
        exact,
        templates,
    })
}

fn requirement_of(attribute: &RawAttribute) -> Requirement {
    match (&attribute.required_if, attribute.required) {
        (Some(condition), _) => Requirement::RequiredIf(CompiledCondition::new(condition.clone())),
        (None, true) => Requirement::Required,
        (None, false) => Requirement::Optional,
    }
}

/// Restricts a requirement to documents/objects where `when` holds.
fn gate(requirement: Requirement, when: &Condition) -> Requirement {
    match requirement {
        Requirement::Optional => Requirement::Optional,
        Requirement::Required => Requirement::RequiredIf(CompiledCondition::new(when.clone())),
        Requirement::RequiredIf(inner) => Requirement::RequiredIf(CompiledCondition::new(
            Condition::All {
                all: vec![when.clone(), inner.condition().clone()],
            },
        )),
    }
}

fn build_attribute(
    path: &Path,
    type_name: &str,
    raw: RawAttribute,
    requirement: Requirement,
    position: usize,
    short_codes: bool,
) -> Result<AttributeDef, StandardsError> {
    let invalid = |message: String| {
        StandardsError::schema(path, format!("{type_name}.{}: {message}", raw.name))
    };

    let kind = match raw.kind.as_str() {
        "integer" => ValueKind::Integer,
        "real" => ValueKind::Real,
        "boolean" => ValueKind::Boolean,
        "text" => ValueKind::Text,
        "file" => ValueKind::File,
        "colour" => ValueKind::Colour {
            table: raw.table.clone(),
        },
        "code" => ValueKind::Code {
            table: raw
                .table
                .clone()
                .ok_or_else(|| invalid("code attributes need a table".to_string()))?,
        },
        "reference" => ValueKind::Reference {
            target: raw
                .target
                .clone()
                .ok_or_else(|| invalid("reference attributes need a target".to_string()))?,
            signed: raw.signed,
        },
        "pipe-sample" => ValueKind::PipeSample,
        other => return Err(invalid(format!("unknown kind '{other}'"))),
    };

    let indices = raw.indices.map(|[low, high]| (low, high));
    let template = Template::parse(&raw.name, raw.count.clone(), indices);
    match &template {
        Some(template) if raw.count.len() > template.placeholders() => {
            return Err(invalid("more count attributes than placeholders".to_string()));
        }
        None if !raw.count.is_empty() || indices.is_some() => {
            return Err(invalid("count/indices given for a plain attribute".to_string()));
        }
        _ => {}
    }
    if PLACEHOLDERS.iter().any(|p| raw.name.matches(p).count() > 1) {
        return Err(invalid("placeholder used twice".to_string()));
    }

    Ok(AttributeDef {
        short_code: short_codes.then(|| short_code(position)),
        name: raw.name,
        aliases: raw.aliases,
        kind,
        range: Range {
            min: raw.min,
            max: raw.max,
        },
        requirement,
        default: raw.default,
        counts: raw.counts,
        template,
        description: raw.description,
        position,
    })
}

/// `0 -> a`, `25 -> z`, `26 -> aa`, `27 -> ab`, ...
pub fn short_code(position: usize) -> String {
    let mut n = position + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'a' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Every referenced table, target type and counted type must exist.
fn check_links(path: &Path, set: &SchemaSet) -> Result<(), StandardsError> {
    for schema in set.types() {
        for def in schema.attributes() {
            let missing = match &def.kind {
                ValueKind::Code { table } if set.enum_table(table).is_none() => {
                    Some(format!("enumeration table {table}"))
                }
                ValueKind::Colour { table: Some(table) } if set.enum_table(table).is_none() => {
                    Some(format!("enumeration table {table}"))
                }
                ValueKind::Reference { target, .. } if set.get(target).is_none() => {
                    Some(format!("object type {target}"))
                }
                _ => None,
            };
            let missing = missing.or_else(|| {
                def.counts
                    .as_ref()
                    .filter(|counted| set.get(counted).is_none())
                    .map(|counted| format!("counted object type {counted}"))
            });
            if let Some(missing) = missing {
                return Err(StandardsError::schema(
                    path,
                    format!("{}.{} refers to unknown {missing}", schema.name, def.name),
                ));
            }
        }
        for other in &schema.orphan_if_unreferenced_by {
            if set.get(other).is_none() {
                return Err(StandardsError::schema(
                    path,
                    format!("{} expects references from unknown type {other}", schema.name),
                ));
            }
        }
    }
    Ok(())
}
