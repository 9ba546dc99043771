#![deny(unsafe_code)]

use std::collections::HashMap;
use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::condition::{CompiledCondition, PanelFormat, PredicateContext};

/// How the numeric identifier of a type appears in its section name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdShape {
    /// `[Organ]`
    Singleton,
    /// `[Stop012]`
    Indexed,
    /// `[Panel001Element004]`
    Nested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Real,
    /// Exactly `Y` or `N`.
    Boolean,
    Text,
    File,
    /// A named colour from `table` or `#RRGGBB`.
    Colour { table: Option<String> },
    Code { table: String },
    Reference { target: String, signed: bool },
    /// `EMPTY`, `REF:mmm:sss:ppp` or a `.wav`/`.wv` path.
    PipeSample,
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::Real => "real",
            ValueKind::Boolean => "boolean",
            ValueKind::Text => "text",
            ValueKind::File => "file",
            ValueKind::Colour { .. } => "colour",
            ValueKind::Code { .. } => "code",
            ValueKind::Reference { .. } => "reference",
            ValueKind::PipeSample => "pipe-sample",
        }
    }

    pub fn is_file_like(&self) -> bool {
        matches!(self, ValueKind::File | ValueKind::PipeSample)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Code { table } => write!(f, "code({table})"),
            ValueKind::Reference { target, signed } => {
                write!(f, "reference({}{target})", if *signed { "±" } else { "" })
            }
            other => f.write_str(other.name()),
        }
    }
}

/// Inclusive numeric bounds; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |value: Option<f64>| value.map_or_else(|| "*".to_string(), |v| v.to_string());
        write!(f, "[{} - {}]", side(self.min), side(self.max))
    }
}

#[derive(Debug, Clone)]
pub enum Requirement {
    Optional,
    Required,
    RequiredIf(CompiledCondition),
}

impl Requirement {
    pub fn applies(&self, ctx: &PredicateContext<'_>) -> bool {
        match self {
            Requirement::Optional => false,
            Requirement::Required => true,
            Requirement::RequiredIf(condition) => condition.evaluate(ctx),
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Requirement::Optional)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Optional => f.write_str("optional"),
            Requirement::Required => f.write_str("required"),
            Requirement::RequiredIf(condition) => {
                write!(f, "required if {}", condition.condition())
            }
        }
    }
}

/// A templated attribute name such as `Pipe{n}Release{m}`.
#[derive(Debug, Clone)]
pub struct Template {
    /// Literal text around the placeholders; one more than `placeholders()`.
    segments: Vec<String>,
    /// Count attribute bounding each placeholder, in placeholder order. The
    /// names may themselves contain earlier placeholders.
    count: Vec<String>,
    /// Index range of placeholders without a count attribute.
    indices: (u32, u32),
}

pub(crate) const PLACEHOLDERS: [&str; 2] = ["{n}", "{m}"];

impl Template {
    /// Splits `name` at its placeholders. Returns `None` for plain names.
    pub(crate) fn parse(name: &str, count: Vec<String>, indices: Option<(u32, u32)>) -> Option<Self> {
        let mut segments = Vec::new();
        let mut rest = name;
        for placeholder in PLACEHOLDERS {
            match rest.split_once(placeholder) {
                Some((before, after)) => {
                    segments.push(before.to_string());
                    rest = after;
                }
                None => break,
            }
        }
        if segments.is_empty() {
            return None;
        }
        segments.push(rest.to_string());
        Some(Self {
            segments,
            count,
            indices: indices.unwrap_or((1, 999)),
        })
    }

    pub(crate) fn regex(&self) -> Result<Regex, regex::Error> {
        Self::regex_for(&self.segments)
    }

    pub(crate) fn regex_for(segments: &[String]) -> Result<Regex, regex::Error> {
        let body: Vec<String> = segments.iter().map(|s| regex::escape(s)).collect();
        Regex::new(&format!("^{}$", body.join(r"(\d{3})")))
    }

    pub fn placeholders(&self) -> usize {
        self.segments.len() - 1
    }

    /// Count attribute for placeholder `level`, with earlier indices filled in.
    pub fn count_attribute(&self, level: usize, indices: &[u32]) -> Option<String> {
        self.count
            .get(level)
            .map(|pattern| substitute(pattern, indices))
    }

    pub fn index_range(&self) -> (u32, u32) {
        self.indices
    }

    /// Attribute name for concrete indices, zero-padded to three digits.
    pub fn instantiate(&self, indices: &[u32]) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            out.push_str(segment);
            if i < self.placeholders() {
                let index = indices.get(i).copied().unwrap_or(0);
                out.push_str(&format!("{index:03}"));
            }
        }
        out
    }
}

/// Replaces `{n}`/`{m}` in `pattern` with the given indices.
pub(crate) fn substitute(pattern: &str, indices: &[u32]) -> String {
    let mut out = pattern.to_string();
    for (placeholder, index) in PLACEHOLDERS.iter().zip(indices) {
        out = out.replace(placeholder, &format!("{index:03}"));
    }
    out
}

#[derive(Debug, Clone)]
pub struct AttributeDef {
    /// Canonical name; templated names keep their `{n}` placeholders.
    pub name: String,
    pub aliases: Vec<String>,
    /// Compressed spelling used by foreign descriptors.
    pub short_code: Option<String>,
    pub kind: ValueKind,
    pub range: Range,
    pub requirement: Requirement,
    pub default: Option<String>,
    /// Object type whose population this attribute declares.
    pub counts: Option<String>,
    pub template: Option<Template>,
    pub description: Option<String>,
    /// Declaration position within the owning type.
    pub position: usize,
}

impl AttributeDef {
    pub fn is_template(&self) -> bool {
        self.template.is_some()
    }

    /// Concrete spelling for `indices` (the canonical name for plain attributes).
    pub fn spelling(&self, indices: &[u32]) -> String {
        match &self.template {
            Some(template) => template.instantiate(indices),
            None => self.name.clone(),
        }
    }
}

/// Result of resolving a written key against a type schema.
#[derive(Debug, Clone)]
pub struct AttributeMatch<'a> {
    pub def: &'a AttributeDef,
    /// Indices captured from a templated key, e.g. `[5, 2]` for `Pipe005Release002`.
    pub indices: Vec<u32>,
    pub via_alias: bool,
}

impl AttributeMatch<'_> {
    /// Canonical spelling of the matched key.
    pub fn canonical(&self) -> String {
        self.def.spelling(&self.indices)
    }
}

#[derive(Debug, Clone)]
pub struct ObjectSchema {
    pub name: String,
    pub shape: IdShape,
    pub id_attribute: Option<String>,
    pub allow_zero_index: bool,
    pub panel_format: Option<PanelFormat>,
    pub orphan_if_unreferenced_by: Vec<String>,
    pub description: Option<String>,
    pub(crate) attributes: Vec<AttributeDef>,
    pub(crate) exact: HashMap<String, (usize, bool)>,
    pub(crate) templates: Vec<(Regex, usize, bool)>,
}

impl ObjectSchema {
    /// Attributes in declaration order.
    pub fn attributes(&self) -> &[AttributeDef] {
        &self.attributes
    }

    /// Definition by canonical (possibly templated) name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|def| def.name == name)
    }

    /// Resolves a key as written (canonical, alias, short code or an
    /// instance of a template) to its definition.
    pub fn resolve_key(&self, key: &str) -> Option<AttributeMatch<'_>> {
        if let Some(&(index, via_alias)) = self.exact.get(key) {
            return Some(AttributeMatch {
                def: &self.attributes[index],
                indices: Vec::new(),
                via_alias,
            });
        }
        self.templates.iter().find_map(|(regex, index, via_alias)| {
            let captures = regex.captures(key)?;
            let indices = captures
                .iter()
                .skip(1)
                .map(|m| m.and_then(|m| m.as_str().parse::<u32>().ok()))
                .collect::<Option<Vec<u32>>>()?;
            Some(AttributeMatch {
                def: &self.attributes[*index],
                indices,
                via_alias: *via_alias,
            })
        })
    }

    /// Declaration position of a written key; unknown keys sort last.
    pub fn position_of(&self, key: &str) -> usize {
        self.resolve_key(key)
            .map_or(usize::MAX, |matched| matched.def.position)
    }

    pub fn id_range_allows(&self, index: u32) -> bool {
        index > 0 || self.allow_zero_index
    }

    pub fn references(&self) -> impl Iterator<Item = (&AttributeDef, &str)> {
        self.attributes.iter().filter_map(|def| match &def.kind {
            ValueKind::Reference { target, .. } => Some((def, target.as_str())),
            _ => None,
        })
    }
}
