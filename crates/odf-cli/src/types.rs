use std::collections::BTreeMap;
use std::path::PathBuf;

use odf_model::{Diagnostic, DiagnosticReport, TextEncoding};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub path: PathBuf,
    pub encoding: TextEncoding,
    pub objects_by_type: BTreeMap<String, usize>,
    pub unclassified_sections: usize,
    pub report: DiagnosticReport,
}

impl CheckResult {
    pub fn object_count(&self) -> usize {
        self.objects_by_type.values().sum()
    }

    pub fn has_errors(&self) -> bool {
        self.report.has_errors()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundtripResult {
    pub path: PathBuf,
    pub bytes: usize,
    /// 1-based line of the first byte that came back different.
    pub first_difference: Option<usize>,
}

impl RoundtripResult {
    pub fn is_identical(&self) -> bool {
        self.first_difference.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConvertResult {
    pub input: PathBuf,
    pub output: PathBuf,
    pub objects_by_type: BTreeMap<String, usize>,
    /// Foreign objects left out of the output.
    pub skipped: Vec<Diagnostic>,
    /// Validation of the written document.
    pub report: DiagnosticReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeSummary {
    pub name: String,
    pub shape: String,
    pub attributes: usize,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeSummary {
    pub name: String,
    pub kind: String,
    pub requirement: String,
    pub range: Option<String>,
    pub default: Option<String>,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeDetail {
    pub name: String,
    pub shape: String,
    pub id_attribute: Option<String>,
    pub description: Option<String>,
    pub attributes: Vec<AttributeSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub enum TypeListing {
    All(Vec<TypeSummary>),
    One(TypeDetail),
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeView {
    pub key: String,
    pub value: String,
    /// Alias target, enumeration label or why the value does not parse.
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectView {
    pub label: String,
    pub attributes: Vec<AttributeView>,
    /// `Object.Attribute` sites pointing at this object.
    pub referrers: Vec<String>,
}
