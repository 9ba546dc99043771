use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::ObjectHandle;
use crate::object::OrganObject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        })
    }
}

/// Machine-checkable identifier of the rule that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RuleId {
    MalformedLine,
    UnclassifiedSection,
    UnknownAttribute,
    DuplicateAttribute,
    TypeMismatch,
    IdentifierMismatch,
    InvalidIdentifier,
    MissingRequiredAttribute,
    OutOfRangeValue,
    UnknownEnumCode,
    IndexBeyondCount,
    CountMismatch,
    PanelFormatMismatch,
    MissingFile,
    DanglingReference,
    DuplicateIdentifier,
    OrphanObject,
    ConversionSkipped,
}

impl RuleId {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleId::MalformedLine => "MalformedLine",
            RuleId::UnclassifiedSection => "UnclassifiedSection",
            RuleId::UnknownAttribute => "UnknownAttribute",
            RuleId::DuplicateAttribute => "DuplicateAttribute",
            RuleId::TypeMismatch => "TypeMismatch",
            RuleId::IdentifierMismatch => "IdentifierMismatch",
            RuleId::InvalidIdentifier => "InvalidIdentifier",
            RuleId::MissingRequiredAttribute => "MissingRequiredAttribute",
            RuleId::OutOfRangeValue => "OutOfRangeValue",
            RuleId::UnknownEnumCode => "UnknownEnumCode",
            RuleId::IndexBeyondCount => "IndexBeyondCount",
            RuleId::CountMismatch => "CountMismatch",
            RuleId::PanelFormatMismatch => "PanelFormatMismatch",
            RuleId::MissingFile => "MissingFile",
            RuleId::DanglingReference => "DanglingReference",
            RuleId::DuplicateIdentifier => "DuplicateIdentifier",
            RuleId::OrphanObject => "OrphanObject",
            RuleId::ConversionSkipped => "ConversionSkipped",
        }
    }

    pub fn default_severity(self) -> Severity {
        match self {
            RuleId::MalformedLine
            | RuleId::DuplicateAttribute
            | RuleId::TypeMismatch
            | RuleId::InvalidIdentifier
            | RuleId::MissingRequiredAttribute
            | RuleId::OutOfRangeValue
            | RuleId::CountMismatch
            | RuleId::DanglingReference
            | RuleId::DuplicateIdentifier => Severity::Error,
            RuleId::UnclassifiedSection
            | RuleId::UnknownAttribute
            | RuleId::IdentifierMismatch
            | RuleId::UnknownEnumCode
            | RuleId::IndexBeyondCount
            | RuleId::PanelFormatMismatch
            | RuleId::MissingFile
            | RuleId::OrphanObject
            | RuleId::ConversionSkipped => Severity::Warning,
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The object a diagnostic is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Section name, or a descriptive name for foreign objects.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<ObjectHandle>,
    /// Section position in the document at the time of the check.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

impl ObjectRef {
    pub fn of(object: &OrganObject, position: usize) -> Self {
        Self {
            name: object.label(),
            handle: Some(object.handle()),
            position: Some(position),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handle: None,
            position: None,
        }
    }
}

/// One finding of the builder, validator or converter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub rule: RuleId,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(rule: RuleId, message: impl Into<String>) -> Self {
        Self {
            rule,
            severity: rule.default_severity(),
            object: None,
            attribute: None,
            line: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn with_object(mut self, object: ObjectRef) -> Self {
        self.object = Some(object);
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    #[must_use]
    pub fn with_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn position(&self) -> Option<usize> {
        self.object.as_ref().and_then(|object| object.position)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.severity, self.rule)?;
        match (&self.object, &self.attribute) {
            (Some(object), Some(attribute)) => write!(f, " {}.{}", object.name, attribute)?,
            (Some(object), None) => write!(f, " {}", object.name)?,
            (None, Some(attribute)) => write!(f, " {attribute}")?,
            (None, None) => {}
        }
        if let Some(line) = self.line {
            write!(f, " (line {line})")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Ordered diagnostics of one validation or conversion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticReport {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn with_rule(&self, rule: RuleId) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.rule == rule)
    }

    pub fn counts_by_rule(&self) -> BTreeMap<RuleId, usize> {
        let mut counts = BTreeMap::new();
        for diagnostic in &self.diagnostics {
            *counts.entry(diagnostic.rule).or_insert(0) += 1;
        }
        counts
    }

    /// Diagnostics grouped by object name; document-level ones under `None`.
    pub fn grouped_by_object(&self) -> Vec<(Option<&str>, Vec<&Diagnostic>)> {
        let mut groups: Vec<(Option<&str>, Vec<&Diagnostic>)> = Vec::new();
        for diagnostic in &self.diagnostics {
            let key = diagnostic.object.as_ref().map(|o| o.name.as_str());
            match groups.iter_mut().find(|(name, _)| *name == key) {
                Some((_, items)) => items.push(diagnostic),
                None => groups.push((key, vec![diagnostic])),
            }
        }
        groups
    }
}

impl<'a> IntoIterator for &'a DiagnosticReport {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}
