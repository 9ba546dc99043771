use std::borrow::Cow;

use crate::ids::{ObjectHandle, ObjectId, SectionName};
use crate::line::{LineEnding, TextLine};
use crate::value::TypedValue;

/// One `Key=Value` line of an object.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeEntry {
    key: String,
    canonical: Option<String>,
    value: String,
    typed: TypedValue,
    /// Verbatim source line while the entry is untouched.
    source: Option<TextLine>,
    ending: Option<LineEnding>,
}

impl AttributeEntry {
    /// A fresh entry created by an edit or by conversion.
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        canonical: Option<String>,
        typed: TypedValue,
    ) -> Self {
        Self {
            key: key.into(),
            canonical,
            value: value.into(),
            typed,
            source: None,
            ending: None,
        }
    }

    pub fn from_source(
        key: impl Into<String>,
        value: impl Into<String>,
        canonical: Option<String>,
        typed: TypedValue,
        line: TextLine,
    ) -> Self {
        let ending = Some(line.ending);
        Self {
            key: key.into(),
            canonical,
            value: value.into(),
            typed,
            source: Some(line),
            ending,
        }
    }

    /// Key spelling as it appears in the document.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn canonical(&self) -> Option<&str> {
        self.canonical.as_deref()
    }

    /// Canonical name, or the written key for attributes unknown to the schema.
    pub fn name(&self) -> &str {
        self.canonical.as_deref().unwrap_or(&self.key)
    }

    pub fn is_known(&self) -> bool {
        self.canonical.is_some()
    }

    /// Value text exactly as written after `=`.
    pub fn raw_value(&self) -> &str {
        &self.value
    }

    /// Value with surrounding whitespace removed.
    pub fn value(&self) -> &str {
        self.value.trim()
    }

    pub fn typed(&self) -> &TypedValue {
        &self.typed
    }

    pub fn source(&self) -> Option<&TextLine> {
        self.source.as_ref()
    }

    pub fn line_number(&self) -> Option<usize> {
        self.source.as_ref().and_then(|line| line.number)
    }

    pub fn is_edited(&self) -> bool {
        self.source.is_none()
    }

    /// Original terminator, if the entry came from source text.
    pub fn ending(&self) -> Option<LineEnding> {
        self.ending
    }

    pub fn set_value(&mut self, value: impl Into<String>, typed: TypedValue) {
        self.value = value.into();
        self.typed = typed;
        self.source = None;
    }

    /// Line text without terminator.
    pub fn render(&self) -> Cow<'_, str> {
        match &self.source {
            Some(line) => Cow::Borrowed(line.text.as_str()),
            None => Cow::Owned(format!("{}={}", self.key, self.value)),
        }
    }
}

/// A line inside a section body.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyLine {
    Attribute(AttributeEntry),
    Comment(TextLine),
    Blank(TextLine),
    /// Non-blank line without `=`; kept verbatim.
    Malformed(TextLine),
}

impl BodyLine {
    pub fn as_attribute(&self) -> Option<&AttributeEntry> {
        match self {
            BodyLine::Attribute(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, BodyLine::Blank(_))
    }
}

/// One schema-typed section of the document.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganObject {
    handle: ObjectHandle,
    name: SectionName,
    header: Option<TextLine>,
    header_ending: Option<LineEnding>,
    body: Vec<BodyLine>,
}

impl OrganObject {
    pub fn new(name: SectionName) -> Self {
        Self {
            handle: ObjectHandle::UNASSIGNED,
            name,
            header: None,
            header_ending: None,
            body: Vec::new(),
        }
    }

    pub fn from_source(name: SectionName, header: TextLine) -> Self {
        let header_ending = Some(header.ending);
        Self {
            handle: ObjectHandle::UNASSIGNED,
            name,
            header: Some(header),
            header_ending,
            body: Vec::new(),
        }
    }

    pub fn handle(&self) -> ObjectHandle {
        self.handle
    }

    pub(crate) fn set_handle(&mut self, handle: ObjectHandle) {
        self.handle = handle;
    }

    pub fn name(&self) -> &SectionName {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        self.name.type_name()
    }

    pub fn id(&self) -> ObjectId {
        self.name.id()
    }

    /// Section name as written in the source, or the canonical spelling.
    pub fn label(&self) -> String {
        match &self.header {
            Some(line) => line
                .text
                .trim()
                .trim_start_matches('[')
                .trim_end_matches(']')
                .to_string(),
            None => self.name.canonical(),
        }
    }

    pub fn header_source(&self) -> Option<&TextLine> {
        self.header.as_ref()
    }

    pub fn header_ending(&self) -> Option<LineEnding> {
        self.header_ending
    }

    pub fn header_line_number(&self) -> Option<usize> {
        self.header.as_ref().and_then(|line| line.number)
    }

    pub fn body(&self) -> &[BodyLine] {
        &self.body
    }

    pub fn push_line(&mut self, line: BodyLine) {
        self.body.push(line);
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeEntry> {
        self.body.iter().filter_map(BodyLine::as_attribute)
    }

    /// First entry whose canonical name (or key, if unknown) is `name`.
    pub fn attribute(&self, name: &str) -> Option<&AttributeEntry> {
        self.attributes().find(|entry| entry.name() == name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.attribute(name).map(AttributeEntry::value)
    }

    pub fn typed(&self, name: &str) -> Option<&TypedValue> {
        self.attribute(name).map(AttributeEntry::typed)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Replaces the value of the first entry named `name`. Returns `false`
    /// when the object has no such entry.
    pub fn set_value(&mut self, name: &str, value: &str, typed: TypedValue) -> bool {
        let entry = self.body.iter_mut().find_map(|line| match line {
            BodyLine::Attribute(entry) if entry.name() == name => Some(entry),
            _ => None,
        });
        match entry {
            Some(entry) => {
                entry.set_value(value, typed);
                true
            }
            None => false,
        }
    }

    /// Inserts `entry` right before the first entry named `before`, or after
    /// the last attribute line when `before` is `None` or absent.
    pub fn insert_attribute(&mut self, before: Option<&str>, entry: AttributeEntry) {
        let before_index = before.and_then(|name| {
            self.body
                .iter()
                .position(|line| line.as_attribute().is_some_and(|e| e.name() == name))
        });
        let index = before_index.unwrap_or_else(|| {
            self.body
                .iter()
                .rposition(|line| line.as_attribute().is_some())
                .map_or(0, |last| last + 1)
        });
        self.body.insert(index, BodyLine::Attribute(entry));
    }

    /// Removes every entry named `name` and returns them in body order.
    pub fn remove_attribute(&mut self, name: &str) -> Vec<AttributeEntry> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.body.len());
        for line in self.body.drain(..) {
            match line {
                BodyLine::Attribute(entry) if entry.name() == name => removed.push(entry),
                other => kept.push(other),
            }
        }
        self.body = kept;
        removed
    }
}
