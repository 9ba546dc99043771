//! One open organ definition and the edits made to it.
//!
//! A session owns its [`Document`] and borrows the process-wide schema
//! registry. Edits never fail on semantic grounds: a value that does not fit
//! its attribute is stored as written and shows up in the next
//! [`Session::validate`] report. Only structural misuse (an unknown handle,
//! a section name the format cannot express, a second object with the same
//! identifier) is refused.

use std::path::{Path, PathBuf};
use std::time::Instant;

use odf_ingest::{
    HeaderClass, classify_header, fill_required_defaults, insert_in_schema_order, make_entry,
    parse_str, read_file, type_value,
};
use odf_map::{ConversionOptions, Converter};
use odf_model::{
    AttributeEntry, Diagnostic, DiagnosticReport, Document, LineEnding, ObjectHandle, ObjectId,
    OrganObject, ReferenceSite, SectionName, TextEncoding,
};
use odf_output::{serialize_to_bytes, serialize_to_string, write_file};
use odf_standards::{IdShape, ObjectSchema, PanelFormat, SchemaRegistry, SchemaSet};
use odf_validate::{ValidationOptions, Validator};
use tracing::{debug, info, info_span, warn};

use crate::error::SessionError;

#[derive(Debug, Clone)]
pub struct Session {
    registry: &'static SchemaRegistry,
    document: Document,
    path: Option<PathBuf>,
    validation: ValidationOptions,
    conversion_diagnostics: Vec<Diagnostic>,
    modified: bool,
}

impl Session {
    fn with_document(registry: &'static SchemaRegistry, document: Document) -> Self {
        Self {
            registry,
            document,
            path: None,
            validation: ValidationOptions::default(),
            conversion_diagnostics: Vec::new(),
            modified: false,
        }
    }

    /// Reads an organ definition file with the bundled schema registry.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        Self::open_with(path, SchemaRegistry::bundled()?)
    }

    pub fn open_with(
        path: impl AsRef<Path>,
        registry: &'static SchemaRegistry,
    ) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let outcome = read_file(path, registry.odf())?;
        let mut session = Self::with_document(registry, outcome.document);
        session.path = Some(path.to_path_buf());
        Ok(session)
    }

    /// Builds a session from text that has no file behind it yet.
    pub fn from_text(text: &str) -> Result<Self, SessionError> {
        let registry = SchemaRegistry::bundled()?;
        let outcome = parse_str(text, registry.odf());
        Ok(Self::with_document(registry, outcome.document))
    }

    /// An empty document, written as UTF-8 with BOM and CRLF line ends.
    pub fn new_empty() -> Result<Self, SessionError> {
        let registry = SchemaRegistry::bundled()?;
        let document = Document::new(TextEncoding::Utf8 { bom: true }, LineEnding::CrLf);
        Ok(Self::with_document(registry, document))
    }

    /// Converts a Hauptwerk sample-set descriptor into a new, unsaved
    /// document. Objects the converter skipped are listed in
    /// [`Session::conversion_diagnostics`].
    pub fn convert(path: impl AsRef<Path>, options: ConversionOptions) -> Result<Self, SessionError> {
        let registry = SchemaRegistry::bundled()?;
        let conversion = Converter::new(registry)
            .with_options(options)
            .convert_file(path.as_ref())?;
        let mut session = Self::with_document(registry, conversion.document);
        session.conversion_diagnostics = conversion.diagnostics;
        session.modified = true;
        Ok(session)
    }

    #[must_use]
    pub fn with_validation_options(mut self, options: ValidationOptions) -> Self {
        self.validation = options;
        self
    }

    pub fn registry(&self) -> &'static SchemaRegistry {
        self.registry
    }

    pub fn schemas(&self) -> &'static SchemaSet {
        self.registry.odf()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// True once an edit has been made since the last load or save.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn conversion_diagnostics(&self) -> &[Diagnostic] {
        &self.conversion_diagnostics
    }

    pub fn objects_of_type<'a>(
        &'a self,
        type_name: &str,
    ) -> impl Iterator<Item = &'a OrganObject> {
        self.document.objects_of_type(type_name)
    }

    pub fn object(&self, type_name: &str, id: ObjectId) -> Option<&OrganObject> {
        self.document.resolve(type_name, id)
    }

    /// Looks an object up by its section name, e.g. `Stop003` or
    /// `Panel001Element002`.
    pub fn find(&self, section: &str) -> Option<&OrganObject> {
        let name = SectionName::parse(section).ok()?;
        self.document.resolve(name.type_name(), name.id())
    }

    pub fn object_by_handle(&self, handle: ObjectHandle) -> Result<&OrganObject, SessionError> {
        self.document
            .object(handle)
            .ok_or(SessionError::UnknownObject { handle })
    }

    /// The entry an attribute name refers to. Aliases and template
    /// instances (`Pipe012Release002`) are accepted.
    pub fn attribute(&self, handle: ObjectHandle, name: &str) -> Result<Option<&AttributeEntry>, SessionError> {
        let object = self.object_by_handle(handle)?;
        let lookup = self
            .schema_of(object)?
            .resolve_key(name)
            .map(|matched| matched.canonical());
        Ok(object.attribute(lookup.as_deref().unwrap_or(name)))
    }

    /// Sets `name` to `value`, keeping the key spelling already in the
    /// document. A new attribute is inserted at its schema position.
    pub fn set_attribute(&mut self, handle: ObjectHandle, name: &str, value: &str) -> Result<(), SessionError> {
        if value.contains(['\n', '\r']) {
            return Err(SessionError::MultilineValue {
                name: name.to_string(),
            });
        }
        let set = self.registry.odf();
        let object = self.object_by_handle(handle)?;
        let schema = self.schema_of(object)?;
        let canonical = schema.resolve_key(name).map(|matched| matched.canonical());
        let lookup = canonical.clone().unwrap_or_else(|| name.to_string());
        let existing_key = object.attribute(&lookup).map(|entry| entry.key().to_string());
        let label = object.label();

        let object = self
            .document
            .object_mut(handle)
            .ok_or(SessionError::UnknownObject { handle })?;
        match (existing_key, canonical) {
            (Some(key), _) => {
                let (_, typed) = type_value(schema, set, &key, value);
                object.set_value(&lookup, value, typed);
                debug!(object = %label, attribute = %key, "changed attribute");
            }
            (None, Some(canonical)) => {
                let entry = make_entry(schema, set, &canonical, value);
                insert_in_schema_order(object, schema, entry);
                debug!(object = %label, attribute = %canonical, "added attribute");
            }
            (None, None) => {
                return Err(SessionError::UnknownAttribute {
                    object: label,
                    name: name.to_string(),
                });
            }
        }
        self.modified = true;
        Ok(())
    }

    /// Removes every entry for `name` and returns them.
    pub fn remove_attribute(&mut self, handle: ObjectHandle, name: &str) -> Result<Vec<AttributeEntry>, SessionError> {
        let object = self.object_by_handle(handle)?;
        let lookup = self
            .schema_of(object)?
            .resolve_key(name)
            .map_or_else(|| name.to_string(), |matched| matched.canonical());
        let label = object.label();

        let removed = self
            .document
            .object_mut(handle)
            .ok_or(SessionError::UnknownObject { handle })?
            .remove_attribute(&lookup);
        if removed.is_empty() {
            return Err(SessionError::UnknownAttribute {
                object: label,
                name: name.to_string(),
            });
        }
        debug!(object = %label, attribute = %lookup, entries = removed.len(), "removed attribute");
        self.modified = true;
        Ok(removed)
    }

    /// Creates the object named `section` (`Stop004`, `Panel001Element003`)
    /// next to the objects of its type, filled with the required attributes
    /// that have defaults.
    pub fn add_object(&mut self, section: &str) -> Result<ObjectHandle, SessionError> {
        let set = self.registry.odf();
        let invalid = |reason: String| SessionError::InvalidSection {
            name: section.to_string(),
            reason,
        };
        let (name, schema) = match classify_header(section, set) {
            HeaderClass::Object { name, schema } => (name, schema),
            HeaderClass::InvalidName { reason } => return Err(invalid(reason)),
            HeaderClass::UnknownType { type_name } => {
                return Err(invalid(format!("unknown object type {type_name}")));
            }
            HeaderClass::ShapeMismatch {
                type_name,
                expected,
            } => return Err(invalid(shape_hint(&type_name, expected))),
        };
        if let Some(index) = name.id().index
            && !schema.id_range_allows(index)
        {
            return Err(invalid(format!("{} objects cannot have index 000", schema.name)));
        }
        if self.document.resolve(name.type_name(), name.id()).is_some() {
            return Err(SessionError::DuplicateObject {
                name: name.canonical(),
            });
        }

        let position = self.insertion_point(name.type_name(), name.id());
        let label = name.canonical();
        let mut object = OrganObject::new(name);
        let defaults = fill_required_defaults(
            &mut object,
            schema,
            set,
            PanelFormat::detect(&self.document),
        );
        let handle = self.document.insert_object(position, object);
        debug!(object = %label, position, defaults = defaults.len(), "added object");
        self.modified = true;
        Ok(handle)
    }

    /// Section position right after the last object of the same type with a
    /// lower identifier; new types go to the end.
    fn insertion_point(&self, type_name: &str, id: ObjectId) -> usize {
        let mut after = None;
        let mut first_of_type = None;
        for (position, object) in self.document.positioned_objects() {
            if object.type_name() != type_name {
                continue;
            }
            first_of_type.get_or_insert(position);
            if object.id() < id {
                after = Some(position + 1);
            }
        }
        after
            .or(first_of_type)
            .unwrap_or(self.document.sections().len())
    }

    /// Removes an object. References to it are left in place and become
    /// dangling-reference findings.
    pub fn remove_object(&mut self, handle: ObjectHandle) -> Result<OrganObject, SessionError> {
        let dangling = self.referrers(handle)?.len();
        let object = self.document.remove_object(handle)?;
        if dangling > 0 {
            warn!(object = %object.label(), referrers = dangling, "removed object is still referenced");
        }
        self.modified = true;
        Ok(object)
    }

    /// Moves an object to section `position`.
    pub fn move_object(&mut self, handle: ObjectHandle, position: usize) -> Result<(), SessionError> {
        self.document.move_object(handle, position)?;
        self.modified = true;
        Ok(())
    }

    /// Attributes of other objects that point at this one.
    pub fn referrers(&self, handle: ObjectHandle) -> Result<&[ReferenceSite], SessionError> {
        let object = self.object_by_handle(handle)?;
        Ok(self.document.referrers(object.type_name(), object.id()))
    }

    /// Full diagnostic report for the current document state.
    pub fn validate(&self) -> DiagnosticReport {
        Validator::new(self.registry.odf())
            .with_options(self.validation.clone())
            .run(&self.document)
    }

    pub fn serialize(&self) -> String {
        serialize_to_string(&self.document)
    }

    pub fn serialize_to_bytes(&self) -> Result<Vec<u8>, SessionError> {
        Ok(serialize_to_bytes(&self.document)?)
    }

    /// Writes the document back to the file it came from.
    pub fn save(&mut self) -> Result<(), SessionError> {
        let path = self.path.clone().ok_or(SessionError::NoPath)?;
        self.write(&path)
    }

    /// Writes the document to `path`, which becomes the session's file.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        self.write(path)?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn write(&mut self, path: &Path) -> Result<(), SessionError> {
        let span = info_span!("save_session", path = %path.display());
        let _guard = span.enter();
        let start = Instant::now();

        write_file(&self.document, path)?;
        self.modified = false;
        info!(
            objects = self.document.object_count(),
            duration_ms = start.elapsed().as_millis(),
            "saved organ definition"
        );
        Ok(())
    }

    fn schema_of(&self, object: &OrganObject) -> Result<&'static ObjectSchema, SessionError> {
        Ok(self.registry.odf().schema_for(object.type_name())?)
    }
}

fn shape_hint(type_name: &str, expected: IdShape) -> String {
    match expected {
        IdShape::Singleton => format!("[{type_name}] takes no number"),
        IdShape::Indexed => format!("{type_name} takes one three-digit number, e.g. {type_name}001"),
        IdShape::Nested => format!("{type_name} needs a parent number and an index"),
    }
}
