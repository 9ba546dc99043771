use std::cell::OnceCell;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::ids::{ObjectHandle, ObjectId};
use crate::index::{CrossRefIndex, ReferenceSite};
use crate::line::{LineEnding, TextLine};
use crate::object::{BodyLine, OrganObject};

/// Character encoding a document was read with; reused when writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    Utf8 { bom: bool },
    Latin1,
}

impl Default for TextEncoding {
    fn default() -> Self {
        TextEncoding::Utf8 { bom: true }
    }
}

/// A section whose name matched no object type. Written back untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSection {
    pub header: TextLine,
    pub lines: Vec<TextLine>,
}

impl RawSection {
    pub fn name(&self) -> &str {
        self.header
            .text
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Object(OrganObject),
    Unclassified(RawSection),
}

impl Section {
    pub fn as_object(&self) -> Option<&OrganObject> {
        match self {
            Section::Object(object) => Some(object),
            Section::Unclassified(_) => None,
        }
    }
}

/// An organ definition: preamble lines plus sections in document order.
#[derive(Debug, Clone)]
pub struct Document {
    encoding: TextEncoding,
    newline: LineEnding,
    preamble: Vec<BodyLine>,
    sections: Vec<Section>,
    next_handle: u32,
    index: OnceCell<CrossRefIndex>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(TextEncoding::default(), LineEnding::default())
    }
}

impl Document {
    pub fn new(encoding: TextEncoding, newline: LineEnding) -> Self {
        Self {
            encoding,
            newline,
            preamble: Vec::new(),
            sections: Vec::new(),
            next_handle: 1,
            index: OnceCell::new(),
        }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        self.encoding = encoding;
    }

    /// Terminator used for lines created by edits.
    pub fn newline(&self) -> LineEnding {
        self.newline
    }

    pub fn preamble(&self) -> &[BodyLine] {
        &self.preamble
    }

    pub fn push_preamble_line(&mut self, line: BodyLine) {
        self.preamble.push(line);
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn objects(&self) -> impl Iterator<Item = &OrganObject> {
        self.sections.iter().filter_map(Section::as_object)
    }

    /// Objects paired with their section position.
    pub fn positioned_objects(&self) -> impl Iterator<Item = (usize, &OrganObject)> {
        self.sections
            .iter()
            .enumerate()
            .filter_map(|(position, section)| section.as_object().map(|o| (position, o)))
    }

    pub fn objects_of_type<'a>(
        &'a self,
        type_name: &str,
    ) -> impl Iterator<Item = &'a OrganObject> {
        self.objects()
            .filter(move |object| object.type_name() == type_name)
    }

    pub fn object_count(&self) -> usize {
        self.objects().count()
    }

    pub fn position_of(&self, handle: ObjectHandle) -> Option<usize> {
        self.sections
            .iter()
            .position(|section| section.as_object().is_some_and(|o| o.handle() == handle))
    }

    pub fn object(&self, handle: ObjectHandle) -> Option<&OrganObject> {
        self.objects().find(|object| object.handle() == handle)
    }

    /// Mutable access to one object. Drops the index because attribute edits
    /// may change references.
    pub fn object_mut(&mut self, handle: ObjectHandle) -> Option<&mut OrganObject> {
        self.index.take();
        self.sections.iter_mut().find_map(|section| match section {
            Section::Object(object) if object.handle() == handle => Some(object),
            _ => None,
        })
    }

    /// Appends a section; returns the new handle for objects.
    pub fn push_section(&mut self, section: Section) -> Option<ObjectHandle> {
        let position = self.sections.len();
        self.insert_section(position, section)
    }

    pub fn push_object(&mut self, object: OrganObject) -> ObjectHandle {
        let position = self.sections.len();
        self.insert_object(position, object)
    }

    /// Inserts `object` at section `position` (clamped to the end).
    pub fn insert_object(&mut self, position: usize, mut object: OrganObject) -> ObjectHandle {
        let handle = self.allocate_handle();
        object.set_handle(handle);
        let position = position.min(self.sections.len());
        self.sections.insert(position, Section::Object(object));
        self.index.take();
        handle
    }

    fn insert_section(&mut self, position: usize, section: Section) -> Option<ObjectHandle> {
        match section {
            Section::Object(object) => Some(self.insert_object(position, object)),
            Section::Unclassified(raw) => {
                let position = position.min(self.sections.len());
                self.sections.insert(position, Section::Unclassified(raw));
                None
            }
        }
    }

    pub fn remove_object(&mut self, handle: ObjectHandle) -> Result<OrganObject, ModelError> {
        let position = self
            .position_of(handle)
            .ok_or(ModelError::UnknownObject { handle })?;
        self.index.take();
        match self.sections.remove(position) {
            Section::Object(object) => Ok(object),
            Section::Unclassified(_) => Err(ModelError::UnknownObject { handle }),
        }
    }

    /// Moves an object to section `position` of the resulting order.
    pub fn move_object(&mut self, handle: ObjectHandle, position: usize) -> Result<(), ModelError> {
        let len = self.sections.len();
        if position >= len {
            return Err(ModelError::PositionOutOfRange { position, len });
        }
        let from = self
            .position_of(handle)
            .ok_or(ModelError::UnknownObject { handle })?;
        let section = self.sections.remove(from);
        self.sections.insert(position, section);
        self.index.take();
        Ok(())
    }

    pub fn index(&self) -> &CrossRefIndex {
        self.index
            .get_or_init(|| CrossRefIndex::build(&self.sections))
    }

    pub fn resolve(&self, type_name: &str, id: ObjectId) -> Option<&OrganObject> {
        let position = self.index().lookup(type_name, id)?;
        self.sections.get(position).and_then(Section::as_object)
    }

    pub fn referrers(&self, type_name: &str, id: ObjectId) -> &[ReferenceSite] {
        self.index().referrers(type_name, id)
    }

    fn allocate_handle(&mut self) -> ObjectHandle {
        let handle = ObjectHandle::new(self.next_handle);
        self.next_handle += 1;
        handle
    }
}
