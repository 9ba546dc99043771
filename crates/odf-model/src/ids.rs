#![deny(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Stable handle of an object inside one [`Document`](crate::Document).
///
/// Handles survive reordering and renaming; they are never reused within a
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectHandle(u32);

impl ObjectHandle {
    pub(crate) const UNASSIGNED: Self = Self(0);

    pub(crate) fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Numeric identity of an object within its type.
///
/// `[Organ]` has neither part, `[Stop012]` has an index, and
/// `[Panel001Element004]` has both a parent and an index.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ObjectId {
    pub parent: Option<u32>,
    pub index: Option<u32>,
}

impl ObjectId {
    pub const SINGLETON: Self = Self {
        parent: None,
        index: None,
    };

    pub fn indexed(index: u32) -> Self {
        Self {
            parent: None,
            index: Some(index),
        }
    }

    pub fn nested(parent: u32, index: u32) -> Self {
        Self {
            parent: Some(parent),
            index: Some(index),
        }
    }

    pub fn is_singleton(&self) -> bool {
        self.parent.is_none() && self.index.is_none()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.parent, self.index) {
            (None, None) => f.write_str("-"),
            (None, Some(index)) => write!(f, "{index:03}"),
            (Some(parent), Some(index)) => write!(f, "{parent:03}/{index:03}"),
            (Some(parent), None) => write!(f, "{parent:03}/-"),
        }
    }
}

/// A section name split into its type and identifier, e.g. `Panel001Element002`
/// is type `PanelElement` with id `001/002`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SectionName {
    parts: Vec<String>,
    type_name: String,
    id: ObjectId,
}

impl SectionName {
    /// Parses a bracket-less section name.
    ///
    /// The name must consist of alternating alphabetic and numeric runs that
    /// start with an alphabetic run: `Organ`, `Stop001`, `Panel001Element002`.
    pub fn parse(name: &str) -> Result<Self, ModelError> {
        let invalid = |reason| ModelError::InvalidSectionName {
            name: name.to_string(),
            reason,
        };
        if name.is_empty() {
            return Err(invalid("empty name"));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(invalid("only letters and digits are allowed"));
        }

        let mut runs: Vec<&str> = Vec::new();
        let bytes = name.as_bytes();
        let mut start = 0;
        for i in 1..=bytes.len() {
            let boundary = i == bytes.len()
                || bytes[i].is_ascii_digit() != bytes[i - 1].is_ascii_digit();
            if boundary {
                runs.push(&name[start..i]);
                start = i;
            }
        }

        if runs[0].as_bytes()[0].is_ascii_digit() {
            return Err(invalid("must start with a letter"));
        }
        let number = |run: &str| run.parse::<u32>().map_err(|_| invalid("identifier too large"));

        match runs.as_slice() {
            [kind] => Ok(Self::from_parts(vec![kind.to_string()], ObjectId::SINGLETON)),
            [kind, index] => Ok(Self::from_parts(
                vec![kind.to_string()],
                ObjectId::indexed(number(index)?),
            )),
            [outer, parent, inner, index] => Ok(Self::from_parts(
                vec![outer.to_string(), inner.to_string()],
                ObjectId::nested(number(parent)?, number(index)?),
            )),
            _ => Err(invalid("unsupported mix of letters and digits")),
        }
    }

    /// Builds a singleton or indexed section name.
    pub fn new(type_name: impl Into<String>, id: ObjectId) -> Self {
        Self::from_parts(vec![type_name.into()], id)
    }

    /// Builds a nested name such as `Panel001Element002`.
    pub fn nested(outer: impl Into<String>, parent: u32, inner: impl Into<String>, index: u32) -> Self {
        Self::from_parts(
            vec![outer.into(), inner.into()],
            ObjectId::nested(parent, index),
        )
    }

    fn from_parts(parts: Vec<String>, id: ObjectId) -> Self {
        let type_name = parts.concat();
        Self {
            parts,
            type_name,
            id,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Zero-padded spelling used when writing a fresh header.
    pub fn canonical(&self) -> String {
        match (self.parts.as_slice(), self.id.parent, self.id.index) {
            ([outer, inner], Some(parent), Some(index)) => {
                format!("{outer}{parent:03}{inner}{index:03}")
            }
            (_, _, Some(index)) => format!("{}{index:03}", self.type_name),
            _ => self.type_name.clone(),
        }
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}
