use serde::Serialize;

use crate::ids::ObjectId;

/// Typed interpretation of an attribute value, cached next to the raw text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypedValue {
    Integer { value: i64 },
    Real { value: f64 },
    Boolean { value: bool },
    /// Free text, file paths and colours; the raw value is the payload.
    Text,
    /// Enumerated code, with the table label when the code is known.
    Code { label: Option<String> },
    Reference(Reference),
    Sample(PipeSample),
    /// The raw text does not parse as the declared kind.
    Invalid { reason: String },
    /// Attribute unknown to the schema, kept as pass-through text.
    Opaque,
}

impl TypedValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            TypedValue::Integer { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            TypedValue::Integer { value } => Some(*value as f64),
            TypedValue::Real { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TypedValue::Boolean { value } => Some(*value),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, TypedValue::Invalid { .. })
    }

    /// Every object identifier this value points at, with the type it expects.
    pub fn targets(&self) -> Vec<(&str, ObjectId)> {
        match self {
            TypedValue::Reference(reference) => vec![(reference.target.as_str(), reference.id)],
            TypedValue::Sample(PipeSample::Ref { manual, stop, .. }) => vec![
                ("Manual", ObjectId::indexed(*manual)),
                ("Stop", ObjectId::indexed(*stop)),
            ],
            _ => Vec::new(),
        }
    }
}

/// A numeric pointer to another object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub target: String,
    pub id: ObjectId,
    /// Leading `-` in member lists of combinations ("switch off").
    pub negated: bool,
}

/// Value of a `PipeNNN` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "sample", rename_all = "snake_case")]
pub enum PipeSample {
    Empty,
    File,
    /// `REF:mmm:sss:ppp` borrows pipe `ppp` of stop `sss` on manual `mmm`.
    Ref { manual: u32, stop: u32, pipe: u32 },
}
