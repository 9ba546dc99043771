use thiserror::Error;

use crate::ids::ObjectHandle;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid section name '{name}': {reason}")]
    InvalidSectionName { name: String, reason: &'static str },

    #[error("no object with handle {handle} in the document")]
    UnknownObject { handle: ObjectHandle },

    #[error("position {position} is out of range (document has {len} sections)")]
    PositionOutOfRange { position: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, ModelError>;
