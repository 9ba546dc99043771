#![deny(unsafe_code)]

pub mod classify;
pub mod condition;
pub mod enums;
pub mod error;
pub mod hash;
pub mod loader;
pub mod manifest;
pub mod registry;
pub mod schema;
pub mod set;

pub use crate::classify::classify;
pub use crate::condition::{
    AttributeLookup, CompiledCondition, Condition, PanelFormat, Predicate, PredicateContext,
};
pub use crate::enums::{EnumCode, EnumTable};
pub use crate::error::StandardsError;
pub use crate::loader::load_schema_set;
pub use crate::registry::{LoadSummary, SchemaRegistry};
pub use crate::schema::{
    AttributeDef, AttributeMatch, IdShape, ObjectSchema, Range, Requirement, Template, ValueKind,
};
pub use crate::set::SchemaSet;
