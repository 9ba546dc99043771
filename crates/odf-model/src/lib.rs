#![deny(unsafe_code)]

pub mod diagnostic;
pub mod document;
pub mod error;
pub mod ids;
pub mod index;
pub mod line;
pub mod object;
pub mod value;

pub use diagnostic::{Diagnostic, DiagnosticReport, ObjectRef, RuleId, Severity};
pub use document::{Document, RawSection, Section, TextEncoding};
pub use error::{ModelError, Result};
pub use ids::{ObjectHandle, ObjectId, SectionName};
pub use index::{Collision, CrossRefIndex, ReferenceSite};
pub use line::{LineEnding, TextLine};
pub use object::{AttributeEntry, BodyLine, OrganObject};
pub use value::{PipeSample, Reference, TypedValue};
