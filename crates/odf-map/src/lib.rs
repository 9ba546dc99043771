#![deny(unsafe_code)]

//! Conversion of Hauptwerk sample-set descriptors (XML) into GrandOrgue
//! organ definition documents.
//!
//! The descriptor is read into foreign objects typed by the bundled
//! Hauptwerk schema set, then mapped onto organ definition objects. Foreign
//! objects that cannot be mapped are skipped with a `ConversionSkipped`
//! warning; the conversion itself fails only on unreadable input.

mod combinations;
pub mod convert;
mod emit;
pub mod error;
pub mod foreign;
pub mod ids;
pub mod options;
pub mod pitch;
mod plan;
mod ranks;
mod stops;
mod structure;
pub mod xml;

pub use convert::{Conversion, Converter, convert_file, convert_str};
pub use error::ConvertError;
pub use foreign::ForeignOrgan;
pub use ids::IdMap;
pub use options::ConversionOptions;
pub use xml::{ForeignRecord, read_records};
