#![deny(unsafe_code)]

//! Writes organ definition documents.
//!
//! Output is always produced, whatever the validation state of the
//! document; only encoding and I/O problems are errors.

pub mod encode;
pub mod error;
pub mod writer;

pub use encode::{UTF8_BOM, encode};
pub use error::OutputError;
pub use writer::{serialize_to_bytes, serialize_to_string, write_file};
