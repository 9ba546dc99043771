#![deny(unsafe_code)]

pub mod builder;
pub mod encoding;
pub mod error;
pub mod lexer;
pub mod structure;

pub use builder::{
    HeaderClass, LoadOutcome, build_document, classify_header, fill_required_defaults,
    insert_in_schema_order, make_entry, parse_bytes, parse_str, parse_text, read_file, type_value,
};
pub use encoding::{UTF8_BOM, decode};
pub use error::IngestError;
pub use lexer::{Record, RecordKind, classify_line, lex, split_lines};
pub use structure::{structural_diagnostics, suggest, suggest_type};
