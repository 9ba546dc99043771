#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::error::StandardsError;

/// Label used upstream for codes whose meaning is undocumented.
pub const OPAQUE_LABEL: &str = "?";

/// One row of an enumeration table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumCode {
    pub code: String,
    pub label: String,
}

impl EnumCode {
    /// `1xx`, `20xx`: a prefix followed by digit placeholders.
    pub fn is_pattern(&self) -> bool {
        let prefix = self.code.trim_end_matches('x');
        !prefix.is_empty() && prefix.len() < self.code.len()
    }

    /// Known code whose meaning is not documented upstream.
    pub fn is_opaque(&self) -> bool {
        self.label == OPAQUE_LABEL
    }

    fn matches_pattern(&self, value: &str) -> bool {
        if value.len() != self.code.len() {
            return false;
        }
        self.code
            .bytes()
            .zip(value.bytes())
            .all(|(p, v)| if p == b'x' { v.is_ascii_digit() } else { p == v })
    }
}

/// Code -> label table, with pattern rules evaluated before exact codes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnumTable {
    pub name: String,
    codes: Vec<EnumCode>,
}

impl EnumTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            codes: Vec::new(),
        }
    }

    pub fn push(&mut self, code: impl Into<String>, label: impl Into<String>) {
        self.codes.push(EnumCode {
            code: code.into(),
            label: label.into(),
        });
    }

    pub fn codes(&self) -> &[EnumCode] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Resolves a value to its table row: pattern rules in file order, then
    /// exact match, then ASCII case-insensitive match.
    pub fn lookup(&self, value: &str) -> Option<&EnumCode> {
        self.codes
            .iter()
            .filter(|code| code.is_pattern())
            .find(|code| code.matches_pattern(value))
            .or_else(|| self.codes.iter().find(|code| code.code == value))
            .or_else(|| {
                self.codes
                    .iter()
                    .find(|code| code.code.eq_ignore_ascii_case(value))
            })
    }

    pub fn label(&self, value: &str) -> Option<&str> {
        self.lookup(value).map(|code| code.label.as_str())
    }
}

/// Parses `table,code,label` rows into tables keyed by name.
pub fn parse_enum_csv(
    path: &Path,
    contents: &str,
) -> Result<BTreeMap<String, EnumTable>, StandardsError> {
    let csv_error = |message: String| StandardsError::Csv {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(contents.trim_start_matches('\u{feff}').as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| csv_error(e.to_string()))?
        .clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| csv_error(format!("missing column '{name}'")))
    };
    let idx_table = column("table")?;
    let idx_code = column("code")?;
    let idx_label = column("label")?;

    let mut tables: BTreeMap<String, EnumTable> = BTreeMap::new();
    for (row_number, record) in reader.records().enumerate() {
        let record = record.map_err(|e| csv_error(e.to_string()))?;
        let get = |idx: usize| record.get(idx).map(str::trim).unwrap_or("");
        let table = get(idx_table);
        let code = get(idx_code);
        if table.is_empty() || code.is_empty() {
            return Err(csv_error(format!(
                "row {} has an empty table or code",
                row_number + 2
            )));
        }
        tables
            .entry(table.to_string())
            .or_insert_with(|| EnumTable::new(table))
            .push(code, get(idx_label));
    }
    Ok(tables)
}
