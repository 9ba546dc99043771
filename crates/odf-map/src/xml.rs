//! Streaming read of the descriptor's object lists.
//!
//! The layout is fixed:
//!
//! ```text
//! <Hauptwerk>
//!   <ObjectList ObjectType="Rank">
//!     <Rank><RankID>1</RankID><Name>Principal 8</Name></Rank>
//!     <o><a>2</a><b>Octave 4</b></o>
//!   </ObjectList>
//! </Hauptwerk>
//! ```
//!
//! Object elements are named after their type or `o` in compressed files;
//! value elements carry the long attribute name or its short code.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::ConvertError;

/// One object element with its value elements in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignRecord {
    pub object_type: String,
    /// 1-based position within its object list.
    pub ordinal: u32,
    pub values: Vec<(String, String)>,
}

impl ForeignRecord {
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

const ROOT: usize = 1;
const LIST: usize = 2;
const OBJECT: usize = 3;
const VALUE: usize = 4;

#[derive(Default)]
struct Cursor {
    depth: usize,
    list_type: Option<String>,
    ordinal: u32,
    record: Option<ForeignRecord>,
    field: Option<(String, String)>,
}

impl Cursor {
    fn open(&mut self, start: &BytesStart<'_>) -> Result<(), ConvertError> {
        self.depth += 1;
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        match self.depth {
            ROOT if name != "Hauptwerk" => return Err(ConvertError::NotHauptwerk { root: name }),
            LIST => {
                self.list_type = object_type_of(start)?;
                self.ordinal = 0;
            }
            OBJECT => {
                if let Some(object_type) = &self.list_type {
                    self.ordinal += 1;
                    self.record = Some(ForeignRecord {
                        object_type: object_type.clone(),
                        ordinal: self.ordinal,
                        values: Vec::new(),
                    });
                }
            }
            VALUE if self.record.is_some() => self.field = Some((name, String::new())),
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, records: &mut Vec<ForeignRecord>) {
        match self.depth {
            LIST => self.list_type = None,
            OBJECT => records.extend(self.record.take()),
            VALUE => {
                if let (Some((key, value)), Some(record)) = (self.field.take(), &mut self.record) {
                    record.values.push((key, value.trim().to_string()));
                }
            }
            _ => {}
        }
        self.depth = self.depth.saturating_sub(1);
    }

    fn text(&mut self, text: &str) {
        if self.depth == VALUE
            && let Some((_, value)) = &mut self.field
        {
            value.push_str(text);
        }
    }
}

fn object_type_of(start: &BytesStart<'_>) -> Result<Option<String>, ConvertError> {
    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        if attribute.key.as_ref() == b"ObjectType" {
            return Ok(Some(String::from_utf8_lossy(&attribute.value).into_owned()));
        }
    }
    Ok(None)
}

/// `&amp;`, `&#233;`, `&#xE9;`; anything else is kept as written.
fn resolve_reference(name: &str) -> String {
    let code = match name.strip_prefix('#') {
        Some(hex) if hex.starts_with(['x', 'X']) => u32::from_str_radix(&hex[1..], 16).ok(),
        Some(decimal) => decimal.parse().ok(),
        None => None,
    };
    if let Some(c) = code.and_then(char::from_u32) {
        return c.to_string();
    }
    match name {
        "amp" => "&".to_string(),
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "quot" => "\"".to_string(),
        "apos" => "'".to_string(),
        other => format!("&{other};"),
    }
}

/// Reads every object record of a descriptor, in document order.
pub fn read_records(xml: &str) -> Result<Vec<ForeignRecord>, ConvertError> {
    let mut reader = Reader::from_str(xml);
    let mut cursor = Cursor::default();
    let mut records = Vec::new();
    let mut saw_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                saw_root = true;
                cursor.open(&start)?;
            }
            Event::Empty(start) => {
                saw_root = true;
                cursor.open(&start)?;
                cursor.close(&mut records);
            }
            Event::End(_) => cursor.close(&mut records),
            Event::Text(text) => cursor.text(&String::from_utf8_lossy(&text)),
            Event::CData(data) => cursor.text(&String::from_utf8_lossy(&data)),
            Event::GeneralRef(reference) => {
                cursor.text(&resolve_reference(&String::from_utf8_lossy(&reference)));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(ConvertError::Empty);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_long_and_compressed_objects() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<Hauptwerk FileFormat="Organ" FileFormatVersion="7.00">
  <ObjectList ObjectType="Rank">
    <Rank><RankID>1</RankID><Name>Bourdon &amp; Flute</Name></Rank>
    <o><a>2</a><b><![CDATA[Octave <4>]]></b><c/></o>
  </ObjectList>
  <ObjectList ObjectType="Switch"/>
</Hauptwerk>"#;
        let records = read_records(xml).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].object_type, "Rank");
        assert_eq!(records[0].value("Name"), Some("Bourdon & Flute"));
        assert_eq!(records[1].ordinal, 2);
        assert_eq!(
            records[1].values,
            vec![
                ("a".to_string(), "2".to_string()),
                ("b".to_string(), "Octave <4>".to_string()),
                ("c".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn rejects_other_roots() {
        let err = read_records("<Organ/>").unwrap_err();
        assert!(matches!(err, ConvertError::NotHauptwerk { root } if root == "Organ"));
        assert!(matches!(read_records("   "), Err(ConvertError::Empty)));
    }

    #[test]
    fn character_references_resolve() {
        assert_eq!(resolve_reference("#233"), "é");
        assert_eq!(resolve_reference("#x41"), "A");
        assert_eq!(resolve_reference("nbsp"), "&nbsp;");
    }
}
