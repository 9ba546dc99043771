//! Splits decoded text into physical lines and classifies each one.

use odf_model::{LineEnding, TextLine};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    /// `[Name]`; the name is the text between the brackets.
    Header { name: String },
    /// `Key=Value`; the key is trimmed, the value is kept as written.
    Attribute { key: String, value: String },
    /// Line starting with `;`.
    Comment,
    Blank,
    /// Non-blank line that is neither a header, a comment nor `Key=Value`.
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub kind: RecordKind,
    pub line: TextLine,
}

/// Splits text at `\n`, `\r\n` and `\r`, keeping each terminator. The last
/// line has [`LineEnding::None`] unless the text ends with a terminator, in
/// which case no empty trailing line is produced.
pub fn split_lines(text: &str) -> Vec<TextLine> {
    let mut lines = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let ending = match bytes[i] {
            b'\n' => Some((LineEnding::Lf, 1)),
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => Some((LineEnding::CrLf, 2)),
            b'\r' => Some((LineEnding::Cr, 1)),
            _ => None,
        };
        match ending {
            Some((ending, width)) => {
                lines.push(TextLine::sourced(&text[start..i], ending, lines.len() + 1));
                i += width;
                start = i;
            }
            None => i += 1,
        }
    }
    if start < bytes.len() {
        lines.push(TextLine::sourced(&text[start..], LineEnding::None, lines.len() + 1));
    }
    lines
}

pub fn classify_line(text: &str) -> RecordKind {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return RecordKind::Blank;
    }
    if trimmed.starts_with(';') {
        return RecordKind::Comment;
    }
    if trimmed.len() >= 2 && trimmed.starts_with('[') && trimmed.ends_with(']') {
        return RecordKind::Header {
            name: trimmed[1..trimmed.len() - 1].to_string(),
        };
    }
    match text.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => RecordKind::Attribute {
            key: key.trim().to_string(),
            value: value.to_string(),
        },
        _ => RecordKind::Malformed,
    }
}

pub fn lex(text: &str) -> Vec<Record> {
    split_lines(text)
        .into_iter()
        .map(|line| Record {
            kind: classify_line(&line.text),
            line,
        })
        .collect()
}
