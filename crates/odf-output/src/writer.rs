//! Text assembly from the object model.

use std::fs;
use std::path::Path;
use std::time::Instant;

use odf_model::{BodyLine, Document, LineEnding, OrganObject, RawSection, Section, TextLine};
use tracing::{debug, info, info_span};

use crate::encode::encode;
use crate::error::OutputError;

/// Accumulates output lines, repairing a missing terminator when a line
/// that used to end the file is followed by more content.
struct LineWriter {
    out: String,
    newline: LineEnding,
    unterminated: bool,
    last_blank: bool,
}

impl LineWriter {
    fn new(newline: LineEnding) -> Self {
        // A document whose only line lacked a terminator records `None`.
        let newline = match newline {
            LineEnding::None => LineEnding::Lf,
            other => other,
        };
        Self {
            out: String::new(),
            newline,
            unterminated: false,
            last_blank: true,
        }
    }

    fn line(&mut self, text: &str, ending: LineEnding) {
        if self.unterminated {
            self.out.push_str(self.newline.as_str());
        }
        self.out.push_str(text);
        self.out.push_str(ending.as_str());
        self.unterminated = ending == LineEnding::None;
        self.last_blank = text.trim().is_empty();
    }

    fn source(&mut self, line: &TextLine) {
        self.line(&line.text, line.ending);
    }

    fn body(&mut self, line: &BodyLine) {
        match line {
            BodyLine::Attribute(entry) => {
                let ending = match entry.source() {
                    Some(source) => source.ending,
                    None => entry.ending().unwrap_or(self.newline),
                };
                self.line(&entry.render(), ending);
            }
            BodyLine::Comment(text) | BodyLine::Blank(text) | BodyLine::Malformed(text) => {
                self.source(text);
            }
        }
    }

    fn object(&mut self, object: &OrganObject) {
        match object.header_source() {
            Some(header) => self.source(header),
            None => {
                // Renamed sections keep their terminator; new ones are set apart.
                let ending = match object.header_ending() {
                    Some(ending) => ending,
                    None => {
                        if !self.last_blank {
                            let newline = self.newline;
                            self.line("", newline);
                        }
                        self.newline
                    }
                };
                self.line(&format!("[{}]", object.name().canonical()), ending);
            }
        }
        for line in object.body() {
            self.body(line);
        }
    }

    fn raw(&mut self, raw: &RawSection) {
        self.source(&raw.header);
        for line in &raw.lines {
            self.source(line);
        }
    }
}

/// Renders `document` as text. Untouched lines come back byte for byte;
/// edited and new lines use the document's line terminator.
pub fn serialize_to_string(document: &Document) -> String {
    let mut writer = LineWriter::new(document.newline());
    for line in document.preamble() {
        writer.body(line);
    }
    for section in document.sections() {
        match section {
            Section::Object(object) => writer.object(object),
            Section::Unclassified(raw) => writer.raw(raw),
        }
    }
    writer.out
}

/// Renders and encodes `document` with the encoding it was read with.
pub fn serialize_to_bytes(document: &Document) -> Result<Vec<u8>, OutputError> {
    encode(&serialize_to_string(document), document.encoding())
}

pub fn write_file(document: &Document, path: &Path) -> Result<(), OutputError> {
    let span = info_span!("write_odf", path = %path.display());
    let _guard = span.enter();
    let start = Instant::now();

    let bytes = serialize_to_bytes(document)?;
    debug!(bytes = bytes.len(), encoding = ?document.encoding(), "encoded document");
    fs::write(path, &bytes).map_err(|e| OutputError::io(path, e))?;

    info!(
        sections = document.sections().len(),
        bytes = bytes.len(),
        duration_ms = start.elapsed().as_millis(),
        "wrote organ definition"
    );
    Ok(())
}
