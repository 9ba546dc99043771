use serde::{Deserialize, Serialize};

/// Terminator recorded for each physical line so that a document can be
/// written back exactly as it was read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
    Cr,
    /// Last line of a file without a trailing newline.
    None,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::Cr => "\r",
            LineEnding::None => "",
        }
    }
}

/// One physical line of source text, without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub text: String,
    pub ending: LineEnding,
    /// 1-based source line; `None` for lines created by edits.
    pub number: Option<usize>,
}

impl TextLine {
    pub fn new(text: impl Into<String>, ending: LineEnding) -> Self {
        Self {
            text: text.into(),
            ending,
            number: None,
        }
    }

    pub fn sourced(text: impl Into<String>, ending: LineEnding, number: usize) -> Self {
        Self {
            text: text.into(),
            ending,
            number: Some(number),
        }
    }
}
