//! Error types for writing organ definition files.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A character of an edited value has no ISO-8859-1 encoding.
    #[error("line {line}: '{character}' cannot be written as ISO-8859-1")]
    Unrepresentable { character: char, line: usize },
}

impl OutputError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
