use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("schema registry unavailable: {0}")]
    Standards(#[from] odf_standards::StandardsError),
}

impl IngestError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        IngestError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
