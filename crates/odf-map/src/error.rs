//! Error types for descriptor conversion.

use std::path::{Path, PathBuf};

use odf_standards::StandardsError;
use thiserror::Error;

/// Hard failures of a conversion. Problems with individual foreign
/// objects are reported as diagnostics instead.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed descriptor XML")]
    Xml {
        #[source]
        source: quick_xml::Error,
    },

    #[error("root element is <{root}>, expected <Hauptwerk>")]
    NotHauptwerk { root: String },

    #[error("descriptor has no root element")]
    Empty,

    #[error(transparent)]
    Standards(#[from] StandardsError),
}

impl ConvertError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<quick_xml::Error> for ConvertError {
    fn from(source: quick_xml::Error) -> Self {
        Self::Xml { source }
    }
}
