use std::path::{Path, PathBuf};

use serde::Serialize;

/// Knobs of a validation run.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOptions {
    /// Directory that sample and image paths are relative to. File
    /// existence is only checked when set.
    pub sample_dir: Option<PathBuf>,
    pub check_orphans: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            sample_dir: None,
            check_orphans: true,
        }
    }
}

impl ValidationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sample_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.sample_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn with_orphan_check(mut self, enabled: bool) -> Self {
        self.check_orphans = enabled;
        self
    }
}
