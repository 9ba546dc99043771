use chrono::{DateTime, Utc};

/// Knobs of a conversion run.
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    /// Replaces the descriptor's organ name as `ChurchName`.
    pub organ_name: Option<String>,
    /// Time written into the generated header comment; now when unset.
    pub timestamp: Option<DateTime<Utc>>,
    /// Descriptor file name mentioned in the header comment.
    pub source_name: Option<String>,
}

impl ConversionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_organ_name(mut self, name: impl Into<String>) -> Self {
        self.organ_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }
}
