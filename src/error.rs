//! Error taxonomy for the windowing engine
//!
//! Only `MissingField` is raised while events flow; the engine absorbs it
//! locally. The remaining variants come from configuration loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the analysis core
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Missing field '{field}' on event '{event}'")]
    MissingField { event: String, field: String },

    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("Invalid analysis configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read configuration file {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl AnalysisError {
    /// Whether the error only concerns a single event and may be skipped
    pub fn is_event_local(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
