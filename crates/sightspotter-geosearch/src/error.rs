//! Provider error types

use sightspotter_core::GeoError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Server returned HTTP {0}")]
    Status(u16),
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Page '{title}' has no coordinates")]
    MissingCoordinates { title: String },
    #[error("Page '{title}' has an invalid coordinate: {source}")]
    InvalidCoordinate {
        title: String,
        #[source]
        source: GeoError,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse failure class reported to session listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Transport, HTTP status or file access failed
    Network,
    /// The payload did not have the expected shape
    Decode,
}

impl ProviderError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network(_) | Self::Status(_) | Self::Io(_) => FailureKind::Network,
            Self::Decode(_) | Self::MissingCoordinates { .. } | Self::InvalidCoordinate { .. } => {
                FailureKind::Decode
            }
        }
    }
}
