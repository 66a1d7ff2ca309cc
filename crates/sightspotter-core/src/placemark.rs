//! Points of interest produced by the placemark provider

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// A named point of interest. Immutable once received from the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placemark {
    pub title: String,
    pub location: GeoPoint,
    /// Short auxiliary text (e.g. an encyclopedia description)
    #[serde(default)]
    pub description: Option<String>,
}

impl Placemark {
    pub fn new(title: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            title: title.into(),
            location,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
