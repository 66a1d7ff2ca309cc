//! Provider that replays a saved geosearch response from disk

use sightspotter_core::{GeoPoint, Placemark};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::PlacemarkProvider;
use crate::response::decode_placemarks;

/// Reads and decodes the same response file on every fetch, whatever the
/// requested location. Useful offline and in tests.
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PlacemarkProvider for FileProvider {
    async fn placemarks_near(&self, at: GeoPoint) -> Result<Vec<Placemark>, ProviderError> {
        debug!(path = %self.path.display(), at = %at, "Loading saved geosearch response");
        let body = tokio::fs::read_to_string(&self.path).await?;
        decode_placemarks(&body)
    }
}
