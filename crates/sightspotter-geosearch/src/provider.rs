//! The point-of-interest provider collaborator

use sightspotter_core::{GeoPoint, Placemark};
use std::future::Future;

use crate::error::ProviderError;

/// Source of placemarks around a location fix.
///
/// Fetches run on a background task, so providers must be shareable across
/// threads.
pub trait PlacemarkProvider: Send + Sync + 'static {
    fn placemarks_near(
        &self,
        at: GeoPoint,
    ) -> impl Future<Output = Result<Vec<Placemark>, ProviderError>> + Send;
}
