//! MediaWiki geosearch response decoding
//!
//! Expected shape:
//! `{ "query": { "pages": { "<pageid>": { "title": .., "coordinates": [{ "lat": .., "lon": .. }] } } } }`
//!
//! Required fields are never defaulted: a page without a title or coordinate
//! fails the whole decode. A response with no `query` member is the API's way
//! of saying nothing was found and decodes to an empty list.

use serde::Deserialize;
use sightspotter_core::{GeoPoint, Placemark};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::ProviderError;

#[derive(Debug, Deserialize)]
struct GeosearchResponse {
    #[serde(default)]
    query: Option<Query>,
}

#[derive(Debug, Deserialize)]
struct Query {
    pages: BTreeMap<u64, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    coordinates: Vec<Coordinate>,
    #[serde(default)]
    terms: Option<Terms>,
}

#[derive(Debug, Deserialize)]
struct Coordinate {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct Terms {
    #[serde(default)]
    description: Vec<String>,
}

impl Page {
    fn into_placemark(self) -> Result<Placemark, ProviderError> {
        let Some(coordinate) = self.coordinates.first() else {
            return Err(ProviderError::MissingCoordinates { title: self.title });
        };

        let location = match GeoPoint::new(coordinate.lat, coordinate.lon) {
            Ok(location) => location,
            Err(source) => {
                return Err(ProviderError::InvalidCoordinate {
                    title: self.title,
                    source,
                })
            }
        };

        let description = self
            .terms
            .and_then(|t| t.description.into_iter().next());

        Ok(Placemark {
            title: self.title,
            location,
            description,
        })
    }
}

/// Decode a geosearch response body into placemarks, ordered by page id
pub fn decode_placemarks(body: &str) -> Result<Vec<Placemark>, ProviderError> {
    let response: GeosearchResponse = serde_json::from_str(body)?;

    let Some(query) = response.query else {
        debug!("Geosearch response has no results");
        return Ok(Vec::new());
    };

    query
        .pages
        .into_values()
        .map(Page::into_placemark)
        .collect()
}
