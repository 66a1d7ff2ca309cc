//! Sightspotter Geosearch - nearby point-of-interest provider
//!
//! This crate supplies placemarks to the placement engine:
//! - Strongly typed decoding of the MediaWiki geosearch JSON response
//! - HTTP client issuing the geosearch query around a location fix
//! - File-backed provider that replays a saved response

pub mod client;
pub mod error;
pub mod file;
pub mod provider;
pub mod response;

pub use client::{GeosearchClient, GeosearchConfig, DEFAULT_ENDPOINT, SEARCH_LIMIT, SEARCH_RADIUS_M};
pub use error::{FailureKind, ProviderError};
pub use file::FileProvider;
pub use provider::PlacemarkProvider;
pub use response::decode_placemarks;
