//! HTTP geosearch client
//!
//! Issues a MediaWiki `generator=geosearch` query around the user's location
//! and decodes the pages into placemarks.

use serde::{Deserialize, Serialize};
use sightspotter_core::{GeoPoint, Placemark};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::ProviderError;
use crate::provider::PlacemarkProvider;
use crate::response::decode_placemarks;

/// Public MediaWiki API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";

/// Search radius around the user, in metres
pub const SEARCH_RADIUS_M: u32 = 10_000;

/// Maximum number of pages returned per query
pub const SEARCH_LIMIT: u32 = 50;

/// Geosearch client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeosearchConfig {
    /// API endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Search radius in metres
    #[serde(default = "default_radius")]
    pub radius: u32,
    /// Result count limit
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for GeosearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            radius: default_radius(),
            limit: default_limit(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_radius() -> u32 {
    SEARCH_RADIUS_M
}

fn default_limit() -> u32 {
    SEARCH_LIMIT
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("sightspotter/{}", env!("CARGO_PKG_VERSION"))
}

/// Geosearch provider backed by HTTP
pub struct GeosearchClient {
    client: reqwest::Client,
    config: GeosearchConfig,
}

impl GeosearchClient {
    pub fn new(config: GeosearchConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GeosearchConfig {
        &self.config
    }

    /// Query-string parameters for a search centred on `at`
    pub fn query_params(&self, at: GeoPoint) -> Vec<(&'static str, String)> {
        vec![
            ("action", "query".to_string()),
            ("format", "json".to_string()),
            ("generator", "geosearch".to_string()),
            ("ggscoord", format!("{}|{}", at.latitude, at.longitude)),
            ("ggsradius", self.config.radius.to_string()),
            ("ggslimit", self.config.limit.to_string()),
            ("prop", "coordinates|pageterms".to_string()),
            ("colimit", self.config.limit.to_string()),
            ("wbptterms", "description".to_string()),
        ]
    }

    /// Fetch placemarks around `at`
    pub async fn fetch(&self, at: GeoPoint) -> Result<Vec<Placemark>, ProviderError> {
        info!(
            endpoint = %self.config.endpoint,
            at = %at,
            radius = self.config.radius,
            "Fetching nearby sights"
        );

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&self.query_params(at))
            .send()
            .await
            .map_err(|e| {
                warn!(endpoint = %self.config.endpoint, error = %e, "Geosearch request failed");
                ProviderError::Network(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Geosearch returned non-success status");
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let placemarks = decode_placemarks(&body)?;

        debug!(count = placemarks.len(), "Decoded geosearch response");
        Ok(placemarks)
    }
}

impl PlacemarkProvider for GeosearchClient {
    async fn placemarks_near(&self, at: GeoPoint) -> Result<Vec<Placemark>, ProviderError> {
        self.fetch(at).await
    }
}
