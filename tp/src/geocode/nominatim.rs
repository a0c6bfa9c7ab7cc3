//! Nominatim-style free-text search provider

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{GeoPoint, GeocodeError, GeocodeProvider};
use crate::domain::CoordSource;

/// Client for a Nominatim-style search endpoint
///
/// GET {base}/search?q={query}&format=json&limit=1
///
/// The response is a ranked list; the first element is used. Nominatim
/// serves coordinates as strings, so they are parsed here.
pub struct NominatimProvider {
    base_url: String,
    http: Client,
}

impl NominatimProvider {
    pub fn new(base_url: impl Into<String>, user_agent: &str, timeout_ms: u64) -> Result<Self, GeocodeError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .user_agent(user_agent)
            .build()
            .map_err(GeocodeError::Network)?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl GeocodeProvider for NominatimProvider {
    fn name(&self) -> &str {
        "nominatim"
    }

    fn source(&self) -> CoordSource {
        CoordSource::Nominatim
    }

    async fn geocode(&self, query: &str) -> Result<GeoPoint, GeocodeError> {
        let url = format!("{}/search", self.base_url);
        debug!(%query, "NominatimProvider::geocode: requesting");

        let response = self
            .http
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeocodeError::ApiError { status, message });
        }

        let results: Vec<SearchResult> = response.json().await?;
        let first = results.into_iter().next().ok_or(GeocodeError::NoResult)?;

        let lat = first
            .lat
            .parse::<f64>()
            .map_err(|e| GeocodeError::InvalidResponse(format!("bad lat {:?}: {e}", first.lat)))?;
        let lng = first
            .lon
            .parse::<f64>()
            .map_err(|e| GeocodeError::InvalidResponse(format!("bad lon {:?}: {e}", first.lon)))?;

        Ok(GeoPoint {
            lat,
            lng,
            formatted_address: first.display_name,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_parsing() {
        let results: Vec<SearchResult> = serde_json::from_str(
            r#"[{"lat": "48.8566", "lon": "2.3522", "display_name": "Paris, France"}]"#,
        )
        .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].lat, "48.8566");
        assert_eq!(results[0].display_name.as_deref(), Some("Paris, France"));
    }

    #[test]
    fn test_empty_result_list() {
        let results: Vec<SearchResult> = serde_json::from_str("[]").unwrap();
        assert!(results.is_empty());
    }
}
