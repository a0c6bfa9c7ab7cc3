//! Places-style find-place-from-text provider

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{GeoPoint, GeocodeError, GeocodeProvider};
use crate::domain::CoordSource;

/// Client for a Places-style "find place from text" endpoint
///
/// GET {base}/findplacefromtext/json?input={query}&inputtype=textquery
///     &fields=geometry,formatted_address&key={api_key}
pub struct PlacesProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl PlacesProvider {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout_ms: u64) -> Result<Self, GeocodeError> {
        let http = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(GeocodeError::Network)?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl GeocodeProvider for PlacesProvider {
    fn name(&self) -> &str {
        "places"
    }

    fn source(&self) -> CoordSource {
        CoordSource::Places
    }

    async fn geocode(&self, query: &str) -> Result<GeoPoint, GeocodeError> {
        let url = format!("{}/findplacefromtext/json", self.base_url);
        debug!(%query, "PlacesProvider::geocode: requesting");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("input", query),
                ("inputtype", "textquery"),
                ("fields", "geometry,formatted_address"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeocodeError::ApiError { status, message });
        }

        let body: FindPlaceResponse = response.json().await?;

        if body.status != "OK" {
            return Err(GeocodeError::InvalidResponse(format!("provider status {}", body.status)));
        }

        let candidate = body.candidates.into_iter().next().ok_or(GeocodeError::NoResult)?;

        Ok(GeoPoint {
            lat: candidate.geometry.location.lat,
            lng: candidate.geometry.location.lng,
            formatted_address: candidate.formatted_address,
        })
    }
}

#[derive(Debug, Deserialize)]
struct FindPlaceResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    geometry: Geometry,
    formatted_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}
