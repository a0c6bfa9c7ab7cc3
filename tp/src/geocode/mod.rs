//! Geocoding fallback chain and cache
//!
//! Coordinates for new destinations come from an ordered chain of provider
//! implementations behind one `GeocodeProvider` capability interface. The
//! chain is iterated in order and short-circuits on the first success; a
//! provider failure or timeout advances to the next tier. Exhaustion of the
//! chain is not an error — the caller applies the fixed `{0,0}` fallback.
//! Every result is tagged with the tier that answered.

pub mod nominatim;
pub mod places;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::CoordSource;

pub use nominatim::NominatimProvider;
pub use places::PlacesProvider;

/// Fixed timeout for every geocoding call, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default TTL for cached geocode results, in seconds
pub const DEFAULT_CACHE_TTL_SECS: i64 = 3600;

/// Errors from a single geocoding provider
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Provider error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("No result for query")]
    NoResult,

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

/// A geocoded point as returned by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    pub formatted_address: Option<String>,
}

/// One tier of the geocoding chain
#[async_trait]
pub trait GeocodeProvider: Send + Sync {
    /// Tier name for logging
    fn name(&self) -> &str;

    /// Source tag stamped on coordinates this tier produces
    fn source(&self) -> CoordSource;

    /// Geocode a free-text query
    async fn geocode(&self, query: &str) -> Result<GeoPoint, GeocodeError>;
}

/// Ordered provider chain
pub struct GeocodeChain {
    providers: Vec<Box<dyn GeocodeProvider>>,
}

impl GeocodeChain {
    pub fn new(providers: Vec<Box<dyn GeocodeProvider>>) -> Self {
        Self { providers }
    }

    /// An empty chain; every lookup falls through to the caller's fallback
    pub fn empty() -> Self {
        Self { providers: Vec::new() }
    }

    /// Try each provider in order, returning the first success together
    /// with the answering tier's source tag
    pub async fn locate(&self, query: &str) -> Option<(GeoPoint, CoordSource)> {
        for provider in &self.providers {
            debug!(provider = %provider.name(), %query, "locate: trying provider");
            match provider.geocode(query).await {
                Ok(point) => {
                    debug!(provider = %provider.name(), lat = point.lat, lng = point.lng, "locate: hit");
                    return Some((point, provider.source()));
                }
                Err(e) => {
                    warn!(provider = %provider.name(), %query, error = %e, "locate: provider failed, advancing chain");
                }
            }
        }
        None
    }
}

/// TTL-evicting geocode result cache
///
/// An explicit constructed object owned by the service instance; never a
/// module-level singleton. `clear()` exists so tests reset state
/// explicitly.
pub struct GeoCache {
    entries: HashMap<String, (GeoPoint, DateTime<Utc>)>,
    ttl: Duration,
}

impl GeoCache {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            entries: HashMap::new(),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Fetch a cached point, evicting it first if it has expired
    pub fn get(&mut self, key: &str) -> Option<GeoPoint> {
        let expired = match self.entries.get(key) {
            Some((_, stored_at)) => Utc::now() - *stored_at > self.ttl,
            None => return None,
        };
        if expired {
            debug!(%key, "GeoCache::get: entry expired");
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|(point, _)| point.clone())
    }

    pub fn insert(&mut self, key: impl Into<String>, point: GeoPoint) {
        self.entries.insert(key.into(), (point, Utc::now()));
    }

    /// Drop entries older than the TTL
    pub fn evict_expired(&mut self) {
        let cutoff = Utc::now() - self.ttl;
        self.entries.retain(|_, (_, stored_at)| *stored_at > cutoff);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FailingProvider, FixedProvider};
    use super::*;

    #[tokio::test]
    async fn test_chain_first_success_wins() {
        let chain = GeocodeChain::new(vec![
            Box::new(FixedProvider::new("places", CoordSource::Places, 35.0, 139.0)),
            Box::new(FixedProvider::new("nominatim", CoordSource::Nominatim, 1.0, 1.0)),
        ]);

        let (point, tier) = chain.locate("Tokyo, Japan").await.unwrap();
        assert_eq!(tier, CoordSource::Places);
        assert_eq!(point.lat, 35.0);
    }

    #[tokio::test]
    async fn test_chain_advances_past_failure() {
        let chain = GeocodeChain::new(vec![
            Box::new(FailingProvider::new("places")),
            Box::new(FixedProvider::new("nominatim", CoordSource::Nominatim, 48.85, 2.35)),
        ]);

        let (point, tier) = chain.locate("Paris, France").await.unwrap();
        assert_eq!(tier, CoordSource::Nominatim);
        assert_eq!(point.lng, 2.35);
    }

    #[tokio::test]
    async fn test_chain_exhaustion_returns_none() {
        let chain = GeocodeChain::new(vec![
            Box::new(FailingProvider::new("places")),
            Box::new(FailingProvider::new("nominatim")),
        ]);
        assert!(chain.locate("Nowhere").await.is_none());
    }

    #[tokio::test]
    async fn test_empty_chain() {
        assert!(GeocodeChain::empty().locate("Anywhere").await.is_none());
    }

    #[test]
    fn test_cache_roundtrip_and_clear() {
        let mut cache = GeoCache::new(3600);
        assert!(cache.get("tokyo, japan").is_none());

        cache.insert(
            "tokyo, japan",
            GeoPoint {
                lat: 35.6762,
                lng: 139.6503,
                formatted_address: None,
            },
        );
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("tokyo, japan").unwrap().lat, 35.6762);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_ttl_eviction() {
        // zero TTL: everything is expired immediately
        let mut cache = GeoCache::new(0);
        cache.insert(
            "paris",
            GeoPoint {
                lat: 48.85,
                lng: 2.35,
                formatted_address: None,
            },
        );
        assert!(cache.get("paris").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_evict_expired_keeps_fresh_entries() {
        let mut cache = GeoCache::new(3600);
        cache.insert(
            "rome",
            GeoPoint {
                lat: 41.9,
                lng: 12.5,
                formatted_address: None,
            },
        );
        cache.evict_expired();
        assert_eq!(cache.len(), 1);
    }
}
