//! Tripdaemon configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::geocode;
use crate::resolve::{self, ResolverOptions};
use crate::session;

/// Main tripdaemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote document store
    pub persistence: PersistenceConfig,

    /// Geocoding providers and cache
    pub geocode: GeocodeConfig,

    /// Identifier resolution thresholds
    pub resolver: ResolverConfig,

    /// Session bookkeeping
    pub session: SessionConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that required environment variables are set. Call this early
    /// in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if self.geocode.places.enabled && std::env::var(&self.geocode.places.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "Places geocoding is enabled but the {} environment variable is not set.",
                self.geocode.places.api_key_env
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .tripdaemon.yml
        let local_config = PathBuf::from(".tripdaemon.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/tripdaemon/tripdaemon.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tripdaemon").join("tripdaemon.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Remote document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Store base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: docstore::DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Geocoding provider chain configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodeConfig {
    /// Places-style provider (first network tier)
    pub places: PlacesConfig,

    /// Nominatim-style provider (second network tier)
    pub nominatim: NominatimConfig,

    /// Per-provider request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Geocode cache TTL in seconds
    #[serde(rename = "cache-ttl-secs")]
    pub cache_ttl_secs: i64,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            places: PlacesConfig::default(),
            nominatim: NominatimConfig::default(),
            timeout_ms: geocode::DEFAULT_TIMEOUT_MS,
            cache_ttl_secs: geocode::DEFAULT_CACHE_TTL_SECS,
        }
    }
}

/// Places-style provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    pub enabled: bool,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://maps.googleapis.com/maps/api/place".to_string(),
            api_key_env: "PLACES_API_KEY".to_string(),
        }
    }
}

/// Nominatim-style provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NominatimConfig {
    pub enabled: bool,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "tripdaemon/0.1".to_string(),
        }
    }
}

/// Identifier resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Repair invalid destination ids automatically
    #[serde(rename = "auto-resolve")]
    pub auto_resolve: bool,

    /// Fail instead of orphaning unresolvable items
    pub strict: bool,

    /// Fuzzy threshold for identifier resolution
    #[serde(rename = "resolve-threshold")]
    pub resolve_threshold: f64,

    /// Fuzzy threshold for the general best-match helper
    #[serde(rename = "match-threshold")]
    pub match_threshold: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            auto_resolve: true,
            strict: false,
            resolve_threshold: resolve::DEFAULT_RESOLVE_THRESHOLD,
            match_threshold: resolve::DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl ResolverConfig {
    /// Resolver options as passed to the resolve/reconcile call sites
    pub fn options(&self) -> ResolverOptions {
        ResolverOptions {
            auto_resolve: self.auto_resolve,
            strict: self.strict,
            resolve_threshold: self.resolve_threshold,
            match_threshold: self.match_threshold,
        }
    }
}

/// Session bookkeeping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session TTL in seconds
    #[serde(rename = "ttl-secs")]
    pub ttl_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: session::DEFAULT_SESSION_TTL_SECS,
        }
    }
}
