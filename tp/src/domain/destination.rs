//! Destination and coordinate types

use serde::{Deserialize, Serialize};

/// How a destination's coordinates were obtained
///
/// Every coordinate pair carries its source tier so downstream code and
/// tests can tell exactly which tier of the geocoding fallback answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CoordSource {
    /// Bundled reference itinerary
    Reference,
    /// Geocode cache hit
    Cache,
    /// Places-style find-place provider
    Places,
    /// Nominatim-style search provider
    Nominatim,
    /// Chain exhausted, fixed {0,0}
    #[default]
    Fallback,
}

impl std::fmt::Display for CoordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reference => write!(f, "reference"),
            Self::Cache => write!(f, "cache"),
            Self::Places => write!(f, "places"),
            Self::Nominatim => write!(f, "nominatim"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Geographic coordinates with provenance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
    pub source: CoordSource,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64, source: CoordSource) -> Self {
        Self { lat, lng, source }
    }

    /// The fixed origin fallback used when every geocoding tier fails
    pub fn fallback() -> Self {
        Self::new(0.0, 0.0, CoordSource::Fallback)
    }
}

/// One stop on the itinerary
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Destination {
    /// Canonical id: UUIDv4-shaped, an opaque place id, or a legacy numeric string
    pub id: String,

    /// Display name, e.g. "Tokyo, Japan"
    pub name: String,

    pub city: String,

    pub country: String,

    #[serde(default)]
    pub region: String,

    pub coordinates: Coordinates,

    /// Length of the stay; at least 1
    pub duration_days: u32,

    #[serde(default)]
    pub activity_type: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub notes: String,

    /// Id this destination was known by in a prior data model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airport_code: Option<String>,
}

impl Destination {
    /// Create a destination with the required fields
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        city: impl Into<String>,
        country: impl Into<String>,
        duration_days: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            city: city.into(),
            country: country.into(),
            duration_days,
            ..Default::default()
        }
    }

    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = coordinates;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_activity_type(mut self, activity_type: impl Into<String>) -> Self {
        self.activity_type = activity_type.into();
        self
    }

    pub fn with_legacy_id(mut self, legacy_id: impl Into<String>) -> Self {
        self.legacy_id = Some(legacy_id.into());
        self
    }

    /// "city, country" alias string, empty when either part is missing
    pub fn city_country(&self) -> String {
        if self.city.is_empty() || self.country.is_empty() {
            String::new()
        } else {
            format!("{}, {}", self.city, self.country)
        }
    }
}

/// Case-insensitive match of a destination by display name or city
///
/// The single matching rule shared by add/remove/update so the three
/// operations cannot drift apart.
pub fn matches_name_or_city(destination: &Destination, needle: &str) -> bool {
    destination.name.eq_ignore_ascii_case(needle) || destination.city.eq_ignore_ascii_case(needle)
}

/// Index of the first destination satisfying the predicate
pub fn find_index<P>(destinations: &[Destination], predicate: P) -> Option<usize>
where
    P: Fn(&Destination) -> bool,
{
    destinations.iter().position(predicate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_source_display() {
        assert_eq!(CoordSource::Reference.to_string(), "reference");
        assert_eq!(CoordSource::Fallback.to_string(), "fallback");
        assert_eq!(CoordSource::Nominatim.to_string(), "nominatim");
    }

    #[test]
    fn test_fallback_coordinates() {
        let coords = Coordinates::fallback();
        assert_eq!(coords.lat, 0.0);
        assert_eq!(coords.lng, 0.0);
        assert_eq!(coords.source, CoordSource::Fallback);
    }

    #[test]
    fn test_city_country_alias() {
        let dest = Destination::new("1", "Tokyo, Japan", "Tokyo", "Japan", 3);
        assert_eq!(dest.city_country(), "Tokyo, Japan");

        let partial = Destination::new("2", "Somewhere", "", "Japan", 1);
        assert_eq!(partial.city_country(), "");
    }

    #[test]
    fn test_matches_name_or_city_case_insensitive() {
        let dest = Destination::new("1", "Kyoto", "Kyoto", "Japan", 2);
        assert!(matches_name_or_city(&dest, "kyoto"));
        assert!(matches_name_or_city(&dest, "KYOTO"));
        assert!(!matches_name_or_city(&dest, "Japan"));
    }

    #[test]
    fn test_find_index_first_match() {
        let destinations = vec![
            Destination::new("1", "Paris", "Paris", "France", 3),
            Destination::new("2", "Paris", "Paris", "France", 2),
        ];
        let idx = find_index(&destinations, |d| matches_name_or_city(d, "paris"));
        assert_eq!(idx, Some(0));
    }

    #[test]
    fn test_find_index_no_match() {
        let destinations = vec![Destination::new("1", "Paris", "Paris", "France", 3)];
        assert_eq!(find_index(&destinations, |d| matches_name_or_city(d, "Rome")), None);
    }

    #[test]
    fn test_destination_serde_roundtrip() {
        let dest = Destination::new("550e8400-e29b-41d4-a716-446655440000", "Tokyo, Japan", "Tokyo", "Japan", 4)
            .with_coordinates(Coordinates::new(35.6762, 139.6503, CoordSource::Places))
            .with_region("Kanto")
            .with_legacy_id("3");

        let json = serde_json::to_string(&dest).unwrap();
        let back: Destination = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, dest.id);
        assert_eq!(back.coordinates.source, CoordSource::Places);
        assert_eq!(back.legacy_id, Some("3".to_string()));
    }

    #[test]
    fn test_optional_fields_omitted_from_json() {
        let dest = Destination::new("1", "Rome", "Rome", "Italy", 2);
        let json = serde_json::to_string(&dest).unwrap();
        assert!(!json.contains("legacy_id"));
        assert!(!json.contains("airport_code"));
    }
}
