//! Bundled reference itinerary
//!
//! A curated prior itinerary compiled into the binary. When a user adds a
//! destination we have seen before, its region, activity type, description,
//! highlights, and coordinates seed the new entry without any network call.

use serde::Deserialize;
use tracing::debug;

/// Embedded reference dataset
const REFERENCE_ITINERARY: &str = r#"
destinations:
  - name: "Tokyo, Japan"
    city: Tokyo
    country: Japan
    region: Kanto
    activity_type: city
    description: "Dense, neon-lit megacity mixing centuries-old shrines with cutting-edge tech districts."
    highlights:
      - Senso-ji temple
      - Shibuya crossing
      - Tsukiji outer market
    lat: 35.6762
    lng: 139.6503
  - name: "Kyoto, Japan"
    city: Kyoto
    country: Japan
    region: Kansai
    activity_type: culture
    description: "Former imperial capital with over a thousand temples, gardens, and geisha districts."
    highlights:
      - Fushimi Inari shrine
      - Arashiyama bamboo grove
      - Gion district
    lat: 35.0116
    lng: 135.7681
  - name: "Osaka, Japan"
    city: Osaka
    country: Japan
    region: Kansai
    activity_type: food
    description: "Japan's kitchen; street food, castle grounds, and a famously direct local culture."
    highlights:
      - Dotonbori
      - Osaka Castle
      - Kuromon market
    lat: 34.6937
    lng: 135.5023
  - name: "Paris, France"
    city: Paris
    country: France
    region: Ile-de-France
    activity_type: city
    description: "Museums, cafes, and walkable arrondissements along the Seine."
    highlights:
      - Louvre
      - Musee d'Orsay
      - Montmartre
    lat: 48.8566
    lng: 2.3522
  - name: "Rome, Italy"
    city: Rome
    country: Italy
    region: Lazio
    activity_type: history
    description: "Layered ancient, renaissance, and baroque city built around the Forum and the Vatican."
    highlights:
      - Colosseum
      - Pantheon
      - Trastevere
    lat: 41.9028
    lng: 12.4964
  - name: "Barcelona, Spain"
    city: Barcelona
    country: Spain
    region: Catalonia
    activity_type: city
    description: "Gaudi architecture, beach access, and late-night food culture on the Mediterranean."
    highlights:
      - Sagrada Familia
      - Park Guell
      - Gothic Quarter
    lat: 41.3874
    lng: 2.1686
  - name: "Bangkok, Thailand"
    city: Bangkok
    country: Thailand
    region: Central Thailand
    activity_type: city
    description: "River-laced capital of temples, markets, and the region's best street food."
    highlights:
      - Grand Palace
      - Wat Arun
      - Chatuchak market
    lat: 13.7563
    lng: 100.5018
"#;

/// One destination in the reference dataset
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceDestination {
    pub name: String,
    pub city: String,
    pub country: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub activity_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
struct ReferenceFile {
    destinations: Vec<ReferenceDestination>,
}

/// Parsed reference dataset with name/city lookup
pub struct ReferenceData {
    destinations: Vec<ReferenceDestination>,
}

impl ReferenceData {
    /// Parse the embedded dataset
    ///
    /// The asset is compiled in, so a parse failure is a build defect; it
    /// degrades to an empty dataset rather than failing the service.
    pub fn bundled() -> Self {
        let destinations = match serde_yaml::from_str::<ReferenceFile>(REFERENCE_ITINERARY) {
            Ok(file) => file.destinations,
            Err(e) => {
                tracing::error!(error = %e, "ReferenceData::bundled: embedded dataset failed to parse");
                Vec::new()
            }
        };
        Self { destinations }
    }

    /// Construct from explicit entries (tests)
    pub fn from_entries(destinations: Vec<ReferenceDestination>) -> Self {
        Self { destinations }
    }

    /// Look up by exact name first, then by city, case-insensitively
    pub fn lookup(&self, name: &str, city: &str) -> Option<&ReferenceDestination> {
        if let Some(hit) = self.destinations.iter().find(|d| d.name.eq_ignore_ascii_case(name)) {
            debug!(%name, "ReferenceData::lookup: name hit");
            return Some(hit);
        }
        if !city.is_empty()
            && let Some(hit) = self.destinations.iter().find(|d| d.city.eq_ignore_ascii_case(city))
        {
            debug!(%city, "ReferenceData::lookup: city hit");
            return Some(hit);
        }
        None
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }
}
