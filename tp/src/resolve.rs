//! Destination identity resolution
//!
//! Destination identifiers arrive from several inconsistent sources: user
//! text, legacy numeric ids, and LLM-generated research JSON. This module
//! funnels all of them to one canonical id per destination. Resolution is
//! tiered: an already-valid id passes through, then an exact alias lookup,
//! then a free-text scan, then a fuzzy match. Lenient mode never fails; it
//! returns `None` and the caller flags the record orphaned.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{CostItem, Destination};

/// Fuzzy acceptance threshold for identifier resolution
pub const DEFAULT_RESOLVE_THRESHOLD: f64 = 0.7;

/// Fuzzy acceptance threshold for the general best-match helper
///
/// Deliberately looser than [`DEFAULT_RESOLVE_THRESHOLD`]: callers must
/// know which mode they are in.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

/// Placeholder id for cost items whose destination cannot be derived at all
pub const UNKNOWN_DESTINATION: &str = "unknown_destination";

/// Opaque place-identifier prefixes accepted as canonical
const PLACE_ID_PREFIXES: &[&str] = &["ChIJ", "GhIJ", "EiQ"];

/// Caller-facing resolution options
///
/// `resolve_threshold` gates identifier resolution; `match_threshold`
/// gates the looser general-purpose [`find_best_match`]. Call sites pick
/// one explicitly.
#[derive(Debug, Clone, Copy)]
pub struct ResolverOptions {
    pub auto_resolve: bool,
    pub strict: bool,
    pub resolve_threshold: f64,
    pub match_threshold: f64,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            auto_resolve: true,
            strict: false,
            resolve_threshold: DEFAULT_RESOLVE_THRESHOLD,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

/// Errors from strict-mode resolution
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Cannot resolve destination identifier {identifier:?}; known destinations: {}", .known.join(", "))]
    ResolutionFailure { identifier: String, known: Vec<String> },
}

/// UUIDv4-shaped string, case-insensitive
pub fn is_uuid(value: &str) -> bool {
    uuid::Uuid::parse_str(value).map(|u| u.get_version_num() == 4).unwrap_or(false)
}

/// Opaque place identifier with a recognized prefix
pub fn is_place_id(value: &str) -> bool {
    PLACE_ID_PREFIXES.iter().any(|prefix| value.starts_with(prefix))
}

/// Canonical destination id: UUIDv4-shaped or a recognized place id
pub fn is_valid_destination_id(value: &str) -> bool {
    is_uuid(value) || is_place_id(value)
}

/// Lowercase, strip non-word characters, collapse whitespace/hyphen runs
/// to underscores
pub fn slugify(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                ' '
            } else {
                '\u{0}'
            }
        })
        .filter(|c| *c != '\u{0}')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Build the per-itinerary alias table: alias -> canonical id
///
/// For every destination with a valid id, registers the id itself
/// (lowercased), the lowercase display name, its slug, the stored legacy id,
/// and the "city, country" string plus its slug. First registration wins;
/// a later destination does not steal an alias that already points at a
/// different id.
pub fn build_lookup(destinations: &[Destination]) -> HashMap<String, String> {
    let mut lookup = HashMap::new();

    for destination in destinations {
        if !is_valid_destination_id(&destination.id) {
            debug!(id = %destination.id, name = %destination.name, "build_lookup: skipping invalid id");
            continue;
        }

        let mut aliases = vec![
            destination.id.to_lowercase(),
            destination.name.to_lowercase(),
            slugify(&destination.name),
        ];
        if let Some(legacy) = &destination.legacy_id {
            aliases.push(legacy.to_lowercase());
        }
        let city_country = destination.city_country();
        if !city_country.is_empty() {
            aliases.push(city_country.to_lowercase());
            aliases.push(slugify(&city_country));
        }

        for alias in aliases {
            if alias.is_empty() {
                continue;
            }
            match lookup.get(&alias) {
                Some(existing) if existing != &destination.id => {
                    debug!(%alias, existing = %existing, skipped = %destination.id, "build_lookup: alias collision, first registration wins");
                }
                Some(_) => {}
                None => {
                    lookup.insert(alias, destination.id.clone());
                }
            }
        }
    }

    lookup
}

/// Best fuzzy match of a query against destination names
///
/// Returns the index and score of the highest-scoring destination whose
/// normalized similarity to the query exceeds `threshold`.
pub fn find_best_match(query: &str, destinations: &[Destination], threshold: f64) -> Option<(usize, f64)> {
    let query = query.to_lowercase();
    let mut best: Option<(usize, f64)> = None;

    for (idx, destination) in destinations.iter().enumerate() {
        let score = strsim::normalized_levenshtein(&query, &destination.name.to_lowercase());
        if score > best.map(|(_, s)| s).unwrap_or(0.0) {
            best = Some((idx, score));
        }
    }

    best.filter(|(_, score)| *score > threshold)
}

/// Resolve a cost item's destination identifier to a canonical id
///
/// Tiers, first hit wins:
/// 1. an already-valid `destination_id` is returned unchanged;
/// 2. exact, case-insensitive alias lookup of the raw identifier;
/// 3. free-text scan of the item's description/notes for a destination
///    name (destination list order breaks ties);
/// 4. fuzzy match against destination names above `threshold`.
///
/// Strict mode turns exhaustion into a `ResolutionFailure`; lenient mode
/// returns `Ok(None)` and the caller marks the item orphaned.
pub fn resolve(
    item: &CostItem,
    destinations: &[Destination],
    strict: bool,
    threshold: f64,
) -> Result<Option<String>, ResolveError> {
    let raw = item.destination_id.clone().unwrap_or_default();

    if is_valid_destination_id(&raw) {
        return Ok(Some(raw));
    }

    if !raw.is_empty() {
        let lookup = build_lookup(destinations);
        if let Some(canonical) = lookup.get(&raw.to_lowercase()) {
            debug!(%raw, %canonical, "resolve: exact alias match");
            return Ok(Some(canonical.clone()));
        }
    }

    // Free-text scan: first listed destination wins ties
    let description = item.description.to_lowercase();
    let notes = item.notes.to_lowercase();
    for destination in destinations {
        let name = destination.name.to_lowercase();
        if name.is_empty() {
            continue;
        }
        if description.contains(&name) || notes.contains(&name) {
            debug!(%raw, matched = %destination.name, "resolve: free-text match");
            return Ok(Some(destination.id.clone()));
        }
    }

    if !raw.is_empty()
        && let Some((idx, score)) = find_best_match(&raw, destinations, threshold)
    {
        debug!(%raw, matched = %destinations[idx].name, score, "resolve: fuzzy match");
        return Ok(Some(destinations[idx].id.clone()));
    }

    if strict {
        return Err(ResolveError::ResolutionFailure {
            identifier: raw,
            known: destinations.iter().map(|d| d.name.clone()).collect(),
        });
    }

    Ok(None)
}

/// Validate an item's destination link, repairing it when possible
///
/// No-op when the id is already valid. On successful auto-resolution the
/// item is tagged (`_auto_resolved`, `_legacy_destination_id`) and a warning
/// string describing the repair is returned. On lenient-mode failure the
/// original id stays in place, the item is flagged orphaned, and a warning
/// is returned; the item is never dropped.
pub fn validate_and_resolve(
    item: &mut CostItem,
    destinations: &[Destination],
    auto_resolve: bool,
    strict: bool,
    threshold: f64,
) -> Result<Option<String>, ResolveError> {
    let raw = item.destination_id.clone().unwrap_or_default();

    if is_valid_destination_id(&raw) {
        return Ok(None);
    }
    if !auto_resolve {
        return Ok(None);
    }

    match resolve(item, destinations, strict, threshold)? {
        Some(canonical) => {
            let warning = format!(
                "cost item {}: destination id {:?} auto-resolved to {}",
                item.id, raw, canonical
            );
            item.legacy_destination_id = Some(raw);
            item.destination_id = Some(canonical);
            item.auto_resolved = Some(true);
            Ok(Some(warning))
        }
        None => {
            let warning = format!(
                "cost item {}: destination id {:?} could not be resolved; item is orphaned",
                item.id, raw
            );
            warn!(item = %item.id, id = %raw, "validate_and_resolve: unresolved, item orphaned");
            item.orphaned = Some(true);
            Ok(Some(warning))
        }
    }
}

/// Validate every item in a batch, collecting warnings
///
/// Applies [`validate_and_resolve`] to each item. Items are repaired or
/// flagged in place; none are removed. Strict mode propagates the first
/// resolution failure.
pub fn validate_cost_items(
    items: &mut [CostItem],
    destinations: &[Destination],
    auto_resolve: bool,
    strict: bool,
    threshold: f64,
) -> Result<Vec<String>, ResolveError> {
    let mut warnings = Vec::new();

    for item in items.iter_mut() {
        if let Some(warning) = validate_and_resolve(item, destinations, auto_resolve, strict, threshold)? {
            warnings.push(warning);
        }
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const U1: &str = "550e8400-e29b-41d4-a716-446655440000";
    const U2: &str = "6ba7b814-9dad-41d1-80b4-00c04fd430c8";

    fn sample_destinations() -> Vec<Destination> {
        vec![
            Destination::new(U1, "Tokyo, Japan", "Tokyo", "Japan", 4).with_legacy_id("3"),
            Destination::new(U2, "Paris, France", "Paris", "France", 3),
        ]
    }

    fn item_with_id(id: &str) -> CostItem {
        CostItem {
            id: "test_item".to_string(),
            destination_id: Some(id.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_uuid() {
        assert!(is_uuid("550e8400-e29b-41d4-a716-446655440000"));
        assert!(is_uuid("550E8400-E29B-41D4-A716-446655440000"));
        assert!(!is_uuid("tokyo_japan"));
        // v1 UUID: right shape, wrong version
        assert!(!is_uuid("550e8400-e29b-11d4-a716-446655440000"));
    }

    #[test]
    fn test_is_place_id() {
        assert!(is_place_id("ChIJN1t_tDeuEmsRUsoyG83frY4"));
        assert!(is_place_id("GhIJQWDl0CIeQUARxks3icF8U8A"));
        assert!(!is_place_id("tokyo"));
        assert!(!is_place_id(""));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Tokyo, Japan"), "tokyo_japan");
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("New York City"), "new_york_city");
        assert_eq!(slugify("Aix-en-Provence"), "aix_en_provence");
        assert_eq!(slugify("  spaced   out  "), "spaced_out");
    }

    #[test]
    fn test_build_lookup_registers_all_aliases() {
        let lookup = build_lookup(&sample_destinations());

        assert_eq!(lookup.get(&U1.to_lowercase()), Some(&U1.to_string()));
        assert_eq!(lookup.get("tokyo, japan"), Some(&U1.to_string()));
        assert_eq!(lookup.get("tokyo_japan"), Some(&U1.to_string()));
        assert_eq!(lookup.get("3"), Some(&U1.to_string()));
        assert_eq!(lookup.get("paris, france"), Some(&U2.to_string()));
        assert_eq!(lookup.get("paris_france"), Some(&U2.to_string()));
    }

    #[test]
    fn test_build_lookup_skips_invalid_ids() {
        let destinations = vec![Destination::new("42", "Somewhere", "Somewhere", "Nowhere", 1)];
        let lookup = build_lookup(&destinations);
        assert!(lookup.is_empty());
    }

    #[test]
    fn test_build_lookup_first_registration_wins() {
        let destinations = vec![
            Destination::new(U1, "Paris", "Paris", "France", 2),
            Destination::new(U2, "Paris", "Paris", "Texas", 1),
        ];
        let lookup = build_lookup(&destinations);
        // "paris" was claimed by the first destination
        assert_eq!(lookup.get("paris"), Some(&U1.to_string()));
        // the second destination still owns its own id
        assert_eq!(lookup.get(&U2.to_lowercase()), Some(&U2.to_string()));
    }

    #[test]
    fn test_resolve_valid_id_passes_through() {
        let item = item_with_id("ChIJN1t_tDeuEmsRUsoyG83frY4");
        let resolved = resolve(&item, &sample_destinations(), false, DEFAULT_RESOLVE_THRESHOLD).unwrap();
        assert_eq!(resolved, Some("ChIJN1t_tDeuEmsRUsoyG83frY4".to_string()));
    }

    #[test]
    fn test_resolve_slug_alias() {
        let item = item_with_id("tokyo_japan");
        let resolved = resolve(&item, &sample_destinations(), false, DEFAULT_RESOLVE_THRESHOLD).unwrap();
        assert_eq!(resolved, Some(U1.to_string()));
    }

    #[test]
    fn test_resolve_legacy_numeric_alias() {
        let item = item_with_id("3");
        let resolved = resolve(&item, &sample_destinations(), false, DEFAULT_RESOLVE_THRESHOLD).unwrap();
        assert_eq!(resolved, Some(U1.to_string()));
    }

    #[test]
    fn test_resolve_free_text_scan() {
        let mut item = item_with_id("mystery");
        item.notes = "Hotel booking near Paris, France city centre".to_string();
        let resolved = resolve(&item, &sample_destinations(), false, DEFAULT_RESOLVE_THRESHOLD).unwrap();
        assert_eq!(resolved, Some(U2.to_string()));
    }

    #[test]
    fn test_resolve_fuzzy_above_threshold() {
        let item = item_with_id("Tokyo Japan");
        let resolved = resolve(&item, &sample_destinations(), false, DEFAULT_RESOLVE_THRESHOLD).unwrap();
        assert_eq!(resolved, Some(U1.to_string()));
    }

    #[test]
    fn test_resolve_lenient_returns_none() {
        let item = item_with_id("unknown_city");
        let resolved = resolve(&item, &sample_destinations(), false, DEFAULT_RESOLVE_THRESHOLD).unwrap();
        assert_eq!(resolved, None);
    }

    #[test]
    fn test_resolve_strict_fails_with_context() {
        let item = item_with_id("unknown_city");
        let err = resolve(&item, &sample_destinations(), true, DEFAULT_RESOLVE_THRESHOLD).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("unknown_city"));
        assert!(message.contains("Tokyo, Japan"));
        assert!(message.contains("Paris, France"));
    }

    #[test]
    fn test_find_best_match_threshold_modes() {
        let destinations = sample_destinations();
        // close but not close enough for the strict threshold
        let query = "Tokio Japan";
        let strict = find_best_match(query, &destinations, DEFAULT_RESOLVE_THRESHOLD);
        let loose = find_best_match(query, &destinations, DEFAULT_MATCH_THRESHOLD);
        assert!(loose.is_some());
        // the strict result, when present, must agree with the loose one
        if let Some((idx, _)) = strict {
            assert_eq!(idx, loose.unwrap().0);
        }
        assert!(find_best_match("zzzzzz", &destinations, DEFAULT_MATCH_THRESHOLD).is_none());
    }

    #[test]
    fn test_validate_and_resolve_tags_repair() {
        let mut item = item_with_id("tokyo_japan");
        let warning = validate_and_resolve(
            &mut item,
            &sample_destinations(),
            true,
            false,
            DEFAULT_RESOLVE_THRESHOLD,
        )
        .unwrap();

        assert!(warning.unwrap().contains("auto-resolved"));
        assert_eq!(item.destination_id, Some(U1.to_string()));
        assert_eq!(item.auto_resolved, Some(true));
        assert_eq!(item.legacy_destination_id, Some("tokyo_japan".to_string()));
    }

    #[test]
    fn test_validate_and_resolve_noop_on_valid_id() {
        let mut item = item_with_id(U2);
        let warning = validate_and_resolve(
            &mut item,
            &sample_destinations(),
            true,
            false,
            DEFAULT_RESOLVE_THRESHOLD,
        )
        .unwrap();
        assert!(warning.is_none());
        assert!(item.auto_resolved.is_none());
    }

    #[test]
    fn test_validate_cost_items_never_drops() {
        let mut items = vec![
            item_with_id("tokyo_japan"),
            item_with_id("atlantis"),
            item_with_id(U1),
        ];
        let warnings = validate_cost_items(
            &mut items,
            &sample_destinations(),
            true,
            false,
            DEFAULT_RESOLVE_THRESHOLD,
        )
        .unwrap();

        assert_eq!(items.len(), 3);
        // one auto-resolution, one orphan
        assert_eq!(warnings.len(), 2);
        assert_eq!(items[1].orphaned, Some(true));
        assert_eq!(items[1].destination_id, Some("atlantis".to_string()));
    }
}
