//! Itinerary mutation service
//!
//! Owns the canonical ordered destination list for each session and applies
//! add/remove/update-duration/update as single atomic list transformations,
//! each followed by one remote persistence call. The local cached copy is
//! only updated after the remote store reports success; a failed write
//! leaves both copies untouched and surfaces the store's message verbatim.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use docstore::{DocStore, ITINERARY_DOC_KEY, StoreError};

use crate::domain::{
    CoordSource, Coordinates, Destination, TripDocument, find_index, matches_name_or_city,
};
use crate::geocode::{GeoCache, GeoPoint, GeocodeChain};
use crate::reference::{ReferenceData, ReferenceDestination};
use crate::resolve::{ResolverOptions, find_best_match};
use crate::session::{CallContext, SessionMap, SessionState};

/// Errors from itinerary mutations
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No destination matching {name:?} in the itinerary")]
    NotFound { name: String },

    /// The remote store reported failure; message passed through verbatim
    #[error("Persistence failed: {0}")]
    PersistFailed(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Request body for the add operation
#[derive(Debug, Clone, Default)]
pub struct AddDestination {
    pub name: String,
    pub city: String,
    pub country: String,
    pub duration_days: u32,
    pub activity_type: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    /// Insert immediately after the first destination whose name or city
    /// equals this; append at the end when absent or unmatched
    pub insert_after: Option<String>,
}

/// Sparse field updates for the update operation; unset fields are left
/// untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateFields {
    pub city: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub duration_days: Option<u32>,
    pub activity_type: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub airport_code: Option<String>,
}

/// Mutation response envelope
#[derive(Debug, Clone, Serialize)]
pub struct MutationResponse {
    pub status: String,

    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<Destination>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<usize>,
}

impl MutationResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            destination: None,
            removed: None,
        }
    }

    fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = Some(destination);
        self
    }

    fn with_removed(mut self, removed: usize) -> Self {
        self.removed = Some(removed);
        self
    }
}

/// Assign the next free destination id
///
/// One more than the largest numeric id present; the current Unix timestamp
/// when no id is numeric (including the empty itinerary).
fn next_destination_id(destinations: &[Destination]) -> String {
    destinations
        .iter()
        .filter_map(|d| d.id.parse::<i64>().ok())
        .max()
        .map(|max| (max + 1).to_string())
        .unwrap_or_else(|| Utc::now().timestamp().to_string())
}

/// The itinerary mutation service
pub struct ItineraryService {
    store: Arc<dyn DocStore>,
    chain: GeocodeChain,
    reference: ReferenceData,
    geocache: Mutex<GeoCache>,
    resolver: ResolverOptions,
    sessions: Mutex<SessionMap>,
    /// Local cached copy per session, synchronized after successful writes
    local: Mutex<HashMap<String, TripDocument>>,
}

impl ItineraryService {
    pub fn new(
        store: Arc<dyn DocStore>,
        chain: GeocodeChain,
        reference: ReferenceData,
        geocache: GeoCache,
        resolver: ResolverOptions,
        sessions: SessionMap,
    ) -> Self {
        Self {
            store,
            chain,
            reference,
            geocache: Mutex::new(geocache),
            resolver,
            sessions: Mutex::new(sessions),
            local: Mutex::new(HashMap::new()),
        }
    }

    /// Remember the scenario selected for this session's cost writes
    pub fn remember_scenario(&self, ctx: &CallContext, scenario_id: impl Into<String>) {
        let session_id = ctx.session_id();
        let mut sessions = self.sessions.lock().unwrap();
        let mut state: SessionState = sessions.get(&session_id).unwrap_or_default();
        state.scenario_id = Some(scenario_id.into());
        sessions.put(session_id, state);
    }

    /// Scenario previously selected for this session, if any
    pub fn scenario_for(&self, ctx: &CallContext) -> Option<String> {
        self.sessions
            .lock()
            .unwrap()
            .get(&ctx.session_id())
            .and_then(|state| state.scenario_id)
    }

    /// Drop all session state (tests and shutdown)
    pub fn clear_sessions(&self) {
        self.sessions.lock().unwrap().clear();
    }

    /// Read the current itinerary: remote first, local cache as fallback
    ///
    /// A remote document that no longer parses is treated as absent rather
    /// than failing the mutation; legacy data gets best-effort handling
    /// only.
    async fn load(&self, session_id: &str) -> TripDocument {
        match self.store.get_document(session_id, ITINERARY_DOC_KEY).await {
            Ok(Some(value)) => match serde_json::from_value::<TripDocument>(value) {
                Ok(doc) => return doc,
                Err(e) => {
                    warn!(%session_id, error = %e, "load: stored document failed to parse, using cached copy");
                }
            },
            Ok(None) => {
                debug!(%session_id, "load: no remote document");
            }
            Err(e) => {
                warn!(%session_id, error = %e, "load: remote read failed, using cached copy");
            }
        }
        self.local.lock().unwrap().get(session_id).cloned().unwrap_or_default()
    }

    /// Write the document remotely; update the local cache only on success
    async fn persist(&self, session_id: &str, doc: TripDocument) -> Result<(), MutationError> {
        let value = serde_json::to_value(&doc)
            .map_err(|e| MutationError::Validation(format!("document serialization failed: {e}")))?;

        let response = self.store.put_document(session_id, ITINERARY_DOC_KEY, value).await?;
        if !response.is_success() {
            return Err(MutationError::PersistFailed(response.message));
        }

        self.local.lock().unwrap().insert(session_id.to_string(), doc);
        Ok(())
    }

    /// Resolve coordinates through the ordered fallback chain
    ///
    /// Reference data, then the geocache (four key shapes), then the
    /// provider chain, then the fixed `{0,0}` fallback. The returned
    /// coordinates always carry the tier that produced them.
    async fn resolve_coordinates(
        &self,
        name: &str,
        city: &str,
        country: &str,
        reference: Option<&ReferenceDestination>,
    ) -> Coordinates {
        if let Some(entry) = reference {
            debug!(%name, "resolve_coordinates: reference data hit");
            return Coordinates::new(entry.lat, entry.lng, CoordSource::Reference);
        }

        let cache_keys = [
            format!("{city}, {country}"),
            format!("{name}, {country}"),
            name.to_string(),
            city.to_string(),
        ];
        {
            let mut cache = self.geocache.lock().unwrap();
            for key in &cache_keys {
                if key.trim_matches(|c: char| c == ',' || c.is_whitespace()).is_empty() {
                    continue;
                }
                if let Some(point) = cache.get(&key.to_lowercase()) {
                    debug!(%key, "resolve_coordinates: geocache hit");
                    return Coordinates::new(point.lat, point.lng, CoordSource::Cache);
                }
            }
        }

        let query = if !city.is_empty() {
            format!("{city}, {country}")
        } else {
            format!("{name}, {country}")
        };

        if let Some((point, source)) = self.chain.locate(&query).await {
            self.geocache
                .lock()
                .unwrap()
                .insert(query.to_lowercase(), point.clone());
            return Coordinates::new(point.lat, point.lng, source);
        }

        warn!(%name, %city, "resolve_coordinates: all tiers failed, using fallback");
        Coordinates::fallback()
    }

    /// Add a destination to the itinerary
    ///
    /// Reference data seeds region, activity type, description, and notes
    /// when the destination is known; request-supplied fields always win.
    /// Geocoding exhaustion never fails the operation.
    pub async fn add(&self, ctx: &CallContext, request: AddDestination) -> Result<MutationResponse, MutationError> {
        if request.name.trim().is_empty() {
            return Err(MutationError::Validation("destination name is required".to_string()));
        }
        if request.duration_days < 1 {
            return Err(MutationError::Validation("duration_days must be at least 1".to_string()));
        }

        let session_id = ctx.session_id();
        let mut doc = self.load(&session_id).await;

        let reference = self.reference.lookup(&request.name, &request.city);
        let coordinates = self
            .resolve_coordinates(&request.name, &request.city, &request.country, reference)
            .await;

        let id = next_destination_id(&doc.locations);
        let mut destination =
            Destination::new(id, &request.name, &request.city, &request.country, request.duration_days)
                .with_coordinates(coordinates);

        if let Some(entry) = reference {
            destination.region = entry.region.clone();
            destination.activity_type = entry.activity_type.clone();
            destination.description = entry.description.clone();
            destination.notes = entry.highlights.join("; ");
        }
        if let Some(activity_type) = request.activity_type {
            destination.activity_type = activity_type;
        }
        if let Some(description) = request.description {
            destination.description = description;
        }
        if let Some(notes) = request.notes {
            destination.notes = notes;
        }

        let position = request
            .insert_after
            .as_deref()
            .and_then(|after| find_index(&doc.locations, |d| matches_name_or_city(d, after)));
        match position {
            Some(idx) => doc.locations.insert(idx + 1, destination.clone()),
            None => doc.locations.push(destination.clone()),
        }

        self.persist(&session_id, doc).await?;
        info!(%session_id, name = %destination.name, id = %destination.id, source = %destination.coordinates.source, "add: destination added");

        Ok(MutationResponse::success(format!("Added {} to the itinerary", destination.name))
            .with_destination(destination))
    }

    /// Remove destinations by name or city
    ///
    /// Removes every destination whose name or city matches, not just the
    /// first. Duplicate stops sharing a city all go at once; this asymmetry
    /// with `update`/`update_duration` is intentional and pinned by tests.
    pub async fn remove(&self, ctx: &CallContext, destination_name: &str) -> Result<MutationResponse, MutationError> {
        let session_id = ctx.session_id();
        let mut doc = self.load(&session_id).await;

        let before = doc.locations.len();
        doc.locations.retain(|d| !matches_name_or_city(d, destination_name));
        let removed = before - doc.locations.len();

        if removed == 0 {
            return Err(MutationError::NotFound {
                name: destination_name.to_string(),
            });
        }

        self.persist(&session_id, doc).await?;
        info!(%session_id, name = %destination_name, removed, "remove: destinations removed");

        Ok(MutationResponse::success(format!(
            "Removed {removed} destination(s) matching {destination_name:?}"
        ))
        .with_removed(removed))
    }

    /// Update the stay length of the first matching destination
    ///
    /// Durations below 1 are rejected: a stop that exists takes at least a
    /// day, and remove is the operation for dropping one.
    pub async fn update_duration(
        &self,
        ctx: &CallContext,
        destination_name: &str,
        new_duration_days: u32,
    ) -> Result<MutationResponse, MutationError> {
        if new_duration_days < 1 {
            return Err(MutationError::Validation(
                "duration_days must be at least 1; use remove to drop a destination".to_string(),
            ));
        }

        let session_id = ctx.session_id();
        let mut doc = self.load(&session_id).await;

        let idx = find_index(&doc.locations, |d| matches_name_or_city(d, destination_name)).ok_or_else(|| {
            MutationError::NotFound {
                name: destination_name.to_string(),
            }
        })?;

        doc.locations[idx].duration_days = new_duration_days;
        let updated = doc.locations[idx].clone();

        self.persist(&session_id, doc).await?;
        info!(%session_id, name = %updated.name, new_duration_days, "update_duration: updated");

        Ok(MutationResponse::success(format!(
            "Set {} to {} day(s)",
            updated.name, new_duration_days
        ))
        .with_destination(updated))
    }

    /// Merge sparse field updates into the first matching destination
    pub async fn update(
        &self,
        ctx: &CallContext,
        destination_name: &str,
        fields: UpdateFields,
    ) -> Result<MutationResponse, MutationError> {
        if let Some(days) = fields.duration_days
            && days < 1
        {
            return Err(MutationError::Validation(
                "duration_days must be at least 1".to_string(),
            ));
        }

        let session_id = ctx.session_id();
        let mut doc = self.load(&session_id).await;

        let idx = find_index(&doc.locations, |d| matches_name_or_city(d, destination_name)).ok_or_else(|| {
            MutationError::NotFound {
                name: destination_name.to_string(),
            }
        })?;

        let destination = &mut doc.locations[idx];
        if let Some(city) = fields.city {
            destination.city = city;
        }
        if let Some(country) = fields.country {
            destination.country = country;
        }
        if let Some(region) = fields.region {
            destination.region = region;
        }
        if let Some(days) = fields.duration_days {
            destination.duration_days = days;
        }
        if let Some(activity_type) = fields.activity_type {
            destination.activity_type = activity_type;
        }
        if let Some(description) = fields.description {
            destination.description = description;
        }
        if let Some(notes) = fields.notes {
            destination.notes = notes;
        }
        if let Some(airport_code) = fields.airport_code {
            destination.airport_code = Some(airport_code);
        }
        let updated = destination.clone();

        self.persist(&session_id, doc).await?;
        info!(%session_id, name = %updated.name, "update: destination updated");

        Ok(MutationResponse::success(format!("Updated {}", updated.name)).with_destination(updated))
    }

    /// Current itinerary document for a session
    pub async fn current(&self, ctx: &CallContext) -> TripDocument {
        self.load(&ctx.session_id()).await
    }

    /// Fuzzy-find a destination by display name
    ///
    /// Uses the loose match threshold, not the strict resolve threshold.
    pub async fn find_destination(&self, ctx: &CallContext, query: &str) -> Option<Destination> {
        let doc = self.load(&ctx.session_id()).await;
        find_best_match(query, &doc.locations, self.resolver.match_threshold)
            .map(|(idx, _)| doc.locations[idx].clone())
    }

    /// Seed the geocode cache (reference tier tests and warm starts)
    pub fn cache_point(&self, key: impl Into<String>, point: GeoPoint) {
        self.geocache.lock().unwrap().insert(key.into().to_lowercase(), point);
    }

    /// Clear the geocode cache
    pub fn clear_geocache(&self) {
        self.geocache.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::testing::{FailingProvider, FixedProvider};
    use docstore::MemoryDocStore;

    fn service_with(chain: GeocodeChain, store: Arc<MemoryDocStore>) -> ItineraryService {
        ItineraryService::new(
            store,
            chain,
            ReferenceData::from_entries(Vec::new()),
            GeoCache::new(3600),
            ResolverOptions::default(),
            SessionMap::new(3600),
        )
    }

    fn offline_service(store: Arc<MemoryDocStore>) -> ItineraryService {
        service_with(GeocodeChain::empty(), store)
    }

    fn add_request(name: &str, city: &str, country: &str, days: u32) -> AddDestination {
        AddDestination {
            name: name.to_string(),
            city: city.to_string(),
            country: country.to_string(),
            duration_days: days,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_with_no_tiers_falls_back_to_origin() {
        let store = Arc::new(MemoryDocStore::new());
        let service = offline_service(store.clone());
        let ctx = CallContext::for_session("sess-1");

        let response = service.add(&ctx, add_request("Kyoto", "Kyoto", "Japan", 3)).await.unwrap();
        assert_eq!(response.status, "success");

        let destination = response.destination.unwrap();
        assert_eq!(destination.coordinates.lat, 0.0);
        assert_eq!(destination.coordinates.lng, 0.0);
        assert_eq!(destination.coordinates.source, CoordSource::Fallback);
    }

    #[tokio::test]
    async fn test_add_uses_provider_chain_and_tags_source() {
        let store = Arc::new(MemoryDocStore::new());
        let chain = GeocodeChain::new(vec![
            Box::new(FailingProvider::new("places")),
            Box::new(FixedProvider::new("nominatim", CoordSource::Nominatim, 35.0116, 135.7681)),
        ]);
        let service = service_with(chain, store);
        let ctx = CallContext::for_session("sess-1");

        let response = service.add(&ctx, add_request("Kyoto", "Kyoto", "Japan", 3)).await.unwrap();
        let destination = response.destination.unwrap();
        assert_eq!(destination.coordinates.source, CoordSource::Nominatim);
        assert_eq!(destination.coordinates.lat, 35.0116);
    }

    #[tokio::test]
    async fn test_add_prefers_reference_data() {
        let store = Arc::new(MemoryDocStore::new());
        let service = ItineraryService::new(
            store,
            GeocodeChain::empty(),
            ReferenceData::bundled(),
            GeoCache::new(3600),
            ResolverOptions::default(),
            SessionMap::new(3600),
        );
        let ctx = CallContext::for_session("sess-1");

        let response = service
            .add(&ctx, add_request("Tokyo, Japan", "Tokyo", "Japan", 4))
            .await
            .unwrap();
        let destination = response.destination.unwrap();
        assert_eq!(destination.coordinates.source, CoordSource::Reference);
        assert_eq!(destination.region, "Kanto");
        assert!(!destination.description.is_empty());
        assert!(destination.notes.contains("Senso-ji"));
    }

    #[tokio::test]
    async fn test_add_geocache_hit() {
        let store = Arc::new(MemoryDocStore::new());
        let service = offline_service(store);
        service.cache_point(
            "lisbon, portugal",
            GeoPoint {
                lat: 38.7223,
                lng: -9.1393,
                formatted_address: None,
            },
        );
        let ctx = CallContext::for_session("sess-1");

        let response = service
            .add(&ctx, add_request("Lisbon", "Lisbon", "Portugal", 2))
            .await
            .unwrap();
        let destination = response.destination.unwrap();
        assert_eq!(destination.coordinates.source, CoordSource::Cache);
        assert_eq!(destination.coordinates.lat, 38.7223);
    }

    #[tokio::test]
    async fn test_request_fields_override_reference_seed() {
        let store = Arc::new(MemoryDocStore::new());
        let service = ItineraryService::new(
            store,
            GeocodeChain::empty(),
            ReferenceData::bundled(),
            GeoCache::new(3600),
            ResolverOptions::default(),
            SessionMap::new(3600),
        );
        let ctx = CallContext::for_session("sess-1");

        let mut request = add_request("Tokyo, Japan", "Tokyo", "Japan", 4);
        request.activity_type = Some("business".to_string());
        let destination = service.add(&ctx, request).await.unwrap().destination.unwrap();
        assert_eq!(destination.activity_type, "business");
    }

    #[tokio::test]
    async fn test_next_id_increments_numeric_max() {
        let destinations = vec![
            Destination::new("3", "A", "A", "X", 1),
            Destination::new("7", "B", "B", "X", 1),
            Destination::new("550e8400-e29b-41d4-a716-446655440000", "C", "C", "X", 1),
        ];
        assert_eq!(next_destination_id(&destinations), "8");
    }

    #[tokio::test]
    async fn test_next_id_timestamp_when_no_numeric_ids() {
        let destinations = vec![Destination::new("ChIJabc", "A", "A", "X", 1)];
        let id = next_destination_id(&destinations);
        // Unix timestamp, parseable and recent
        assert!(id.parse::<i64>().unwrap() > 1_600_000_000);
    }

    #[tokio::test]
    async fn test_insert_after_positions_destination() {
        let store = Arc::new(MemoryDocStore::new());
        let service = offline_service(store);
        let ctx = CallContext::for_session("sess-1");

        service.add(&ctx, add_request("Tokyo", "Tokyo", "Japan", 3)).await.unwrap();
        service.add(&ctx, add_request("Osaka", "Osaka", "Japan", 2)).await.unwrap();

        let mut request = add_request("Kyoto", "Kyoto", "Japan", 2);
        request.insert_after = Some("Tokyo".to_string());
        service.add(&ctx, request).await.unwrap();

        let doc = service.current(&ctx).await;
        let names: Vec<&str> = doc.locations.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Tokyo", "Kyoto", "Osaka"]);
    }

    #[tokio::test]
    async fn test_insert_after_unmatched_appends() {
        let store = Arc::new(MemoryDocStore::new());
        let service = offline_service(store);
        let ctx = CallContext::for_session("sess-1");

        service.add(&ctx, add_request("Tokyo", "Tokyo", "Japan", 3)).await.unwrap();
        let mut request = add_request("Kyoto", "Kyoto", "Japan", 2);
        request.insert_after = Some("Nowhere".to_string());
        service.add(&ctx, request).await.unwrap();

        let doc = service.current(&ctx).await;
        assert_eq!(doc.locations.last().unwrap().name, "Kyoto");
    }

    #[tokio::test]
    async fn test_add_rejects_zero_duration() {
        let store = Arc::new(MemoryDocStore::new());
        let service = offline_service(store);
        let ctx = CallContext::for_session("sess-1");

        let err = service.add(&ctx, add_request("Tokyo", "Tokyo", "Japan", 0)).await.unwrap_err();
        assert!(matches!(err, MutationError::Validation(_)));
    }

    #[tokio::test]
    async fn test_remove_deletes_all_matches() {
        let store = Arc::new(MemoryDocStore::new());
        let service = offline_service(store);
        let ctx = CallContext::for_session("sess-1");

        service.add(&ctx, add_request("Paris Stop 1", "Paris", "France", 2)).await.unwrap();
        service.add(&ctx, add_request("Lyon", "Lyon", "France", 1)).await.unwrap();
        service.add(&ctx, add_request("Paris Stop 2", "Paris", "France", 3)).await.unwrap();

        let response = service.remove(&ctx, "Paris").await.unwrap();
        assert_eq!(response.removed, Some(2));

        let doc = service.current(&ctx).await;
        assert_eq!(doc.locations.len(), 1);
        assert_eq!(doc.locations[0].name, "Lyon");
    }

    #[tokio::test]
    async fn test_remove_unmatched_is_not_found() {
        let store = Arc::new(MemoryDocStore::new());
        let service = offline_service(store);
        let ctx = CallContext::for_session("sess-1");

        let err = service.remove(&ctx, "Atlantis").await.unwrap_err();
        assert!(matches!(err, MutationError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_touches_first_match_only() {
        let store = Arc::new(MemoryDocStore::new());
        let service = offline_service(store);
        let ctx = CallContext::for_session("sess-1");

        service.add(&ctx, add_request("Paris Stop 1", "Paris", "France", 2)).await.unwrap();
        service.add(&ctx, add_request("Paris Stop 2", "Paris", "France", 3)).await.unwrap();

        service.update_duration(&ctx, "Paris", 5).await.unwrap();

        let doc = service.current(&ctx).await;
        // only the first match changed; remove would have taken both
        assert_eq!(doc.locations[0].duration_days, 5);
        assert_eq!(doc.locations[1].duration_days, 3);
    }

    #[tokio::test]
    async fn test_update_duration_rejects_nonpositive() {
        let store = Arc::new(MemoryDocStore::new());
        let service = offline_service(store);
        let ctx = CallContext::for_session("sess-1");

        service.add(&ctx, add_request("Tokyo", "Tokyo", "Japan", 3)).await.unwrap();
        let err = service.update_duration(&ctx, "Tokyo", 0).await.unwrap_err();
        assert!(matches!(err, MutationError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_merges_sparse_fields() {
        let store = Arc::new(MemoryDocStore::new());
        let service = offline_service(store);
        let ctx = CallContext::for_session("sess-1");

        service.add(&ctx, add_request("Tokyo", "Tokyo", "Japan", 3)).await.unwrap();

        let fields = UpdateFields {
            region: Some("Kanto".to_string()),
            airport_code: Some("HND".to_string()),
            ..Default::default()
        };
        let updated = service.update(&ctx, "Tokyo", fields).await.unwrap().destination.unwrap();

        assert_eq!(updated.region, "Kanto");
        assert_eq!(updated.airport_code, Some("HND".to_string()));
        // untouched fields survive
        assert_eq!(updated.duration_days, 3);
        assert_eq!(updated.country, "Japan");
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_local_cache_untouched() {
        let store = Arc::new(MemoryDocStore::new());
        let service = offline_service(store.clone());
        let ctx = CallContext::for_session("sess-1");

        service.add(&ctx, add_request("Tokyo", "Tokyo", "Japan", 3)).await.unwrap();

        store.reject_writes("store offline");
        let err = service.add(&ctx, add_request("Kyoto", "Kyoto", "Japan", 2)).await.unwrap_err();
        assert!(err.to_string().contains("store offline"));

        // remote still has only Tokyo; so does the local cache
        store.accept_writes();
        let doc = service.current(&ctx).await;
        assert_eq!(doc.locations.len(), 1);
        assert_eq!(doc.locations[0].name, "Tokyo");
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = Arc::new(MemoryDocStore::new());
        let service = offline_service(store);

        let ctx_a = CallContext::for_session("sess-a");
        let ctx_b = CallContext::for_session("sess-b");

        service.add(&ctx_a, add_request("Tokyo", "Tokyo", "Japan", 3)).await.unwrap();

        assert_eq!(service.current(&ctx_a).await.locations.len(), 1);
        assert!(service.current(&ctx_b).await.locations.is_empty());
    }

    #[tokio::test]
    async fn test_scenario_remembered_per_session() {
        let store = Arc::new(MemoryDocStore::new());
        let service = offline_service(store);

        let ctx_a = CallContext::for_session("sess-a");
        let ctx_b = CallContext::for_session("sess-b");

        assert!(service.scenario_for(&ctx_a).is_none());
        service.remember_scenario(&ctx_a, "scen-1");

        assert_eq!(service.scenario_for(&ctx_a), Some("scen-1".to_string()));
        assert!(service.scenario_for(&ctx_b).is_none());

        service.clear_sessions();
        assert!(service.scenario_for(&ctx_a).is_none());
    }

    #[tokio::test]
    async fn test_find_destination_fuzzy() {
        let store = Arc::new(MemoryDocStore::new());
        let service = offline_service(store);
        let ctx = CallContext::for_session("sess-1");

        service.add(&ctx, add_request("Barcelona", "Barcelona", "Spain", 3)).await.unwrap();

        let hit = service.find_destination(&ctx, "barcelonna").await;
        assert_eq!(hit.unwrap().name, "Barcelona");
        assert!(service.find_destination(&ctx, "zzz").await.is_none());
    }
}
