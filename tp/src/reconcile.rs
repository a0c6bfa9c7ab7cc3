//! Cost reconciliation engine
//!
//! Turns a five-category research payload plus trip parameters into
//! reconciled, upsertable cost records: category-specific scaling, stable
//! composite ids, currency normalization, and destination-link repair, then
//! one bulk write to the persistence boundary.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use docstore::{BulkSaveRequest, DocStore};

use crate::currency;
use crate::domain::{BookingStatus, CategoryEstimate, CostCategory, CostItem, Destination, ResearchPayload};
use crate::resolve::{self, ResolveError, ResolverOptions, slugify};

/// Provenance tag stamped on every reconciled item
const RESEARCH_SOURCE: &str = "cost_research";

/// Errors from reconciliation preconditions
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// There is no scenario to attach cost items to
    #[error("Cost reconciliation requires a scenario_id")]
    MissingScenario,

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The five research categories, in payload order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchCategory {
    Accommodation,
    Flights,
    FoodDaily,
    TransportDaily,
    Activities,
}

impl ResearchCategory {
    pub const ALL: [ResearchCategory; 5] = [
        Self::Accommodation,
        Self::Flights,
        Self::FoodDaily,
        Self::TransportDaily,
        Self::Activities,
    ];

    /// Stored cost category for this research category
    pub fn cost_category(&self) -> CostCategory {
        match self {
            Self::Accommodation => CostCategory::Accommodation,
            Self::Flights => CostCategory::Flight,
            Self::FoodDaily => CostCategory::Food,
            Self::TransportDaily => CostCategory::Transport,
            Self::Activities => CostCategory::Activity,
        }
    }

    /// Scaling multiplier applied to the mid estimate before storing
    ///
    /// Daily categories are per-person per-day rates; flights are a
    /// per-person one-time rate; accommodation and activities arrive as
    /// totals for the stay.
    pub fn multiplier(&self, duration_days: u32, num_travelers: u32) -> f64 {
        let days = duration_days.max(1) as f64;
        let travelers = num_travelers.max(1) as f64;
        match self {
            Self::FoodDaily | Self::TransportDaily => days * travelers,
            Self::Flights => travelers,
            Self::Accommodation | Self::Activities => 1.0,
        }
    }

    fn estimate<'a>(&self, payload: &'a ResearchPayload) -> Option<&'a CategoryEstimate> {
        match self {
            Self::Accommodation => payload.accommodation.as_ref(),
            Self::Flights => payload.flights.as_ref(),
            Self::FoodDaily => payload.food_daily.as_ref(),
            Self::TransportDaily => payload.transport_daily.as_ref(),
            Self::Activities => payload.activities.as_ref(),
        }
    }
}

/// Coerce a loosely-typed research amount to a float, defaulting to 0.0
///
/// Accepts plain numbers, formatted strings ("1,455.00", "$850"), and
/// nested objects carrying the figure under a conventional key. Malformed
/// input never raises.
pub fn coerce_amount(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().unwrap_or_else(|_| {
                if !s.trim().is_empty() {
                    debug!(raw = %s, "coerce_amount: unparseable string, using 0.0");
                }
                0.0
            })
        }
        Value::Object(map) => ["amount", "value", "mid", "usd"]
            .iter()
            .find_map(|key| map.get(*key))
            .map(coerce_amount)
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Derive a usable destination id from loose upstream data
///
/// Pass through non-empty strings, stringify non-string non-null values,
/// fall back to a slug of the destination name, and finally to a fixed
/// placeholder so every persisted item has some destination id.
pub fn coerce_destination_id(value: &Value, destination_name: &str) -> String {
    match value {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::Null | Value::String(_) => {
            let slug = slugify(destination_name);
            if slug.is_empty() {
                resolve::UNKNOWN_DESTINATION.to_string()
            } else {
                slug
            }
        }
        other => other.to_string().trim_matches('"').to_string(),
    }
}

/// Build the deterministic composite id for a destination/category pair
pub fn cost_item_id(destination_id: &str, destination_name: &str, category: CostCategory) -> String {
    format!("{}_{}_{}", destination_id, slugify(destination_name), category.as_str())
}

/// Reconciliation request parameters
#[derive(Debug, Clone, Default)]
pub struct ReconcileRequest {
    pub destination_name: String,

    /// Loose destination identifier as it arrived from upstream
    pub destination_id: Value,

    pub duration_days: u32,

    pub num_travelers: u32,

    pub session_id: String,

    pub scenario_id: String,
}

/// Outcome of one reconciliation run
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub cost_items: Vec<CostItem>,

    /// Sum of scaled USD amounts across all categories
    pub total_usd: f64,

    /// "success" or "error"
    pub status: String,

    /// Boundary message, passed through verbatim on error
    pub message: String,

    /// Resolver warnings (auto-resolutions, orphaned items)
    pub warnings: Vec<String>,
}

/// The reconciliation engine
pub struct CostReconciler {
    store: Arc<dyn DocStore>,
    resolver: ResolverOptions,
}

impl CostReconciler {
    pub fn new(store: Arc<dyn DocStore>, resolver: ResolverOptions) -> Self {
        Self { store, resolver }
    }

    /// Build one cost item for a category
    fn build_item(&self, request: &ReconcileRequest, destination_id: &str, category: ResearchCategory, estimate: &CategoryEstimate) -> CostItem {
        let multiplier = category.multiplier(request.duration_days, request.num_travelers);
        let scaled_usd = coerce_amount(&estimate.amount_mid) * multiplier;
        let local = coerce_amount(&estimate.amount_local);

        // Missing local figures fall back to the scaled USD amount; the
        // currency is then USD, not whatever the payload claimed.
        let (amount, raw_currency) = if local > 0.0 {
            (local * multiplier, estimate.currency_local.clone())
        } else {
            (scaled_usd, currency::DEFAULT_CURRENCY.to_string())
        };

        let researched_at = if estimate.researched_at.is_empty() {
            Utc::now().to_rfc3339()
        } else {
            estimate.researched_at.clone()
        };

        let mut item = CostItem {
            id: cost_item_id(destination_id, &request.destination_name, category.cost_category()),
            category: category.cost_category(),
            amount,
            currency: raw_currency,
            amount_usd: scaled_usd,
            destination_id: Some(destination_id.to_string()),
            booking_status: BookingStatus::Estimated,
            source: RESEARCH_SOURCE.to_string(),
            notes: estimate.notes.clone(),
            confidence: estimate.confidence,
            sources: estimate.sources.clone(),
            researched_at,
            ..Default::default()
        };

        currency::validate_cost_item(&mut item, Some(&request.destination_name));
        item
    }

    /// Reconcile a research payload into cost items and submit the batch
    ///
    /// A missing scenario id is a hard precondition failure. A rejected
    /// batch write is not: the outcome reports `status: "error"` with the
    /// boundary's message and the reconciled items are still returned.
    /// There is no partial per-item retry.
    pub async fn reconcile(
        &self,
        request: &ReconcileRequest,
        payload: &ResearchPayload,
        destinations: &[Destination],
    ) -> Result<ReconcileOutcome, ReconcileError> {
        if request.scenario_id.trim().is_empty() {
            return Err(ReconcileError::MissingScenario);
        }

        let destination_id = coerce_destination_id(&request.destination_id, &request.destination_name);
        debug!(
            destination = %request.destination_name,
            %destination_id,
            duration_days = request.duration_days,
            num_travelers = request.num_travelers,
            "reconcile: starting"
        );

        let mut items = Vec::new();
        for category in ResearchCategory::ALL {
            if let Some(estimate) = category.estimate(payload) {
                items.push(self.build_item(request, &destination_id, category, estimate));
            }
        }

        let warnings = resolve::validate_cost_items(
            &mut items,
            destinations,
            self.resolver.auto_resolve,
            self.resolver.strict,
            self.resolver.resolve_threshold,
        )?;

        let total_usd = items.iter().map(|i| i.amount_usd).sum();

        let serialized = items
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;

        let bulk = BulkSaveRequest {
            session_id: request.session_id.clone(),
            scenario_id: request.scenario_id.clone(),
            destination_id: destination_id.clone(),
            destination_name: request.destination_name.clone(),
            cost_items: serialized,
        };

        let (status, message) = match self.store.save_cost_items(bulk).await {
            Ok(response) => (response.status, response.message),
            Err(e) => {
                warn!(error = %e, "reconcile: bulk save rejected");
                ("error".to_string(), e.to_string())
            }
        };

        Ok(ReconcileOutcome {
            cost_items: items,
            total_usd,
            status,
            message,
            warnings,
        })
    }
}
