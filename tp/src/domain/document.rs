//! Persisted itinerary document shape
//!
//! The remote store holds one document per session under a fixed key:
//! `{locations, trip, costs}`. The store treats it as opaque JSON; this is
//! the typed view the core works with.

use serde::{Deserialize, Serialize};

use super::cost::CostItem;
use super::destination::Destination;

/// Trip-level date window and leg label
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TripDates {
    #[serde(default)]
    pub start_date: String,

    #[serde(default)]
    pub end_date: String,

    #[serde(default)]
    pub leg_name: String,
}

/// The full persisted itinerary document
///
/// `locations` is ordered and the order is meaningful: display order and
/// the "insert after X" semantics both depend on it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TripDocument {
    #[serde(default)]
    pub locations: Vec<Destination>,

    #[serde(default)]
    pub trip: TripDates,

    #[serde(default)]
    pub costs: Vec<CostItem>,
}

impl TripDocument {
    /// Total planned days across all stops
    pub fn total_days(&self) -> u32 {
        self.locations.iter().map(|d| d.duration_days).sum()
    }

    /// Upsert a cost item by its deterministic id
    pub fn upsert_cost(&mut self, item: CostItem) {
        match self.costs.iter_mut().find(|c| c.id == item.id) {
            Some(existing) => *existing = item,
            None => self.costs.push(item),
        }
    }
}
