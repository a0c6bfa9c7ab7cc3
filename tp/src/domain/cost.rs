//! Cost items and the research payload they are reconciled from

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cost category on a stored item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    Accommodation,
    Flight,
    Activity,
    Food,
    Transport,
    #[default]
    Other,
}

impl CostCategory {
    /// Category key as used in composite cost-item ids
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accommodation => "accommodation",
            Self::Flight => "flight",
            Self::Activity => "activity",
            Self::Food => "food",
            Self::Transport => "transport",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for CostCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Booking lifecycle of a cost item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Research estimate, nothing committed
    #[default]
    Estimated,
    Booked,
    Paid,
}

/// Self-reported reliability tier of a research figure, carried through
/// unchanged for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
}

/// A single reconciled cost record
///
/// The id is deterministic (`{destination_id}_{slug(name)}_{category}`) so
/// re-running research for the same destination/category overwrites the
/// prior entry instead of duplicating it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CostItem {
    pub id: String,

    pub category: CostCategory,

    /// Amount in the original currency
    pub amount: f64,

    /// ISO 4217 currency code of `amount`
    pub currency: String,

    pub amount_usd: f64,

    /// Canonical destination id; `None` only before resolution has run
    #[serde(default)]
    pub destination_id: Option<String>,

    #[serde(default)]
    pub booking_status: BookingStatus,

    /// Provenance of the record, e.g. "cost_research"
    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub confidence: Confidence,

    /// Source URLs backing the research figure
    #[serde(default)]
    pub sources: Vec<String>,

    /// Timestamp string from the research payload
    #[serde(default)]
    pub researched_at: String,

    /// Set when the currency was auto-corrected; holds the original value
    #[serde(rename = "_original_currency", default, skip_serializing_if = "Option::is_none")]
    pub original_currency: Option<String>,

    #[serde(rename = "_currency_auto_corrected", default, skip_serializing_if = "Option::is_none")]
    pub currency_auto_corrected: Option<bool>,

    /// Set when the destination id was auto-resolved from an alias
    #[serde(rename = "_auto_resolved", default, skip_serializing_if = "Option::is_none")]
    pub auto_resolved: Option<bool>,

    /// Original identifier before auto-resolution replaced it
    #[serde(rename = "_legacy_destination_id", default, skip_serializing_if = "Option::is_none")]
    pub legacy_destination_id: Option<String>,

    /// Set when the destination link could not be resolved; the item is
    /// retained, never dropped
    #[serde(rename = "_orphaned", default, skip_serializing_if = "Option::is_none")]
    pub orphaned: Option<bool>,
}

/// One category's research figures
///
/// Amounts are kept as raw JSON values: the payload comes from an untrusted
/// text generator and may carry numbers, formatted strings, or nested
/// objects. Coercion happens in the reconciliation engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CategoryEstimate {
    #[serde(default)]
    pub amount_low: Value,

    #[serde(default)]
    pub amount_mid: Value,

    #[serde(default)]
    pub amount_high: Value,

    #[serde(default)]
    pub currency_local: String,

    #[serde(default)]
    pub amount_local: Value,

    #[serde(default)]
    pub sources: Vec<String>,

    #[serde(default)]
    pub confidence: Confidence,

    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub researched_at: String,
}

/// Five-category research payload for one destination
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResearchPayload {
    #[serde(default)]
    pub accommodation: Option<CategoryEstimate>,

    #[serde(default)]
    pub flights: Option<CategoryEstimate>,

    #[serde(default)]
    pub food_daily: Option<CategoryEstimate>,

    #[serde(default)]
    pub transport_daily: Option<CategoryEstimate>,

    #[serde(default)]
    pub activities: Option<CategoryEstimate>,
}
