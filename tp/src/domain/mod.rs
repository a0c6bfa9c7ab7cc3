//! Domain types for the trip-planning core
//!
//! Destinations, cost items, research payloads, and the persisted trip
//! document shape. These are plain serde types; behavior that touches the
//! network or the store lives in the service modules.

pub mod cost;
pub mod destination;
pub mod document;

pub use cost::{BookingStatus, CategoryEstimate, Confidence, CostCategory, CostItem, ResearchPayload};
pub use destination::{CoordSource, Coordinates, Destination, find_index, matches_name_or_city};
pub use document::{TripDates, TripDocument};
