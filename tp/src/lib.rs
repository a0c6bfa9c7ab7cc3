//! tripdaemon - domain-consistency core for a conversational trip planner
//!
//! The conversational layer (agent delegation, chat transport, LLM research
//! calls) lives elsewhere and is consumed through narrow boundaries. This
//! crate keeps the itinerary's domain data consistent:
//!
//! - [`currency`] normalizes ISO 4217-ish currency codes from untrusted
//!   text generation;
//! - [`resolve`] maps inconsistent destination identifiers (names, slugs,
//!   legacy numeric ids, fuzzy text) to one canonical id per destination;
//! - [`reconcile`] converts five-category cost research into scaled,
//!   idempotently-upsertable cost records;
//! - [`service`] applies itinerary mutations with a multi-source geocoding
//!   fallback chain and remote-store synchronization.

pub mod cli;
pub mod config;
pub mod currency;
pub mod domain;
pub mod geocode;
pub mod reconcile;
pub mod reference;
pub mod resolve;
pub mod service;
pub mod session;

pub use config::Config;
pub use service::ItineraryService;
