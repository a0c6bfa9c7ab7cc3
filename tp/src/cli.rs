//! CLI argument parsing for tripdaemon

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tp")]
#[command(author, version, about = "Trip itinerary operator tool", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Session to operate on
    #[arg(short, long, default_value = "default_session")]
    pub session: String,

    /// Use an in-memory store instead of the remote document store
    #[arg(long)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a destination to the itinerary
    Add {
        /// Display name, e.g. "Tokyo, Japan"
        #[arg(required = true)]
        name: String,

        /// City
        #[arg(required = true)]
        city: String,

        /// Country
        #[arg(required = true)]
        country: String,

        /// Length of stay in days
        #[arg(short, long, default_value = "1")]
        duration: u32,

        /// Activity type, e.g. city, culture, food
        #[arg(long)]
        activity_type: Option<String>,

        /// Free-text description
        #[arg(long)]
        description: Option<String>,

        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,

        /// Insert after the destination with this name or city
        #[arg(long)]
        insert_after: Option<String>,
    },

    /// Remove every destination matching a name or city
    Remove {
        /// Name or city to remove
        #[arg(required = true)]
        name: String,
    },

    /// Change the stay length of the first matching destination
    Duration {
        /// Name or city to update
        #[arg(required = true)]
        name: String,

        /// New length of stay in days
        #[arg(required = true)]
        days: u32,
    },

    /// Update fields on the first matching destination
    Update {
        /// Name or city to update
        #[arg(required = true)]
        name: String,

        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        country: Option<String>,

        #[arg(long)]
        region: Option<String>,

        #[arg(long)]
        duration: Option<u32>,

        #[arg(long)]
        activity_type: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        airport_code: Option<String>,
    },

    /// Show the current itinerary
    Show,

    /// Fuzzy-find a destination by name
    Find {
        /// Search query
        #[arg(required = true)]
        query: String,
    },

    /// Reconcile a research payload into cost items and save them
    Costs {
        /// Destination display name
        #[arg(required = true)]
        destination: String,

        /// Scenario receiving the cost items
        #[arg(required = true)]
        scenario: String,

        /// Path to the research payload JSON file
        #[arg(required = true)]
        research: PathBuf,

        /// Destination id, when known
        #[arg(long)]
        destination_id: Option<String>,

        /// Stay length in days
        #[arg(short, long, default_value = "1")]
        duration: u32,

        /// Number of travelers
        #[arg(short, long, default_value = "1")]
        travelers: u32,
    },
}
