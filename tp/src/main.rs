use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use docstore::{DocStore, HttpDocStore, MemoryDocStore};
use tripdaemon::cli::{Cli, Command};
use tripdaemon::config::Config;
use tripdaemon::domain::ResearchPayload;
use tripdaemon::geocode::{GeoCache, GeocodeChain, GeocodeProvider, NominatimProvider, PlacesProvider};
use tripdaemon::reconcile::{CostReconciler, ReconcileRequest};
use tripdaemon::reference::ReferenceData;
use tripdaemon::service::{AddDestination, ItineraryService, UpdateFields};
use tripdaemon::session::{CallContext, SessionMap};

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

/// Build the geocoding chain from config; disabled providers are skipped
fn build_chain(config: &Config) -> Result<GeocodeChain> {
    let mut providers: Vec<Box<dyn GeocodeProvider>> = Vec::new();

    if config.geocode.places.enabled {
        let api_key = std::env::var(&config.geocode.places.api_key_env)
            .context("Places API key environment variable not set")?;
        providers.push(Box::new(PlacesProvider::new(
            &config.geocode.places.base_url,
            api_key,
            config.geocode.timeout_ms,
        )?));
    }

    if config.geocode.nominatim.enabled {
        providers.push(Box::new(NominatimProvider::new(
            &config.geocode.nominatim.base_url,
            &config.geocode.nominatim.user_agent,
            config.geocode.timeout_ms,
        )?));
    }

    Ok(GeocodeChain::new(providers))
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate()?;

    let store: Arc<dyn DocStore> = if cli.offline {
        info!("using in-memory document store");
        Arc::new(MemoryDocStore::new())
    } else {
        Arc::new(HttpDocStore::new(
            &config.persistence.base_url,
            config.persistence.timeout_ms,
        )?)
    };

    let chain = build_chain(&config)?;
    let service = ItineraryService::new(
        store.clone(),
        chain,
        ReferenceData::bundled(),
        GeoCache::new(config.geocode.cache_ttl_secs),
        config.resolver.options(),
        SessionMap::new(config.session.ttl_secs),
    );
    let ctx = CallContext::for_session(&cli.session);

    match cli.command {
        Command::Add {
            name,
            city,
            country,
            duration,
            activity_type,
            description,
            notes,
            insert_after,
        } => {
            let response = service
                .add(
                    &ctx,
                    AddDestination {
                        name,
                        city,
                        country,
                        duration_days: duration,
                        activity_type,
                        description,
                        notes,
                        insert_after,
                    },
                )
                .await?;
            if let Some(destination) = &response.destination {
                println!(
                    "{} {} (id {}, coordinates via {})",
                    "✓".green(),
                    response.message,
                    destination.id.cyan(),
                    destination.coordinates.source.to_string().yellow()
                );
            } else {
                println!("{} {}", "✓".green(), response.message);
            }
        }
        Command::Remove { name } => {
            let response = service.remove(&ctx, &name).await?;
            println!("{} {}", "✓".green(), response.message);
        }
        Command::Duration { name, days } => {
            let response = service.update_duration(&ctx, &name, days).await?;
            println!("{} {}", "✓".green(), response.message);
        }
        Command::Update {
            name,
            city,
            country,
            region,
            duration,
            activity_type,
            description,
            notes,
            airport_code,
        } => {
            let fields = UpdateFields {
                city,
                country,
                region,
                duration_days: duration,
                activity_type,
                description,
                notes,
                airport_code,
            };
            let response = service.update(&ctx, &name, fields).await?;
            println!("{} {}", "✓".green(), response.message);
        }
        Command::Show => {
            let doc = service.current(&ctx).await;
            if doc.locations.is_empty() {
                println!("Itinerary is empty");
            } else {
                for (idx, destination) in doc.locations.iter().enumerate() {
                    println!(
                        "{}. {} — {} day(s) [{}] ({:.4}, {:.4} via {})",
                        idx + 1,
                        destination.name.cyan(),
                        destination.duration_days,
                        destination.id.dimmed(),
                        destination.coordinates.lat,
                        destination.coordinates.lng,
                        destination.coordinates.source
                    );
                }
                println!("Total: {} day(s)", doc.total_days());
            }
            if !doc.costs.is_empty() {
                let total: f64 = doc.costs.iter().map(|c| c.amount_usd).sum();
                println!("Costs on record: {} item(s), ${:.2} USD", doc.costs.len(), total);
            }
        }
        Command::Find { query } => match service.find_destination(&ctx, &query).await {
            Some(destination) => println!("{} {} ({})", "✓".green(), destination.name.cyan(), destination.id),
            None => println!("No destination matching {:?}", query),
        },
        Command::Costs {
            destination,
            scenario,
            research,
            destination_id,
            duration,
            travelers,
        } => {
            let content = std::fs::read_to_string(&research)
                .context(format!("Failed to read research payload {}", research.display()))?;
            let payload: ResearchPayload =
                serde_json::from_str(&content).context("Failed to parse research payload")?;

            service.remember_scenario(&ctx, &scenario);
            let doc = service.current(&ctx).await;
            let reconciler = CostReconciler::new(store, config.resolver.options());
            let request = ReconcileRequest {
                destination_name: destination,
                destination_id: destination_id.map(serde_json::Value::String).unwrap_or_default(),
                duration_days: duration,
                num_travelers: travelers,
                session_id: ctx.session_id(),
                scenario_id: scenario,
            };

            let outcome = reconciler.reconcile(&request, &payload, &doc.locations).await?;
            for warning in &outcome.warnings {
                println!("{} {}", "!".yellow(), warning);
            }
            for item in &outcome.cost_items {
                println!(
                    "  {} {:>10.2} {} (${:.2} USD) [{}]",
                    item.category.to_string().cyan(),
                    item.amount,
                    item.currency,
                    item.amount_usd,
                    item.id.dimmed()
                );
            }
            if outcome.status == "success" {
                println!("{} Saved {} item(s), total ${:.2} USD", "✓".green(), outcome.cost_items.len(), outcome.total_usd);
            } else {
                println!("{} Save failed: {}", "✗".red(), outcome.message);
            }
        }
    }

    Ok(())
}
