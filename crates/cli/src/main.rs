use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use wayfare_agents::{ItineraryPlanner, PlannerError};
use wayfare_core::{
    allocate_budget, format_currency, parse_categories, ActivityPreference, TripParameters,
};
use wayfare_observability::{init_tracing, AppMetrics};
use wayfare_places::{DemoCatalog, PlaceDataSource};
use wayfare_storage::Store;

#[derive(Debug, Parser)]
#[command(name = "wayfare")]
#[command(about = "Travel budget planner")]
struct Cli {
    /// Place catalog to use instead of the built-in one.
    #[arg(long, env = "WAYFARE_CATALOG")]
    catalog: Option<PathBuf>,

    #[arg(long, env = "WAYFARE_DATABASE_URL")]
    database_url: Option<String>,

    #[arg(long, env = "WAYFARE_DEFAULT_ORIGIN", default_value = "New York")]
    origin: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check a budget against the trip's minimum cost.
    Validate(TripArgs),
    /// Build and store a full itinerary.
    Plan(TripArgs),
    /// Print the category allocation without the feasibility check.
    Allocate(TripArgs),
    /// Plan, then fold the buffer into the given categories.
    Reallocate {
        #[command(flatten)]
        trip: TripArgs,
        #[arg(long, value_delimiter = ',', required = true)]
        categories: Vec<String>,
    },
}

#[derive(Debug, Args)]
struct TripArgs {
    #[arg(long)]
    destination: String,
    #[arg(long)]
    budget: f64,
    #[arg(long, default_value_t = 3)]
    days: u32,
    #[arg(long, default_value_t = 1)]
    travelers: u32,
    #[arg(long)]
    flights: bool,
    #[arg(long)]
    hotels: bool,
    #[arg(long, default_value = "moderate")]
    activity_preference: String,
}

impl TripArgs {
    fn parameters(&self, origin: &str) -> Result<TripParameters> {
        let activity_preference = ActivityPreference::parse(&self.activity_preference)
            .context("invalid --activity-preference (relaxed, moderate, active)")?;
        Ok(TripParameters {
            destination: self.destination.clone(),
            budget: self.budget,
            duration: self.days,
            travelers: self.travelers,
            activity_preference,
            include_flights: self.flights,
            include_hotels: self.hotels,
            user_location: Some(origin.to_string()),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("wayfare_cli");
    let cli = Cli::parse();

    let catalog = match cli.catalog.as_ref() {
        Some(path) => DemoCatalog::from_path(path)?,
        None => DemoCatalog::load_default()?,
    };
    let store = match cli.database_url.as_deref() {
        Some(database_url) => Store::sqlite(database_url).await?,
        None => Store::memory(),
    };

    let planner = ItineraryPlanner::new(
        Arc::new(store),
        Arc::new(catalog.clone()),
        AppMetrics::shared(),
        cli.origin.clone(),
    );

    match cli.command {
        Command::Validate(trip) => {
            let report = planner
                .validate_budget(&trip.parameters(&cli.origin)?)
                .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Plan(trip) => {
            let itinerary = planner
                .create_itinerary(trip.parameters(&cli.origin)?)
                .await
                .map_err(explain)?;
            println!("{}", serde_json::to_string_pretty(&itinerary)?);
        }
        Command::Allocate(trip) => {
            let parameters = trip.parameters(&cli.origin)?;
            let snapshot = catalog
                .fetch(
                    parameters.destination_city(),
                    Some(&cli.origin),
                    parameters.include_flights,
                )
                .await?;
            let allocation = allocate_budget(&snapshot, parameters.budget, &parameters.shape())?;
            println!("{}", serde_json::to_string_pretty(&allocation)?);
        }
        Command::Reallocate { trip, categories } => {
            let categories = parse_categories(&categories)?;
            let itinerary = planner
                .create_itinerary(trip.parameters(&cli.origin)?)
                .await
                .map_err(explain)?;
            let updated = planner
                .reallocate_budget(&itinerary.itinerary_id, &categories)
                .await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "before": itinerary.budget_breakdown,
                    "after": updated
                }))?
            );
        }
    }

    Ok(())
}

fn explain(err: PlannerError) -> anyhow::Error {
    match err {
        PlannerError::InsufficientBudget(report) => anyhow!(
            "{} (minimum {})",
            report.message,
            format_currency(report.minimum_budget)
        ),
        other => other.into(),
    }
}
