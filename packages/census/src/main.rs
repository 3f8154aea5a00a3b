// Entry point for the places census CLI

use anyhow::{Context, Result};
use census::config::{load_boroughs, select_boroughs};
use census::{Census, CensusConfig, CensusPlan, DedupPolicy, GooglePlacesSearcher};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "places-census")]
#[command(about = "Collect places per neighborhood and borough into JSON documents")]
struct Cli {
    /// Only run these boroughs (repeatable, case-insensitive)
    #[arg(long = "borough")]
    boroughs: Vec<String>,

    /// Directory for the output documents
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Borough -> neighborhoods JSON file
    #[arg(long)]
    neighborhoods: Option<PathBuf>,

    /// Maximum pages per neighborhood
    #[arg(long)]
    max_pages: Option<u32>,

    /// first-seen or most-complete
    #[arg(long)]
    dedup_policy: Option<DedupPolicy>,

    /// Skip the citywide document
    #[arg(long)]
    no_citywide: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,census=debug,places_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = CensusConfig::from_env().context("Failed to load configuration")?;
    if let Some(dir) = cli.output_dir {
        config.output.dir = dir;
    }
    if let Some(path) = cli.neighborhoods {
        config.neighborhoods_file = path;
    }
    if let Some(max_pages) = cli.max_pages {
        config.fetch.max_pages = max_pages;
    }
    if let Some(policy) = cli.dedup_policy {
        config.dedup_policy = policy;
    }
    tracing::info!(?config, "Configuration loaded");

    let boroughs = load_boroughs(&config.neighborhoods_file)
        .context("Failed to load neighborhood enumeration")?;
    let boroughs = select_boroughs(boroughs, &cli.boroughs).context("Invalid --borough")?;

    let mut plan = CensusPlan::new(boroughs, chrono::Local::now().date_naive());
    if cli.no_citywide {
        plan = plan.without_citywide();
    }

    let census = Census::new(GooglePlacesSearcher::from_config(&config), &config);
    let report = census.run(&plan).await.context("Census run failed")?;

    for (borough, total) in &report.borough_totals {
        tracing::info!(borough = %borough, total, "Borough total");
    }
    for failure in &report.failures {
        tracing::warn!(
            neighborhood = %failure.neighborhood,
            borough = %failure.borough,
            reason = ?failure.reason,
            "Neighborhood ended early"
        );
    }
    tracing::info!(
        total = report.total_places,
        files = report.files.len(),
        "Successfully collected unique places"
    );

    Ok(())
}
