//! Borough-by-borough places census.
//!
//! Queries the Google Places text search for one business category in every
//! configured neighborhood, follows pagination, deduplicates by place id
//! across the whole run, and writes one JSON document per borough plus a
//! citywide one.
//!
//! # Usage
//!
//! ```rust,ignore
//! use census::{Census, CensusConfig, CensusPlan, GooglePlacesSearcher};
//!
//! let config = CensusConfig::from_env()?;
//! let boroughs = census::config::load_boroughs(&config.neighborhoods_file)?;
//!
//! let census = Census::new(GooglePlacesSearcher::from_config(&config), &config);
//! let plan = CensusPlan::new(boroughs, chrono::Local::now().date_naive());
//! let report = census.run(&plan).await?;
//! println!("{} unique places", report.total_places);
//! ```
//!
//! # Modules
//!
//! - [`fetcher`] - Paginated search for one neighborhood
//! - [`aggregator`] - Run-wide deduplication and borough views
//! - [`report`] - Result documents, file naming, count summaries
//! - [`pipeline`] - Orchestration over boroughs and neighborhoods
//! - [`testing`] - Scripted searcher for tests

pub mod aggregator;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod pacing;
pub mod pipeline;
pub mod place;
pub mod report;
pub mod security;
pub mod testing;
pub mod traits;

pub use aggregator::{AbsorbStats, AdmitOutcome, Aggregator};
pub use config::{Borough, CensusConfig, DedupPolicy, FetchConfig, OutputConfig, QueryTemplate};
pub use error::{CensusError, FetchError, Result};
pub use fetcher::{Fetcher, NeighborhoodFetch, StopReason};
pub use pipeline::{Census, CensusPlan, NeighborhoodFailure, RunReport};
pub use place::CollectedPlace;
pub use report::{AggregationResult, Metadata, Scope, Summary};
pub use traits::searcher::{GooglePlacesSearcher, PlaceSearcher};
