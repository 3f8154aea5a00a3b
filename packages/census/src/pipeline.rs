//! Census orchestration.
//!
//! Walks boroughs and their neighborhoods in enumeration order, one request
//! in flight at a time, feeds every neighborhood's places through the
//! aggregator and writes one document per borough plus the citywide one.

use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;

use crate::aggregator::Aggregator;
use crate::config::{
    Borough, CensusConfig, DedupPolicy, FetchConfig, OutputConfig, QueryTemplate,
};
use crate::error::Result;
use crate::fetcher::{Fetcher, StopReason};
use crate::pacing::Pacer;
use crate::report::{borough_file_name, write_json, AggregationResult, Summary};
use crate::traits::searcher::PlaceSearcher;

/// What a run should cover.
#[derive(Debug, Clone)]
pub struct CensusPlan {
    pub boroughs: Vec<Borough>,
    /// Also write the citywide document.
    pub citywide: bool,
    pub date_collected: NaiveDate,
}

impl CensusPlan {
    pub fn new(boroughs: Vec<Borough>, date_collected: NaiveDate) -> Self {
        Self {
            boroughs,
            citywide: true,
            date_collected,
        }
    }

    pub fn without_citywide(mut self) -> Self {
        self.citywide = false;
        self
    }
}

/// A neighborhood whose pagination ended on an error.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborhoodFailure {
    pub neighborhood: String,
    pub borough: String,
    pub reason: StopReason,
}

/// Outcome of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Unique places admitted per borough, in run order.
    pub borough_totals: Vec<(String, usize)>,
    pub total_places: usize,
    pub files: Vec<PathBuf>,
    pub summary: Summary,
    pub failures: Vec<NeighborhoodFailure>,
}

pub struct Census<S: PlaceSearcher> {
    fetcher: Fetcher<S>,
    neighborhood_pacer: Pacer,
    output: OutputConfig,
    policy: DedupPolicy,
}

impl<S: PlaceSearcher> Census<S> {
    pub fn new(searcher: S, config: &CensusConfig) -> Self {
        Self::from_parts(
            searcher,
            config.fetch.clone(),
            config.query.clone(),
            config.neighborhood_interval,
            config.output.clone(),
            config.dedup_policy,
        )
    }

    pub fn from_parts(
        searcher: S,
        fetch: FetchConfig,
        query: QueryTemplate,
        neighborhood_interval: Duration,
        output: OutputConfig,
        policy: DedupPolicy,
    ) -> Self {
        Self {
            fetcher: Fetcher::new(searcher, fetch, query),
            neighborhood_pacer: Pacer::new(neighborhood_interval),
            output,
            policy,
        }
    }

    pub fn searcher(&self) -> &S {
        self.fetcher.searcher()
    }

    /// Run the census. Only writing an output file can fail.
    ///
    /// Under [`DedupPolicy::MostComplete`] a later borough may still replace
    /// a stored record, so borough documents are written once every borough
    /// has been fetched. Otherwise each is written as soon as its borough is
    /// done.
    pub async fn run(&self, plan: &CensusPlan) -> Result<RunReport> {
        let mut aggregator = Aggregator::new(self.policy);
        let mut borough_totals = Vec::with_capacity(plan.boroughs.len());
        let mut files = Vec::new();
        let mut failures = Vec::new();
        let defer_boroughs = self.policy == DedupPolicy::MostComplete;

        for borough in &plan.boroughs {
            tracing::info!(
                borough = %borough.name,
                neighborhoods = borough.neighborhoods.len(),
                "Processing borough"
            );

            for neighborhood in &borough.neighborhoods {
                self.neighborhood_pacer.wait().await;
                tracing::info!(
                    neighborhood = %neighborhood,
                    borough = %borough.name,
                    "Fetching places"
                );

                let fetched = self.fetcher.fetch_neighborhood(neighborhood, &borough.name).await;
                if fetched.stop.is_error() {
                    failures.push(NeighborhoodFailure {
                        neighborhood: neighborhood.clone(),
                        borough: borough.name.clone(),
                        reason: fetched.stop.clone(),
                    });
                }

                let stats = aggregator.absorb(fetched.places);
                tracing::info!(
                    neighborhood = %neighborhood,
                    admitted = stats.admitted,
                    duplicates = stats.duplicates + stats.replaced,
                    total = aggregator.len(),
                    "Total unique places found so far"
                );
            }

            borough_totals.push((borough.name.clone(), aggregator.borough_len(&borough.name)));
            if !defer_boroughs {
                files.push(self.write_borough(&aggregator, borough, plan.date_collected)?);
            }
        }

        if defer_boroughs {
            for borough in &plan.boroughs {
                files.push(self.write_borough(&aggregator, borough, plan.date_collected)?);
            }
        }

        let summary = Summary::of(aggregator.places());

        if plan.citywide {
            let result = AggregationResult::citywide(
                plan.boroughs.iter().map(|b| b.name.clone()).collect(),
                aggregator.places().to_vec(),
                plan.date_collected,
                self.output.source_label.clone(),
            );
            let path = self.output.dir.join(&self.output.citywide_file);
            files.push(write_json(&path, &result)?);
            summary.log(self.output.top_neighborhoods);
        } else {
            summary.log(usize::MAX);
        }

        tracing::info!(
            total = aggregator.len(),
            failures = failures.len(),
            "Census complete"
        );

        Ok(RunReport {
            borough_totals,
            total_places: aggregator.len(),
            files,
            summary,
            failures,
        })
    }

    fn write_borough(
        &self,
        aggregator: &Aggregator,
        borough: &Borough,
        date_collected: NaiveDate,
    ) -> Result<PathBuf> {
        let places = aggregator.borough_places(&borough.name).cloned().collect();
        let result = AggregationResult::for_borough(
            borough,
            places,
            date_collected,
            self.output.source_label.clone(),
        );
        let file_name = borough_file_name(&borough.name, &self.output.borough_suffix);
        write_json(&self.output.dir.join(file_name), &result)
    }
}
