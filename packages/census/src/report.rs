//! Result documents and count summaries.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::Borough;
use crate::error::{CensusError, Result};
use crate::place::CollectedPlace;

/// What a document covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scope {
    Borough {
        borough: String,
        neighborhoods: Vec<String>,
    },
    Citywide {
        boroughs: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub total_places: usize,
    #[serde(flatten)]
    pub scope: Scope,
    pub date_collected: NaiveDate,
    pub source: String,
}

/// A written census document: `{metadata, places}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub metadata: Metadata,
    pub places: Vec<CollectedPlace>,
}

impl AggregationResult {
    pub fn for_borough(
        borough: &Borough,
        places: Vec<CollectedPlace>,
        date_collected: NaiveDate,
        source: impl Into<String>,
    ) -> Self {
        Self::new(
            Scope::Borough {
                borough: borough.name.clone(),
                neighborhoods: borough.neighborhoods.clone(),
            },
            places,
            date_collected,
            source,
        )
    }

    pub fn citywide(
        boroughs: Vec<String>,
        places: Vec<CollectedPlace>,
        date_collected: NaiveDate,
        source: impl Into<String>,
    ) -> Self {
        Self::new(Scope::Citywide { boroughs }, places, date_collected, source)
    }

    fn new(
        scope: Scope,
        places: Vec<CollectedPlace>,
        date_collected: NaiveDate,
        source: impl Into<String>,
    ) -> Self {
        Self {
            metadata: Metadata {
                total_places: places.len(),
                scope,
                date_collected,
                source: source.into(),
            },
            places,
        }
    }

    /// `total_places` matches the list and no id repeats.
    pub fn is_consistent(&self) -> bool {
        let mut ids = HashSet::new();
        self.metadata.total_places == self.places.len()
            && self.places.iter().all(|p| p.id().map_or(true, |id| ids.insert(id)))
    }

    pub fn summary(&self) -> Summary {
        Summary::of(&self.places)
    }
}

/// `"Staten Island"` -> `"staten_island" + suffix`.
pub fn borough_file_name(borough: &str, suffix: &str) -> String {
    format!("{}{}", borough.to_lowercase().replace(' ', "_"), suffix)
}

/// Write a document as pretty-printed UTF-8 JSON, creating parent directories.
pub fn write_json(path: &Path, result: &AggregationResult) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| CensusError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json).map_err(|source| CensusError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %path.display(), total = result.metadata.total_places, "Saved places");
    Ok(path.to_path_buf())
}

/// Place counts per borough and per neighborhood, largest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub by_borough: Vec<(String, usize)>,
    pub by_neighborhood: Vec<(String, usize)>,
}

impl Summary {
    pub fn of(places: &[CollectedPlace]) -> Self {
        Self {
            by_borough: ranked_counts(places.iter().map(|p| p.borough.as_str())),
            by_neighborhood: ranked_counts(places.iter().map(|p| p.neighborhood.as_str())),
        }
    }

    pub fn top_neighborhoods(&self, n: usize) -> &[(String, usize)] {
        &self.by_neighborhood[..n.min(self.by_neighborhood.len())]
    }

    /// Emit the borough ranking and the top `n` neighborhoods.
    pub fn log(&self, top: usize) {
        if self.by_borough.len() > 1 {
            for (borough, count) in &self.by_borough {
                tracing::info!(borough = %borough, count, "Places by borough");
            }
        }
        for (neighborhood, count) in self.top_neighborhoods(top) {
            tracing::info!(neighborhood = %neighborhood, count, "Places by neighborhood");
        }
    }
}

/// Count keys and sort by descending count. Ties keep first-encounter order.
pub fn ranked_counts<'a>(keys: impl IntoIterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> =
        counts.into_iter().map(|(k, n)| (k.to_string(), n)).collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}
