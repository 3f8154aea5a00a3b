//! Run configuration.
//!
//! Everything that shapes a run (credentials, the neighborhood enumeration,
//! page limits, pacing, output naming) comes from the environment or files,
//! never from literals in the collection code.

use indexmap::IndexMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CensusError, Result};
use crate::security::SecretString;

/// A borough and the neighborhoods queried inside it, in query order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Borough {
    pub name: String,
    pub neighborhoods: Vec<String>,
}

impl Borough {
    pub fn new(
        name: impl Into<String>,
        neighborhoods: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            neighborhoods: neighborhoods.into_iter().map(Into::into).collect(),
        }
    }
}

/// Load the borough -> neighborhoods enumeration.
///
/// The file is a JSON object whose key order is the borough order of the run.
pub fn load_boroughs(path: &Path) -> Result<Vec<Borough>> {
    let raw = std::fs::read_to_string(path).map_err(|source| CensusError::NeighborhoodsRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_boroughs(&raw).map_err(|source| CensusError::NeighborhoodsParse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_boroughs(raw: &str) -> std::result::Result<Vec<Borough>, serde_json::Error> {
    let map: IndexMap<String, Vec<String>> = serde_json::from_str(raw)?;
    Ok(map
        .into_iter()
        .map(|(name, neighborhoods)| Borough { name, neighborhoods })
        .collect())
}

/// Keep only the named boroughs, preserving enumeration order.
///
/// Names match case-insensitively. An empty selection keeps everything.
pub fn select_boroughs(boroughs: Vec<Borough>, wanted: &[String]) -> Result<Vec<Borough>> {
    if wanted.is_empty() {
        return Ok(boroughs);
    }
    if let Some(missing) = wanted
        .iter()
        .find(|w| !boroughs.iter().any(|b| b.name.eq_ignore_ascii_case(w)))
    {
        return Err(CensusError::UnknownBorough(missing.clone()));
    }
    Ok(boroughs
        .into_iter()
        .filter(|b| wanted.iter().any(|w| b.name.eq_ignore_ascii_case(w)))
        .collect())
}

/// What to keep when the same place id is seen twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Keep the first record, discard later ones.
    #[default]
    FirstSeen,
    /// Swap in a later record when it carries strictly more fields.
    MostComplete,
}

impl FromStr for DedupPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-seen" | "first_seen" | "first" => Ok(DedupPolicy::FirstSeen),
            "most-complete" | "most_complete" | "complete" => Ok(DedupPolicy::MostComplete),
            other => Err(format!(
                "unknown dedup policy '{}' (expected first-seen or most-complete)",
                other
            )),
        }
    }
}

impl fmt::Display for DedupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DedupPolicy::FirstSeen => f.write_str("first-seen"),
            DedupPolicy::MostComplete => f.write_str("most-complete"),
        }
    }
}

/// Text query built for each neighborhood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    pub template: String,
    pub category: String,
    pub city: String,
}

impl Default for QueryTemplate {
    fn default() -> Self {
        Self {
            template: "{category} in {neighborhood}, {borough}, {city}".to_string(),
            category: "pizza restaurants".to_string(),
            city: "New York City".to_string(),
        }
    }
}

impl QueryTemplate {
    pub fn render(&self, neighborhood: &str, borough: &str) -> String {
        self.template
            .replace("{category}", &self.category)
            .replace("{neighborhood}", neighborhood)
            .replace("{borough}", borough)
            .replace("{city}", &self.city)
    }
}

/// Per-neighborhood pagination settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    /// `maxResultCount` sent with every page.
    pub page_size: u32,

    /// Upper bound on requests per neighborhood.
    pub max_pages: u32,

    /// Minimum spacing between page requests. Zero disables pacing.
    pub page_interval: Duration,

    /// Retries for a page that failed in transport. Zero means none.
    pub max_retries: u32,

    /// Backoff before the first retry; doubled for each following one.
    pub retry_backoff: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            max_pages: 10,
            page_interval: Duration::from_secs(2),
            max_retries: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl FetchConfig {
    /// No pacing, no retries. Handy for tests and dry runs against fakes.
    pub fn unpaced() -> Self {
        Self {
            page_interval: Duration::ZERO,
            retry_backoff: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = backoff;
        self
    }
}

/// Where and how result documents are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    pub dir: PathBuf,

    /// Appended to the normalized borough name.
    pub borough_suffix: String,

    /// File name of the citywide document.
    pub citywide_file: String,

    /// Length of the citywide neighborhood ranking.
    pub top_neighborhoods: usize,

    pub source_label: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            borough_suffix: "_pizza_places.json".to_string(),
            citywide_file: "nyc_pizza_places.json".to_string(),
            top_neighborhoods: 20,
            source_label: "Google Places API".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }
}

/// Full configuration of a census run.
#[derive(Debug, Clone)]
pub struct CensusConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub field_mask: String,
    pub neighborhoods_file: PathBuf,
    pub query: QueryTemplate,
    pub fetch: FetchConfig,

    /// Minimum spacing between neighborhoods. Zero disables pacing.
    pub neighborhood_interval: Duration,

    pub output: OutputConfig,
    pub dedup_policy: DedupPolicy,
}

impl CensusConfig {
    /// Load configuration from the environment (and `.env` when present).
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GOOGLE_PLACES_API_KEY")
            .map(SecretString::from)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| CensusError::Config("GOOGLE_PLACES_API_KEY must be set".into()))?;

        let defaults = QueryTemplate::default();
        let query = QueryTemplate {
            template: lookup("CENSUS_QUERY_TEMPLATE").unwrap_or(defaults.template),
            category: lookup("CENSUS_CATEGORY").unwrap_or(defaults.category),
            city: lookup("CENSUS_CITY").unwrap_or(defaults.city),
        };

        let fetch = FetchConfig {
            page_size: parse_or(&lookup, "CENSUS_PAGE_SIZE", 20)?,
            max_pages: parse_or(&lookup, "CENSUS_MAX_PAGES", 10)?,
            page_interval: millis_or(&lookup, "CENSUS_PAGE_INTERVAL_MS", 2_000)?,
            max_retries: parse_or(&lookup, "CENSUS_MAX_RETRIES", 0)?,
            retry_backoff: millis_or(&lookup, "CENSUS_RETRY_BACKOFF_MS", 500)?,
        };
        if fetch.page_size == 0 {
            return Err(CensusError::Config("CENSUS_PAGE_SIZE must be at least 1".into()));
        }

        let defaults = OutputConfig::default();
        let citywide_file = lookup("CENSUS_CITYWIDE_FILE").unwrap_or(defaults.citywide_file);
        if citywide_file.trim().is_empty() {
            return Err(CensusError::Config(
                "CENSUS_CITYWIDE_FILE must not be empty".to_string(),
            ));
        }
        let output = OutputConfig {
            dir: lookup("CENSUS_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.dir),
            borough_suffix: lookup("CENSUS_BOROUGH_SUFFIX").unwrap_or(defaults.borough_suffix),
            citywide_file,
            top_neighborhoods: parse_or(&lookup, "CENSUS_TOP_NEIGHBORHOODS", 20)?,
            source_label: defaults.source_label,
        };

        let dedup_policy = match lookup("CENSUS_DEDUP_POLICY") {
            Some(raw) => raw.parse().map_err(CensusError::Config)?,
            None => DedupPolicy::default(),
        };

        Ok(Self {
            api_key,
            base_url: lookup("PLACES_API_BASE_URL")
                .unwrap_or_else(|| places_client::DEFAULT_BASE_URL.to_string()),
            field_mask: lookup("PLACES_FIELD_MASK")
                .unwrap_or_else(|| places_client::DEFAULT_FIELD_MASK.to_string()),
            neighborhoods_file: lookup("NEIGHBORHOODS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("config/neighborhoods.json")),
            query,
            fetch,
            neighborhood_interval: millis_or(&lookup, "CENSUS_NEIGHBORHOOD_INTERVAL_MS", 3_000)?,
            output,
            dedup_policy,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| {
                CensusError::Config(format!("{} must be a valid number, got '{}'", key, raw))
            }),
        None => Ok(default),
    }
}

fn millis_or<F>(lookup: &F, key: &str, default_ms: u64) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(lookup, key, default_ms).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_observed_run() {
        let config =
            CensusConfig::from_lookup(lookup_from(&[("GOOGLE_PLACES_API_KEY", "k")])).unwrap();

        assert_eq!(config.fetch.page_size, 20);
        assert_eq!(config.fetch.max_pages, 10);
        assert_eq!(config.fetch.page_interval, Duration::from_secs(2));
        assert_eq!(config.fetch.max_retries, 0);
        assert_eq!(config.neighborhood_interval, Duration::from_secs(3));
        assert_eq!(config.dedup_policy, DedupPolicy::FirstSeen);
        assert_eq!(config.output.citywide_file, "nyc_pizza_places.json");
        assert_eq!(config.neighborhoods_file, PathBuf::from("config/neighborhoods.json"));
        assert_eq!(
            config.query.render("DUMBO", "Brooklyn"),
            "pizza restaurants in DUMBO, Brooklyn, New York City"
        );
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        let err = CensusConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("GOOGLE_PLACES_API_KEY"));

        let err =
            CensusConfig::from_lookup(lookup_from(&[("GOOGLE_PLACES_API_KEY", " ")])).unwrap_err();
        assert!(matches!(err, CensusError::Config(_)));
    }

    #[test]
    fn test_overrides_and_invalid_numbers() {
        let config = CensusConfig::from_lookup(lookup_from(&[
            ("GOOGLE_PLACES_API_KEY", "k"),
            ("CENSUS_MAX_PAGES", "3"),
            ("CENSUS_PAGE_INTERVAL_MS", "0"),
            ("CENSUS_DEDUP_POLICY", "most-complete"),
            ("CENSUS_CATEGORY", "bagel shops"),
        ]))
        .unwrap();
        assert_eq!(config.fetch.max_pages, 3);
        assert_eq!(config.fetch.page_interval, Duration::ZERO);
        assert_eq!(config.dedup_policy, DedupPolicy::MostComplete);
        assert!(config.query.render("Astoria", "Queens").starts_with("bagel shops in Astoria"));

        let err = CensusConfig::from_lookup(lookup_from(&[
            ("GOOGLE_PLACES_API_KEY", "k"),
            ("CENSUS_MAX_PAGES", "ten"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("CENSUS_MAX_PAGES"));
    }

    #[test]
    fn test_output_file_names_from_env() {
        let config = CensusConfig::from_lookup(lookup_from(&[
            ("GOOGLE_PLACES_API_KEY", "k"),
            ("CENSUS_OUTPUT_DIR", "out"),
            ("CENSUS_BOROUGH_SUFFIX", "_bagels.json"),
            ("CENSUS_CITYWIDE_FILE", "nyc_bagels.json"),
        ]))
        .unwrap();
        assert_eq!(config.output.dir, PathBuf::from("out"));
        assert_eq!(config.output.borough_suffix, "_bagels.json");
        assert_eq!(config.output.citywide_file, "nyc_bagels.json");
        assert_eq!(config.output.source_label, "Google Places API");

        let err = CensusConfig::from_lookup(lookup_from(&[
            ("GOOGLE_PLACES_API_KEY", "k"),
            ("CENSUS_CITYWIDE_FILE", ""),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("CENSUS_CITYWIDE_FILE"));
    }

    #[test]
    fn test_api_key_redacted_in_debug() {
        let lookup = lookup_from(&[("GOOGLE_PLACES_API_KEY", "AIzaSy-secret")]);
        let config = CensusConfig::from_lookup(lookup).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("AIzaSy-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_parse_boroughs_keeps_file_order() {
        let boroughs = parse_boroughs(
            r#"{ "Staten Island": ["St. George"], "Brooklyn": ["DUMBO", "Red Hook"] }"#,
        )
        .unwrap();
        assert_eq!(boroughs[0].name, "Staten Island");
        assert_eq!(boroughs[1], Borough::new("Brooklyn", ["DUMBO", "Red Hook"]));
    }

    #[test]
    fn test_select_boroughs() {
        let all = vec![
            Borough::new("Brooklyn", ["DUMBO"]),
            Borough::new("Manhattan", ["Tribeca"]),
            Borough::new("Queens", ["Astoria"]),
        ];

        let picked = select_boroughs(all.clone(), &["queens".into(), "Brooklyn".into()]).unwrap();
        let names: Vec<_> = picked.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["Brooklyn", "Queens"]);

        assert_eq!(select_boroughs(all.clone(), &[]).unwrap().len(), 3);

        let err = select_boroughs(all, &["Hoboken".into()]).unwrap_err();
        assert!(matches!(err, CensusError::UnknownBorough(name) if name == "Hoboken"));
    }

    #[test]
    fn test_load_boroughs_reports_path() {
        let err = load_boroughs(Path::new("/nonexistent/neighborhoods.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/neighborhoods.json"));
    }

    #[test]
    fn test_dedup_policy_parse() {
        assert_eq!("first-seen".parse::<DedupPolicy>(), Ok(DedupPolicy::FirstSeen));
        assert_eq!("Most_Complete".parse::<DedupPolicy>(), Ok(DedupPolicy::MostComplete));
        assert!("newest".parse::<DedupPolicy>().is_err());
        assert_eq!(DedupPolicy::MostComplete.to_string(), "most-complete");
    }
}
