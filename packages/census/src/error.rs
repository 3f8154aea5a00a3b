//! Typed errors for the census library.
//!
//! Fetch failures never show up here: they end pagination for one
//! neighborhood and are logged. Only setup and output problems are fatal.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CensusError {
    /// A required setting is missing or malformed
    #[error("config error: {0}")]
    Config(String),

    /// Neighborhood enumeration could not be read
    #[error("failed to read neighborhoods from {path}: {source}")]
    NeighborhoodsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Neighborhood enumeration is not a borough -> [neighborhood] object
    #[error("invalid neighborhoods file {path}: {source}")]
    NeighborhoodsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A borough was requested that the enumeration does not contain
    #[error("unknown borough: {0}")]
    UnknownBorough(String),

    /// Output file could not be written
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output document could not be serialized
    #[error("JSON encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors from a single search page. Never fatal to a run.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request failed before a body came back
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Body came back but was not a search response
    #[error("decode error: {0}")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl FetchError {
    /// Transport failures are the only ones worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Http(_))
    }
}

impl From<places_client::PlacesError> for FetchError {
    fn from(err: places_client::PlacesError) -> Self {
        if err.is_transient() {
            FetchError::Http(Box::new(err))
        } else {
            FetchError::Decode(Box::new(err))
        }
    }
}

/// Result type alias for census operations.
pub type Result<T> = std::result::Result<T, CensusError>;

/// Result type alias for a single search page.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
