use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlacesError {
    /// The request never produced a response body (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream answered with something that is not a search response.
    #[error("failed to decode response (status {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

impl PlacesError {
    /// Whether a retry has any chance of succeeding.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlacesError::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, PlacesError>;
