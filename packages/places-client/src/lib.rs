//! Pure Google Places text-search client.
//!
//! A minimal client for the Places API (v1) `places:searchText` endpoint.
//! One call returns one page; following `nextPageToken` is left to the
//! caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use places_client::{PlacesClient, SearchTextRequest};
//!
//! let client = PlacesClient::new("your-api-key".into());
//!
//! let page = client
//!     .search_text(&SearchTextRequest::new("pizza restaurants in DUMBO, Brooklyn", 20))
//!     .await?;
//! for place in page.places.unwrap_or_default() {
//!     println!("{}", place.name().unwrap_or("(unnamed)"));
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{PlacesError, Result};
pub use types::{
    ApiErrorBody, LatLng, LocalizedText, OpeningHours, Place, SearchTextRequest,
    SearchTextResponse,
};

pub const DEFAULT_BASE_URL: &str = "https://places.googleapis.com";

/// Fields requested from the upstream, including the pagination token.
pub const DEFAULT_FIELD_MASK: &str = concat!(
    "places.id,places.displayName,places.formattedAddress,places.priceLevel,",
    "places.regularOpeningHours,places.location,places.rating,places.userRatingCount,",
    "places.types,nextPageToken"
);

pub struct PlacesClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    field_mask: String,
}

impl PlacesClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            field_mask: DEFAULT_FIELD_MASK.to_string(),
        }
    }

    /// Point the client at another host (proxies, local fakes).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_field_mask(mut self, field_mask: impl Into<String>) -> Self {
        self.field_mask = field_mask.into();
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1/places:searchText", self.base_url)
    }

    /// Run one text search page.
    ///
    /// The body is decoded whatever the HTTP status: a rejected request comes
    /// back as a response whose `error` is set, not as an `Err`.
    pub async fn search_text(&self, request: &SearchTextRequest) -> Result<SearchTextResponse> {
        let resp = self
            .client
            .post(self.endpoint())
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", &self.field_mask)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        tracing::debug!(status = status.as_u16(), bytes = body.len(), "searchText response");

        serde_json::from_str(&body).map_err(|source| PlacesError::Decode {
            status: status.as_u16(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let client = PlacesClient::new("key".into()).with_base_url("http://localhost:8089/");
        assert_eq!(client.endpoint(), "http://localhost:8089/v1/places:searchText");
    }

    #[test]
    fn test_default_field_mask_requests_page_token() {
        assert!(DEFAULT_FIELD_MASK.split(',').any(|f| f == "nextPageToken"));
        assert!(DEFAULT_FIELD_MASK.split(',').any(|f| f == "places.id"));
    }

    #[test]
    fn test_decode_failure_is_not_transient() {
        let source = serde_json::from_str::<SearchTextResponse>("<html>").unwrap_err();
        let err = PlacesError::Decode { status: 502, source };
        assert!(!err.is_transient());
        assert!(err.to_string().contains("status 502"));
    }
}
