//! Place searcher trait.
//!
//! The fetcher only needs "give me one page for this request". Keeping that
//! behind a trait lets the pipeline run against the real Places API or a
//! scripted mock (see [`crate::testing::MockPlaceSearcher`]).

use async_trait::async_trait;
use places_client::{PlacesClient, SearchTextRequest, SearchTextResponse};

use crate::config::CensusConfig;
use crate::error::FetchResult;

#[async_trait]
pub trait PlaceSearcher: Send + Sync {
    /// Run one text-search page.
    async fn search_page(&self, request: &SearchTextRequest) -> FetchResult<SearchTextResponse>;
}

/// Searcher backed by the Google Places API.
pub struct GooglePlacesSearcher {
    client: PlacesClient,
}

impl GooglePlacesSearcher {
    pub fn new(client: PlacesClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &CensusConfig) -> Self {
        let client = PlacesClient::new(config.api_key.expose().to_string())
            .with_base_url(config.base_url.clone())
            .with_field_mask(config.field_mask.clone());
        Self::new(client)
    }
}

#[async_trait]
impl PlaceSearcher for GooglePlacesSearcher {
    async fn search_page(&self, request: &SearchTextRequest) -> FetchResult<SearchTextResponse> {
        Ok(self.client.search_text(request).await?)
    }
}
