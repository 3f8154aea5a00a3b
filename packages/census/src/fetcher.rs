//! Paginated neighborhood fetcher.
//!
//! Issues one text search per page for a neighborhood, follows
//! `nextPageToken` up to `max_pages`, and stamps every result with the
//! neighborhood and borough it was found under. Nothing that goes wrong here
//! escapes: a failed or empty page ends pagination for this neighborhood and
//! whatever was gathered so far is returned.

use places_client::{ApiErrorBody, SearchTextRequest, SearchTextResponse};

use crate::config::{FetchConfig, QueryTemplate};
use crate::error::FetchResult;
use crate::pacing::Pacer;
use crate::place::CollectedPlace;
use crate::traits::searcher::PlaceSearcher;

/// Why pagination stopped for a neighborhood.
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// Last page carried no continuation token.
    Exhausted,
    /// `max_pages` requests were made.
    PageLimit,
    /// Response had no results field.
    NoResults,
    /// Upstream answered with an error payload.
    Upstream(ApiErrorBody),
    /// Transport or decode failure.
    Failed(String),
}

impl StopReason {
    pub fn is_error(&self) -> bool {
        matches!(self, StopReason::Upstream(_) | StopReason::Failed(_))
    }
}

/// Everything fetched for one neighborhood.
#[derive(Debug, Clone)]
pub struct NeighborhoodFetch {
    pub neighborhood: String,
    pub borough: String,
    pub places: Vec<CollectedPlace>,
    /// Pages requested (retries of the same page count once).
    pub pages: u32,
    pub stop: StopReason,
}

pub struct Fetcher<S: PlaceSearcher> {
    searcher: S,
    config: FetchConfig,
    query: QueryTemplate,
    pacer: Pacer,
}

impl<S: PlaceSearcher> Fetcher<S> {
    pub fn new(searcher: S, config: FetchConfig, query: QueryTemplate) -> Self {
        let pacer = Pacer::new(config.page_interval);
        Self {
            searcher,
            config,
            query,
            pacer,
        }
    }

    pub fn searcher(&self) -> &S {
        &self.searcher
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch every page for one neighborhood.
    pub async fn fetch_neighborhood(&self, neighborhood: &str, borough: &str) -> NeighborhoodFetch {
        let text_query = self.query.render(neighborhood, borough);
        let mut places = Vec::new();
        let mut page_token: Option<String> = None;
        let mut page_count = 0u32;
        let mut pages = 0u32;

        let stop = loop {
            if page_count >= self.config.max_pages {
                break StopReason::PageLimit;
            }

            let mut request = SearchTextRequest::new(text_query.clone(), self.config.page_size);
            if let Some(token) = page_token.take() {
                request = request.with_page_token(token);
            }

            self.pacer.wait().await;
            pages += 1;

            let response = match self.request_page(&request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(
                        neighborhood,
                        borough,
                        page = pages,
                        error = %e,
                        "Error fetching page"
                    );
                    break StopReason::Failed(e.to_string());
                }
            };

            let SearchTextResponse {
                places: results,
                next_page_token,
                error,
            } = response;

            let Some(results) = results else {
                tracing::info!(neighborhood, borough, "No results or error in response");
                match error {
                    Some(error) => {
                        tracing::warn!(
                            neighborhood,
                            borough,
                            error = %error,
                            "Upstream reported an error"
                        );
                        break StopReason::Upstream(error);
                    }
                    None => break StopReason::NoResults,
                }
            };

            tracing::info!(
                neighborhood,
                borough,
                page = pages,
                count = results.len(),
                "Found places"
            );
            places.extend(
                results
                    .into_iter()
                    .map(|place| CollectedPlace::new(place, neighborhood, borough)),
            );

            match next_page_token {
                Some(token) => {
                    page_token = Some(token);
                    page_count += 1;
                }
                None => break StopReason::Exhausted,
            }
        };

        NeighborhoodFetch {
            neighborhood: neighborhood.to_string(),
            borough: borough.to_string(),
            places,
            pages,
            stop,
        }
    }

    /// One page, retrying transport failures with exponential backoff.
    async fn request_page(&self, request: &SearchTextRequest) -> FetchResult<SearchTextResponse> {
        let mut attempt = 0u32;
        let mut backoff = self.config.retry_backoff;

        loop {
            match self.searcher.search_page(request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        max_retries = self.config.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Transient search failure, retrying"
                    );
                    if !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                    }
                    backoff = backoff.saturating_mul(2);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
