//! Testing utilities.
//!
//! A scripted [`PlaceSearcher`] so the fetcher and the whole census pipeline
//! can run without network calls.

use async_trait::async_trait;
use places_client::{ApiErrorBody, LocalizedText, Place, SearchTextRequest, SearchTextResponse};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use crate::error::{FetchError, FetchResult};
use crate::traits::searcher::PlaceSearcher;

/// A minimal place with an id and a display name.
pub fn place(id: &str) -> Place {
    Place {
        id: Some(id.to_string()),
        display_name: Some(LocalizedText {
            text: Some(format!("Pizzeria {}", id)),
            language_code: Some("en".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[derive(Debug, Clone)]
enum Scripted {
    Response(SearchTextResponse),
    Failure,
    DecodeFailure,
}

/// Mock searcher that replays scripted pages.
///
/// Pages registered for a specific text query are served to that query
/// first; everything else is served from the shared queue in order. Once a
/// queue runs dry the mock answers with an empty response (no results field).
#[derive(Default)]
pub struct MockPlaceSearcher {
    default_queue: Arc<RwLock<VecDeque<Scripted>>>,
    by_query: Arc<RwLock<HashMap<String, VecDeque<Scripted>>>>,
    calls: Arc<RwLock<Vec<SearchTextRequest>>>,
}

impl MockPlaceSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, scripted: Scripted) -> Self {
        self.default_queue.write().unwrap().push_back(scripted);
        self
    }

    fn push_for(self, query: &str, scripted: Scripted) -> Self {
        self.by_query
            .write()
            .unwrap()
            .entry(query.to_string())
            .or_default()
            .push_back(scripted);
        self
    }

    fn page(places: Vec<Place>, next_page_token: Option<&str>) -> Scripted {
        Scripted::Response(SearchTextResponse {
            places: Some(places),
            next_page_token: next_page_token.map(str::to_string),
            error: None,
        })
    }

    /// Queue a page of results.
    pub fn with_page(self, places: Vec<Place>, next_page_token: Option<&str>) -> Self {
        self.push(Self::page(places, next_page_token))
    }

    /// Queue a page of results for one exact text query.
    pub fn with_query_page(
        self,
        query: &str,
        places: Vec<Place>,
        next_page_token: Option<&str>,
    ) -> Self {
        self.push_for(query, Self::page(places, next_page_token))
    }

    /// Queue a response without a results field.
    pub fn with_empty_page(self) -> Self {
        self.push(Scripted::Response(SearchTextResponse::default()))
    }

    /// Queue an upstream error payload.
    pub fn with_upstream_error(self, code: i64, message: &str) -> Self {
        self.push(Scripted::Response(SearchTextResponse {
            places: None,
            next_page_token: None,
            error: Some(ApiErrorBody {
                code,
                message: message.to_string(),
                status: "PERMISSION_DENIED".to_string(),
            }),
        }))
    }

    /// Queue a transport failure.
    pub fn with_failure(self) -> Self {
        self.push(Scripted::Failure)
    }

    /// Queue a transport failure for one exact text query.
    pub fn with_query_failure(self, query: &str) -> Self {
        self.push_for(query, Scripted::Failure)
    }

    /// Queue an unparseable response.
    pub fn with_decode_failure(self) -> Self {
        self.push(Scripted::DecodeFailure)
    }

    /// Get all requests made to this mock.
    pub fn calls(&self) -> Vec<SearchTextRequest> {
        self.calls.read().unwrap().clone()
    }

    fn next_for(&self, query: &str) -> Option<Scripted> {
        if let Some(queue) = self.by_query.write().unwrap().get_mut(query) {
            if let Some(scripted) = queue.pop_front() {
                return Some(scripted);
            }
        }
        self.default_queue.write().unwrap().pop_front()
    }
}

#[async_trait]
impl PlaceSearcher for MockPlaceSearcher {
    async fn search_page(&self, request: &SearchTextRequest) -> FetchResult<SearchTextResponse> {
        self.calls.write().unwrap().push(request.clone());

        match self.next_for(&request.text_query) {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::Failure) => Err(FetchError::Http(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Mock connection refused",
            )))),
            Some(Scripted::DecodeFailure) => Err(FetchError::Decode(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "Mock malformed body",
            )))),
            None => Ok(SearchTextResponse::default()),
        }
    }
}
