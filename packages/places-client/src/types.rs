use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Body of a `places:searchText` call.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchTextRequest {
    pub text_query: String,
    pub max_result_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<String>,
}

impl SearchTextRequest {
    pub fn new(text_query: impl Into<String>, max_result_count: u32) -> Self {
        Self {
            text_query: text_query.into(),
            max_result_count,
            page_token: None,
        }
    }

    /// Continue a previous search from a `nextPageToken`.
    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }
}

/// One page of a text search.
///
/// The upstream omits `places` entirely when nothing matched and returns an
/// `error` object instead of results when the request was rejected.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTextResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub places: Option<Vec<Place>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
}

/// Error payload reported by the upstream in place of results.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.code, self.status, self.message)
    }
}

/// A business record as returned by the search endpoint.
///
/// Only the fields named in the field mask are populated. Absent fields stay
/// absent on output, and anything not modelled here (at this level or inside
/// the nested objects) is kept in an `extra` map, so a record serializes back
/// to the JSON it was decoded from.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<LocalizedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LatLng>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regular_opening_hours: Option<OpeningHours>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Place {
    /// Identifier usable for deduplication, if the record carries one.
    pub fn key(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.display_name.as_ref().and_then(|n| n.text.as_deref())
    }

    /// Number of top-level fields that carry a value.
    pub fn populated_fields(&self) -> usize {
        [
            self.id.is_some(),
            self.display_name.is_some(),
            self.formatted_address.is_some(),
            self.price_level.is_some(),
            self.location.is_some(),
            self.rating.is_some(),
            self.user_rating_count.is_some(),
            self.types.is_some(),
            self.regular_opening_hours.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
            + self.extra.len()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Coordinates. Either half may be missing from a malformed record; that
/// must not fail the whole page.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct LatLng {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `nextOpenTime`, `nextCloseTime`, `specialDays` and friends land in
/// `extra`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHours {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_now: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periods: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday_descriptions: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
