//! Wire types for the travel backend API

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Search
// ─────────────────────────────────────────────────────────────────────────────

/// A destination returned by `/api/search/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub travel_type: String,
    /// Ranking score; the backend omits it for unscored destinations
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub avg_rating: Option<f64>,
}

/// Tour price as the backend serializes it (decimal fields arrive as strings)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Amount(f64),
    Text(String),
}

/// A tour package returned by `/api/search/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub price: Option<Price>,
}

/// Body of `GET /api/search/?q=`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<Destination>,
    #[serde(default)]
    pub tours: Vec<Tour>,
}

impl SearchResponse {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.tours.is_empty()
    }
}

/// Body of `GET /api/provinces/?q=`
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ProvincesResponse {
    #[serde(default)]
    pub provinces: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Search history
// ─────────────────────────────────────────────────────────────────────────────

fn default_search_count() -> u32 {
    1
}

/// One entry of the visitor's search history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub query: String,
    #[serde(default = "default_search_count")]
    pub search_count: u32,
}

/// Body of `GET /api/search-history/?limit=N`
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct HistoryResponse {
    #[serde(default)]
    pub history: Vec<HistoryItem>,
}

/// What to delete from the history
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Query(String),
    All,
}

impl DeleteTarget {
    /// Request body: `{"query": ..}` or `{"delete_all": true}`
    pub fn to_body(&self) -> serde_json::Value {
        match self {
            Self::Query(query) => serde_json::json!({ "query": query }),
            Self::All => serde_json::json!({ "delete_all": true }),
        }
    }
}

/// Body of `POST /api/search-history/delete/`
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct DeleteReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of a history deletion as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Failed(String),
}

impl From<DeleteReply> for DeleteOutcome {
    fn from(reply: DeleteReply) -> Self {
        if reply.success {
            Self::Deleted
        } else {
            Self::Failed(reply.error.unwrap_or_else(|| "Unknown error".to_string()))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// Token pair issued at login/register
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens {
    pub access: String,
    pub refresh: String,
}

/// Successful login/register body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSuccess {
    pub tokens: Tokens,
    pub user: serde_json::Value,
}

/// Rejected login/register body. Field errors come as lists of messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthRejection {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub email: Vec<String>,
    #[serde(default)]
    pub username: Vec<String>,
}

impl AuthRejection {
    /// Most specific message available: detail, then email, then username
    pub fn message(&self) -> Option<&str> {
        self.detail
            .as_deref()
            .or_else(|| self.email.first().map(String::as_str))
            .or_else(|| self.username.first().map(String::as_str))
    }
}

/// Outcome of `/auth/login` and `/auth/register`
#[derive(Debug, Clone, PartialEq)]
pub enum AuthReply {
    Accepted(AuthSuccess),
    Rejected(AuthRejection),
}

/// Body of `POST /auth/preferences`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub travel_types: Vec<String>,
    pub locations: Vec<String>,
}

/// Outcome of `POST /auth/preferences`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferencesReply {
    Saved,
    Unauthorized,
    Failed(u16),
}

impl PreferencesReply {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            200..=299 => Self::Saved,
            other => Self::Failed(other),
        }
    }
}
