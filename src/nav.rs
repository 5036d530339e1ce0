//! Client-side navigation targets

use std::fmt;

use crate::api::with_query;

/// Where the page goes after a selection or submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// `/destination/{id}/`
    Destination { id: i64 },
    /// `/tour/{slug}/`
    Tour { slug: String },
    /// `/search/?q=` with the literal query, percent-encoded
    Search { query: String },
}

impl Navigation {
    pub fn search(query: impl Into<String>) -> Self {
        Self::Search {
            query: query.into(),
        }
    }

    /// Path (and query string) relative to the site root
    pub fn to_url(&self) -> String {
        match self {
            Self::Destination { id } => format!("/destination/{}/", id),
            Self::Tour { slug } => format!("/tour/{}/", urlencoding::encode(slug)),
            Self::Search { query } => with_query("/search/", &[("q", query.as_str())]),
        }
    }
}

impl fmt::Display for Navigation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_url())
    }
}
