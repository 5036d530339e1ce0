//! Single-slot suggestion cache
//!
//! Holds the last accepted result set so a submit can act without another
//! round trip. No key: whatever was written last is what `peek` returns.

use crate::api::{Destination, SearchResponse, Tour};

/// Snapshot of the cached results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheEntry {
    pub destinations: Vec<Destination>,
    pub tours: Vec<Tour>,
}

impl CacheEntry {
    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty() && self.tours.is_empty()
    }
}

impl From<SearchResponse> for CacheEntry {
    fn from(response: SearchResponse) -> Self {
        Self {
            destinations: response.results,
            tours: response.tours,
        }
    }
}

#[derive(Debug, Default)]
pub struct SuggestionCache {
    slot: CacheEntry,
}

impl SuggestionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot unconditionally
    pub fn update(&mut self, entry: CacheEntry) {
        self.slot = entry;
    }

    pub fn clear(&mut self) {
        self.slot = CacheEntry::default();
    }

    pub fn peek(&self) -> CacheEntry {
        self.slot.clone()
    }

    pub fn first_destination(&self) -> Option<&Destination> {
        self.slot.destinations.first()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_empty()
    }
}
