//! Recent-search history section
//!
//! Keyed by visitor on the server side, so no login is needed. The section is
//! hidden whenever there is nothing to show or the load failed.

use std::sync::{Arc, Mutex};

use crate::api::{Backend, DeleteOutcome, DeleteTarget, HistoryItem};
use crate::error::ClientResult;
use crate::nav::Navigation;
use crate::util::{lock, log_query};

/// How many searches the section lists by default
pub const DEFAULT_HISTORY_LIMIT: usize = 8;

/// One rendered history row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub query: String,
    pub href: String,
    /// Only present when the query was searched more than once
    pub badge: Option<String>,
}

impl From<&HistoryItem> for HistoryEntry {
    fn from(item: &HistoryItem) -> Self {
        Self {
            query: item.query.clone(),
            href: Navigation::search(item.query.as_str()).to_url(),
            badge: (item.search_count > 1).then(|| format!("{} searches", item.search_count)),
        }
    }
}

#[derive(Default)]
struct HistoryState {
    visible: bool,
    items: Vec<HistoryItem>,
}

pub struct HistoryPanel {
    backend: Arc<dyn Backend>,
    limit: usize,
    state: Mutex<HistoryState>,
}

impl HistoryPanel {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_limit(backend, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(backend: Arc<dyn Backend>, limit: usize) -> Self {
        Self {
            backend,
            limit,
            state: Mutex::new(HistoryState::default()),
        }
    }

    /// Fetch and show the latest searches
    pub async fn load(&self) {
        let result = self.backend.search_history(self.limit).await;

        let mut state = lock(&self.state);
        match result {
            Ok(items) => {
                state.visible = !items.is_empty();
                state.items = items;
            }
            Err(e) => {
                tracing::error!("Error loading search history: {}", e);
                state.visible = false;
            }
        }
    }

    /// Delete one query and reload on success.
    ///
    /// Deleting a query that is not in the history still succeeds.
    pub async fn delete(&self, query: &str) -> ClientResult<DeleteOutcome> {
        let target = DeleteTarget::Query(query.to_string());
        let outcome = match self.backend.delete_history(&target).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Error deleting history {:?}: {}", log_query(query), e);
                return Err(e);
            }
        };

        match &outcome {
            DeleteOutcome::Deleted => self.load().await,
            DeleteOutcome::Failed(error) => tracing::error!("Error: {}", error),
        }
        Ok(outcome)
    }

    /// Delete everything. A server-side refusal comes back as `Failed` for the
    /// caller to show.
    pub async fn clear_all(&self) -> ClientResult<DeleteOutcome> {
        let outcome = match self.backend.delete_history(&DeleteTarget::All).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Error clearing history: {}", e);
                return Err(e);
            }
        };

        if outcome == DeleteOutcome::Deleted {
            let mut state = lock(&self.state);
            state.visible = false;
            state.items.clear();
        }
        Ok(outcome)
    }

    pub fn is_visible(&self) -> bool {
        lock(&self.state).visible
    }

    pub fn items(&self) -> Vec<HistoryItem> {
        lock(&self.state).items.clone()
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        lock(&self.state).items.iter().map(HistoryEntry::from).collect()
    }
}
