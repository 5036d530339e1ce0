//! In-memory backend for controller tests

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::models::*;
use super::Backend;
use crate::error::{ClientError, ClientResult};
use crate::util::lock;

#[derive(Default)]
struct State {
    search: HashMap<String, SearchResponse>,
    provinces: HashMap<String, Vec<String>>,
    delays: HashMap<String, Duration>,
    failing: bool,
    history: Vec<HistoryItem>,
    history_error: Option<String>,
    auth: Option<AuthReply>,
    preferences: Option<PreferencesReply>,
    calls: Vec<String>,
}

/// Scripted backend. Unknown queries return empty results.
#[derive(Default)]
pub(crate) struct FakeBackend {
    state: Mutex<State>,
}

pub(crate) fn destination(id: i64, name: &str) -> Destination {
    Destination {
        id,
        name: name.to_string(),
        location: "Lâm Đồng".to_string(),
        travel_type: "nature".to_string(),
        score: Some(87.0),
        avg_rating: Some(4.4),
    }
}

pub(crate) fn tour(slug: &str, name: &str) -> Tour {
    Tour {
        slug: slug.to_string(),
        name: name.to_string(),
        price: Some(Price::Amount(1_500_000.0)),
    }
}

pub(crate) fn auth_success(email: &str) -> AuthReply {
    AuthReply::Accepted(AuthSuccess {
        tokens: Tokens {
            access: "access-token".to_string(),
            refresh: "refresh-token".to_string(),
        },
        user: serde_json::json!({ "username": "traveler", "email": email }),
    })
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(self, query: &str, response: SearchResponse) -> Self {
        lock(&self.state).search.insert(query.to_string(), response);
        self
    }

    pub fn with_provinces(self, query: &str, provinces: &[&str]) -> Self {
        lock(&self.state).provinces.insert(
            query.to_string(),
            provinces.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    /// Delay the answer for `query` (search and provinces)
    pub fn with_delay(self, query: &str, delay: Duration) -> Self {
        lock(&self.state).delays.insert(query.to_string(), delay);
        self
    }

    pub fn with_history(self, items: &[(&str, u32)]) -> Self {
        lock(&self.state).history = items
            .iter()
            .map(|(query, count)| HistoryItem {
                query: query.to_string(),
                search_count: *count,
            })
            .collect();
        self
    }

    pub fn with_history_error(self, message: &str) -> Self {
        lock(&self.state).history_error = Some(message.to_string());
        self
    }

    pub fn with_auth(self, reply: AuthReply) -> Self {
        lock(&self.state).auth = Some(reply);
        self
    }

    pub fn with_preferences(self, reply: PreferencesReply) -> Self {
        lock(&self.state).preferences = Some(reply);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        lock(&self.state).failing = failing;
    }

    /// Calls in arrival order, e.g. `search:Huế`
    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn history(&self) -> Vec<HistoryItem> {
        lock(&self.state).history.clone()
    }

    /// Record the call; returns the configured delay and whether to fail
    fn record(&self, call: String, key: &str) -> (Option<Duration>, bool) {
        let mut state = lock(&self.state);
        state.calls.push(call);
        (state.delays.get(key).copied(), state.failing)
    }

    async fn settle(&self, call: String, key: &str) -> ClientResult<()> {
        let (delay, failing) = self.record(call, key);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if failing {
            return Err(ClientError::Network("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn search(&self, query: &str) -> ClientResult<SearchResponse> {
        self.settle(format!("search:{}", query), query).await?;
        Ok(lock(&self.state)
            .search
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    async fn provinces(&self, query: &str) -> ClientResult<Vec<String>> {
        self.settle(format!("provinces:{}", query), query).await?;
        Ok(lock(&self.state)
            .provinces
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    async fn search_history(&self, limit: usize) -> ClientResult<Vec<HistoryItem>> {
        self.settle(format!("history:{}", limit), "").await?;
        Ok(lock(&self.state)
            .history
            .iter()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn delete_history(&self, target: &DeleteTarget) -> ClientResult<DeleteOutcome> {
        self.settle(format!("delete:{:?}", target), "").await?;
        let mut state = lock(&self.state);
        if let Some(error) = &state.history_error {
            return Ok(DeleteOutcome::Failed(error.clone()));
        }
        match target {
            DeleteTarget::Query(query) => state.history.retain(|item| &item.query != query),
            DeleteTarget::All => state.history.clear(),
        }
        Ok(DeleteOutcome::Deleted)
    }

    async fn login(&self, email: &str, _password: &str) -> ClientResult<AuthReply> {
        self.settle(format!("login:{}", email), "").await?;
        Ok(lock(&self.state)
            .auth
            .clone()
            .unwrap_or_else(|| auth_success(email)))
    }

    async fn register(
        &self,
        username: &str,
        email: &str,
        _password: &str,
    ) -> ClientResult<AuthReply> {
        self.settle(format!("register:{}:{}", username, email), "")
            .await?;
        Ok(lock(&self.state)
            .auth
            .clone()
            .unwrap_or_else(|| auth_success(email)))
    }

    async fn save_preferences(
        &self,
        access_token: &str,
        _preferences: &Preferences,
    ) -> ClientResult<PreferencesReply> {
        self.settle(format!("preferences:{}", access_token), "")
            .await?;
        Ok(lock(&self.state)
            .preferences
            .unwrap_or(PreferencesReply::Saved))
    }

    async fn logout(&self, refresh_token: &str) -> ClientResult<()> {
        self.settle(format!("logout:{}", refresh_token), "").await
    }
}
