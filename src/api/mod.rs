//! HTTP client adapter for the travel backend
//!
//! `Backend` is the seam every controller talks through. `ApiClient` is the
//! reqwest implementation; tests drive controllers with an in-memory fake.
//!
//! One attempt per call, no retries. Debouncing upstream is what keeps the
//! request rate down.

pub mod models;

#[cfg(test)]
pub(crate) mod fake;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::error::{ClientError, ClientResult};
use crate::util::log_query;

pub use models::{
    AuthRejection, AuthReply, AuthSuccess, DeleteOutcome, DeleteTarget, Destination, HistoryItem,
    Preferences, PreferencesReply, Price, SearchResponse, Tokens, Tour,
};
use models::{DeleteReply, HistoryResponse, ProvincesResponse};

// ─────────────────────────────────────────────────────────────────────────────
// Endpoints
// ─────────────────────────────────────────────────────────────────────────────

pub const SEARCH_PATH: &str = "/api/search/";
pub const PROVINCES_PATH: &str = "/api/provinces/";
pub const HISTORY_PATH: &str = "/api/search-history/";
pub const HISTORY_DELETE_PATH: &str = "/api/search-history/delete/";
pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const PREFERENCES_PATH: &str = "/auth/preferences";
pub const LOGOUT_PATH: &str = "/auth/logout";

/// Name of the cookie Django stores its CSRF token in
const CSRF_COOKIE: &str = "csrftoken";

// ─────────────────────────────────────────────────────────────────────────────
// Backend trait
// ─────────────────────────────────────────────────────────────────────────────

/// Everything the page needs from the backend
#[async_trait]
pub trait Backend: Send + Sync {
    /// Destination and tour suggestions for a typed query
    async fn search(&self, query: &str) -> ClientResult<SearchResponse>;

    /// Province names matching a typed query
    async fn provinces(&self, query: &str) -> ClientResult<Vec<String>>;

    /// Most recent searches for this visitor
    async fn search_history(&self, limit: usize) -> ClientResult<Vec<HistoryItem>>;

    async fn delete_history(&self, target: &DeleteTarget) -> ClientResult<DeleteOutcome>;

    async fn login(&self, email: &str, password: &str) -> ClientResult<AuthReply>;

    async fn register(&self, username: &str, email: &str, password: &str)
        -> ClientResult<AuthReply>;

    async fn save_preferences(
        &self,
        access_token: &str,
        preferences: &Preferences,
    ) -> ClientResult<PreferencesReply>;

    async fn logout(&self, refresh_token: &str) -> ClientResult<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// URL helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Build `path?k=v&..` with percent-encoded values
pub fn with_query(path: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", path, query)
}

/// Extract the CSRF token from a `Cookie` header value
pub fn csrf_token_from_cookie(cookie_header: &str) -> Option<String> {
    let prefix = format!("{}=", CSRF_COOKIE);
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))
        .map(|raw| {
            urlencoding::decode(raw)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| raw.to_string())
        })
}

// ─────────────────────────────────────────────────────────────────────────────
// reqwest implementation
// ─────────────────────────────────────────────────────────────────────────────

/// reqwest-backed `Backend`
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    csrf_token: Option<String>,
}

impl ApiClient {
    /// Create a client against `base_url` (e.g. `http://localhost:8000`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            csrf_token: None,
        })
    }

    pub fn from_config(config: &Config) -> ClientResult<Self> {
        let client = Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(client.with_csrf_token(config.csrf_token.clone()))
    }

    /// Token sent as `X-CSRFToken` on history deletions
    pub fn with_csrf_token(mut self, token: Option<String>) -> Self {
        self.csrf_token = token;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    /// GET and decode JSON. Non-2xx and undecodable bodies are network errors.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> ClientResult<T> {
        let url = self.url(&with_query(path, params));
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Network(format!("GET {} returned {}", path, status)));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Network(format!("Invalid JSON from {}: {}", path, e)))
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> ClientResult<reqwest::Response> {
        let mut request = self
            .client
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .json(body);

        if let Some(token) = bearer {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        tracing::debug!("POST {}", path);
        Ok(request.send().await?)
    }

    /// Decode a login/register response
    async fn auth_reply(response: reqwest::Response) -> ClientResult<AuthReply> {
        if response.status().is_success() {
            let success: AuthSuccess = response
                .json()
                .await
                .map_err(|e| ClientError::Network(format!("Invalid auth response: {}", e)))?;
            Ok(AuthReply::Accepted(success))
        } else {
            let status = response.status();
            let rejection = response.json::<AuthRejection>().await.unwrap_or_else(|e| {
                tracing::debug!("Auth rejection ({}) without JSON body: {}", status, e);
                AuthRejection::default()
            });
            Ok(AuthReply::Rejected(rejection))
        }
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn search(&self, query: &str) -> ClientResult<SearchResponse> {
        tracing::debug!("search q={:?}", log_query(query));
        self.get_json(SEARCH_PATH, &[("q", query)]).await
    }

    async fn provinces(&self, query: &str) -> ClientResult<Vec<String>> {
        let body: ProvincesResponse = self.get_json(PROVINCES_PATH, &[("q", query)]).await?;
        Ok(body.provinces)
    }

    async fn search_history(&self, limit: usize) -> ClientResult<Vec<HistoryItem>> {
        let limit = limit.to_string();
        let body: HistoryResponse = self.get_json(HISTORY_PATH, &[("limit", limit.as_str())]).await?;
        Ok(body.history)
    }

    async fn delete_history(&self, target: &DeleteTarget) -> ClientResult<DeleteOutcome> {
        let mut request = self
            .client
            .post(self.url(HISTORY_DELETE_PATH))
            .header("Content-Type", "application/json")
            .json(&target.to_body());
        if let Some(token) = &self.csrf_token {
            request = request.header("X-CSRFToken", token);
        }

        // The backend answers with {success} or {error} regardless of status
        let reply: DeleteReply = request
            .send()
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Network(format!("Invalid delete response: {}", e)))?;
        Ok(reply.into())
    }

    async fn login(&self, email: &str, password: &str) -> ClientResult<AuthReply> {
        let body = serde_json::json!({ "email": email, "password": password });
        let response = self.post_json(LOGIN_PATH, &body, None).await?;
        Self::auth_reply(response).await
    }

    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ClientResult<AuthReply> {
        let body = serde_json::json!({
            "username": username,
            "email": email,
            "password": password,
        });
        let response = self.post_json(REGISTER_PATH, &body, None).await?;
        Self::auth_reply(response).await
    }

    async fn save_preferences(
        &self,
        access_token: &str,
        preferences: &Preferences,
    ) -> ClientResult<PreferencesReply> {
        let response = self
            .post_json(PREFERENCES_PATH, preferences, Some(access_token))
            .await?;
        Ok(PreferencesReply::from_status(response.status().as_u16()))
    }

    async fn logout(&self, refresh_token: &str) -> ClientResult<()> {
        let body = serde_json::json!({ "refresh": refresh_token });
        let response = self.post_json(LOGOUT_PATH, &body, None).await?;
        if !response.status().is_success() {
            tracing::debug!("Logout returned {}", response.status());
        }
        Ok(())
    }
}
