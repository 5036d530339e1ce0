//! Login session persisted in the key-value store
//!
//! Keys: `access`, `refresh`, `user` (JSON). `recentEmails` lives in the same
//! store but belongs to [`emails::RecentEmails`].

pub mod emails;
pub mod storage;

use std::sync::Arc;

use serde_json::Value;

use crate::api::AuthSuccess;
use crate::error::{ClientError, ClientResult};

pub use emails::{EmailSuggestions, RecentEmails, EMAIL_BLUR_DELAY, RECENT_EMAILS_KEY};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage};

pub const ACCESS_KEY: &str = "access";
pub const REFRESH_KEY: &str = "refresh";
pub const USER_KEY: &str = "user";

/// Tokens plus the user object the backend returned at login
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: Value,
}

impl Session {
    pub fn from_auth(auth: AuthSuccess) -> Self {
        Self {
            access_token: auth.tokens.access,
            refresh_token: Some(auth.tokens.refresh),
            user: auth.user,
        }
    }

    pub fn email(&self) -> Option<&str> {
        self.user
            .get("email")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Username, else the local part of the email, else "User"
    pub fn display_name(&self) -> String {
        if let Some(name) = self
            .user
            .get("username")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            return name.to_string();
        }
        match self.email() {
            Some(email) => email.split('@').next().unwrap_or(email).to_string(),
            None => "User".to_string(),
        }
    }
}

/// Where the session lives between runs
pub trait SessionStore: Send + Sync {
    /// `Ok(None)` when any piece is missing; `MalformedStoredSession` when the
    /// stored user is not valid JSON.
    fn load(&self) -> ClientResult<Option<Session>>;

    fn save(&self, session: &Session) -> ClientResult<()>;

    /// Remove the session keys, leaving unrelated entries alone
    fn clear(&self) -> ClientResult<()>;

    /// Remove everything in the underlying store
    fn wipe(&self) -> ClientResult<()>;

    fn access_token(&self) -> ClientResult<Option<String>>;

    fn refresh_token(&self) -> ClientResult<Option<String>>;
}

/// [`SessionStore`] over any [`KeyValueStore`]
#[derive(Clone)]
pub struct LocalSessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl LocalSessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

impl SessionStore for LocalSessionStore {
    fn load(&self) -> ClientResult<Option<Session>> {
        let (Some(access), Some(user)) = (self.store.get(ACCESS_KEY)?, self.store.get(USER_KEY)?)
        else {
            return Ok(None);
        };

        let user: Value = serde_json::from_str(&user)
            .map_err(|e| ClientError::MalformedStoredSession(e.to_string()))?;
        // `null`, strings and arrays parse as JSON but carry no profile
        if !user.is_object() {
            return Err(ClientError::MalformedStoredSession(format!(
                "stored user is not an object: {}",
                user
            )));
        }

        Ok(Some(Session {
            access_token: access,
            refresh_token: self.store.get(REFRESH_KEY)?,
            user,
        }))
    }

    fn save(&self, session: &Session) -> ClientResult<()> {
        self.store.set(ACCESS_KEY, &session.access_token)?;
        match &session.refresh_token {
            Some(refresh) => self.store.set(REFRESH_KEY, refresh)?,
            None => self.store.remove(REFRESH_KEY)?,
        }
        let user = serde_json::to_string(&session.user)
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        self.store.set(USER_KEY, &user)
    }

    fn clear(&self) -> ClientResult<()> {
        for key in [ACCESS_KEY, REFRESH_KEY, USER_KEY] {
            self.store.remove(key)?;
        }
        Ok(())
    }

    fn wipe(&self) -> ClientResult<()> {
        self.store.clear()
    }

    fn access_token(&self) -> ClientResult<Option<String>> {
        self.store.get(ACCESS_KEY)
    }

    fn refresh_token(&self) -> ClientResult<Option<String>> {
        self.store.get(REFRESH_KEY)
    }
}
