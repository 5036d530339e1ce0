//! Recently used login emails and their dropdown

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::debounce::Debouncer;
use crate::error::{ClientError, ClientResult};
use crate::suggest::Panel;
use crate::util::lock;

use super::storage::KeyValueStore;

pub const RECENT_EMAILS_KEY: &str = "recentEmails";

/// How many emails are remembered by default
pub const RECENT_EMAIL_CAP: usize = 5;

/// Grace period between the email input losing focus and its dropdown closing
pub const EMAIL_BLUR_DELAY: Duration = Duration::from_millis(200);

/// Most-recent-first, de-duplicated list of emails that logged in successfully
#[derive(Clone)]
pub struct RecentEmails {
    store: Arc<dyn KeyValueStore>,
    cap: usize,
}

impl RecentEmails {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_cap(store, RECENT_EMAIL_CAP)
    }

    pub fn with_cap(store: Arc<dyn KeyValueStore>, cap: usize) -> Self {
        Self { store, cap }
    }

    /// Stored list. Missing or unreadable data reads as empty.
    pub fn list(&self) -> Vec<String> {
        let raw = match self.store.get(RECENT_EMAILS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read recent emails: {}", e);
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed recent emails: {}", e);
            Vec::new()
        })
    }

    /// Move `email` to the front, dropping any older copy and anything past the cap
    pub fn remember(&self, email: &str) -> ClientResult<()> {
        let mut emails = self.list();
        emails.retain(|e| e != email);
        emails.insert(0, email.to_string());
        emails.truncate(self.cap);

        let json = serde_json::to_string(&emails)
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        self.store.set(RECENT_EMAILS_KEY, &json)
    }
}

struct DropdownState {
    input: String,
    panel: Panel<String>,
}

/// Dropdown under the login email input. Clones share state.
#[derive(Clone)]
pub struct EmailSuggestions {
    emails: RecentEmails,
    blur: Debouncer<()>,
    blur_delay: Duration,
    state: Arc<Mutex<DropdownState>>,
}

impl EmailSuggestions {
    pub fn new(emails: RecentEmails) -> Self {
        Self {
            emails,
            blur: Debouncer::new(),
            blur_delay: EMAIL_BLUR_DELAY,
            state: Arc::new(Mutex::new(DropdownState {
                input: String::new(),
                panel: Panel::default(),
            })),
        }
    }

    /// Open with the remembered emails, if there are any
    pub fn on_focus(&self) {
        self.blur.cancel(&());
        let emails = self.emails.list();
        lock(&self.state).panel.show(emails);
    }

    /// Typing closes the dropdown
    pub fn on_input(&self, text: &str) {
        let mut state = lock(&self.state);
        state.input = text.to_string();
        state.panel.hide();
    }

    /// Close after a short grace period so a click on a row still lands
    pub fn on_blur(&self) {
        let state = self.state.clone();
        self.blur.schedule((), self.blur_delay, async move {
            lock(&state).panel.hide();
        });
    }

    /// Fill the input with row `index` and close
    pub fn select(&self, index: usize) -> Option<String> {
        self.blur.cancel(&());
        let mut state = lock(&self.state);
        let email = state.panel.get(index)?.clone();
        state.input = email.clone();
        state.panel.hide();
        Some(email)
    }

    pub fn input(&self) -> String {
        lock(&self.state).input.clone()
    }

    pub fn is_open(&self) -> bool {
        lock(&self.state).panel.is_open()
    }

    pub fn options(&self) -> Vec<String> {
        lock(&self.state).panel.items().to_vec()
    }
}
