//! Login / register / preferences panel
//!
//! The modal itself is injected through [`ModalController`]; everything else
//! (which form is showing, the last alert, whether someone is logged in) is
//! plain state on [`AuthPanel`] so the flow can be driven without a UI.

use std::sync::{Arc, Mutex};

use crate::api::{AuthReply, Backend, Preferences, PreferencesReply};
use crate::error::{ClientError, ClientResult};
use crate::session::{RecentEmails, Session, SessionStore};
use crate::util::lock;

pub const MIN_PASSWORD_LEN: usize = 6;

const MSG_LOGIN_FIELDS: &str = "Please enter both email and password";
const MSG_LOGIN_OK: &str = "Logged in successfully!";
const MSG_LOGIN_REJECTED: &str = "Incorrect email or password";
const MSG_REGISTER_FIELDS: &str = "Please fill in every field";
const MSG_PASSWORD_MISMATCH: &str = "Passwords do not match";
const MSG_PASSWORD_SHORT: &str = "Password must be at least 6 characters";
const MSG_REGISTER_OK: &str = "Account created! Please choose your preferences";
const MSG_REGISTER_REJECTED: &str = "Registration failed";
const MSG_PREFERENCES_EMPTY: &str = "Please choose at least one travel type and one location";
const MSG_LOGIN_AGAIN: &str = "Please log in again";
const MSG_SESSION_EXPIRED: &str = "Your session has expired, please log in again";
const MSG_PREFERENCES_OK: &str = "Preferences saved!";
const MSG_PREFERENCES_FAILED: &str = "Could not save preferences";
const MSG_UNREACHABLE: &str = "Cannot reach the server";

/// Show/hide capability of whatever hosts the auth forms
pub trait ModalController: Send + Sync {
    fn show(&self);
    fn hide(&self);
}

/// Modal that does nothing, for hosts without one (the CLI)
pub struct NoModal;

impl ModalController for NoModal {
    fn show(&self) {}
    fn hide(&self) {}
}

/// Which form the panel is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthView {
    Login,
    Register,
    Preferences,
}

impl AuthView {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Login => "Log in",
            Self::Register => "Create an account",
            Self::Preferences => "Choose your preferences",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Danger,
    Success,
}

/// Inline message under the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn danger(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Danger,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: AlertKind::Success,
            message: message.into(),
        }
    }
}

/// Header area: auth buttons or the logged-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    LoggedIn {
        display_name: String,
        email: String,
    },
    LoggedOut,
}

/// Result of a login or register attempt that reached the backend
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    Accepted(Session),
    Rejected(String),
}

struct PanelState {
    view: AuthView,
    alert: Option<Alert>,
    status: AuthStatus,
}

pub struct AuthPanel {
    backend: Arc<dyn Backend>,
    sessions: Arc<dyn SessionStore>,
    emails: RecentEmails,
    modal: Arc<dyn ModalController>,
    state: Mutex<PanelState>,
}

impl AuthPanel {
    pub fn new(
        backend: Arc<dyn Backend>,
        sessions: Arc<dyn SessionStore>,
        emails: RecentEmails,
        modal: Arc<dyn ModalController>,
    ) -> Self {
        Self {
            backend,
            sessions,
            emails,
            modal,
            state: Mutex::new(PanelState {
                view: AuthView::Login,
                alert: None,
                status: AuthStatus::LoggedOut,
            }),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Views
    // ─────────────────────────────────────────────────────────────────────────

    pub fn open_login(&self) {
        self.show_login_form();
        self.modal.show();
    }

    pub fn open_register(&self) {
        self.show_register_form();
        self.modal.show();
    }

    pub fn show_login_form(&self) {
        lock(&self.state).view = AuthView::Login;
    }

    pub fn show_register_form(&self) {
        lock(&self.state).view = AuthView::Register;
    }

    pub fn view(&self) -> AuthView {
        lock(&self.state).view
    }

    pub fn title(&self) -> &'static str {
        self.view().title()
    }

    pub fn alert(&self) -> Option<Alert> {
        lock(&self.state).alert.clone()
    }

    pub fn status(&self) -> AuthStatus {
        lock(&self.state).status.clone()
    }

    fn set_alert(&self, alert: Alert) {
        match alert.kind {
            AlertKind::Success => tracing::info!("{}", alert.message),
            AlertKind::Danger => tracing::warn!("{}", alert.message),
        }
        lock(&self.state).alert = Some(alert);
    }

    /// Alert the message and fail with `Validation`
    fn reject<T>(&self, message: &str) -> ClientResult<T> {
        self.set_alert(Alert::danger(message));
        Err(ClientError::Validation(message.to_string()))
    }

    fn unreachable<T>(&self, err: ClientError) -> ClientResult<T> {
        tracing::error!("Auth request failed: {}", err);
        self.set_alert(Alert::danger(MSG_UNREACHABLE));
        Err(err)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Actions
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<AuthOutcome> {
        if email.is_empty() || password.is_empty() {
            return self.reject(MSG_LOGIN_FIELDS);
        }

        let reply = match self.backend.login(email, password).await {
            Ok(reply) => reply,
            Err(e) => return self.unreachable(e),
        };

        match reply {
            AuthReply::Accepted(success) => {
                let session = self.start_session(Session::from_auth(success), email)?;
                self.set_alert(Alert::success(MSG_LOGIN_OK));
                self.modal.hide();
                self.check_status();
                Ok(AuthOutcome::Accepted(session))
            }
            AuthReply::Rejected(rejection) => {
                let message = rejection
                    .detail
                    .clone()
                    .unwrap_or_else(|| MSG_LOGIN_REJECTED.to_string());
                self.set_alert(Alert::danger(&message));
                Ok(AuthOutcome::Rejected(message))
            }
        }
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> ClientResult<AuthOutcome> {
        if [username, email, password, confirm].iter().any(|f| f.is_empty()) {
            return self.reject(MSG_REGISTER_FIELDS);
        }
        if password != confirm {
            return self.reject(MSG_PASSWORD_MISMATCH);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return self.reject(MSG_PASSWORD_SHORT);
        }

        let reply = match self.backend.register(username, email, password).await {
            Ok(reply) => reply,
            Err(e) => return self.unreachable(e),
        };

        match reply {
            AuthReply::Accepted(success) => {
                let session = self.start_session(Session::from_auth(success), email)?;
                self.set_alert(Alert::success(MSG_REGISTER_OK));
                lock(&self.state).view = AuthView::Preferences;
                Ok(AuthOutcome::Accepted(session))
            }
            AuthReply::Rejected(rejection) => {
                let message = rejection
                    .message()
                    .unwrap_or(MSG_REGISTER_REJECTED)
                    .to_string();
                self.set_alert(Alert::danger(&message));
                Ok(AuthOutcome::Rejected(message))
            }
        }
    }

    fn start_session(&self, session: Session, email: &str) -> ClientResult<Session> {
        self.sessions.save(&session)?;
        if let Err(e) = self.emails.remember(email) {
            tracing::warn!("Could not remember email: {}", e);
        }
        Ok(session)
    }

    pub async fn save_preferences(
        &self,
        travel_types: Vec<String>,
        locations: Vec<String>,
    ) -> ClientResult<()> {
        if travel_types.is_empty() || locations.is_empty() {
            return self.reject(MSG_PREFERENCES_EMPTY);
        }

        let Some(token) = self.sessions.access_token()? else {
            return self.reject(MSG_LOGIN_AGAIN);
        };

        let preferences = Preferences {
            travel_types,
            locations,
        };
        let reply = match self.backend.save_preferences(&token, &preferences).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Error saving preferences: {}", e);
                return Err(e);
            }
        };

        match reply {
            PreferencesReply::Saved => {
                self.set_alert(Alert::success(MSG_PREFERENCES_OK));
                self.modal.hide();
                self.check_status();
                Ok(())
            }
            PreferencesReply::Unauthorized => {
                self.set_alert(Alert::danger(MSG_SESSION_EXPIRED));
                self.logout().await?;
                Err(ClientError::AuthExpired)
            }
            PreferencesReply::Failed(status) => {
                self.set_alert(Alert::danger(MSG_PREFERENCES_FAILED));
                Err(ClientError::Network(format!(
                    "preferences rejected with status {}",
                    status
                )))
            }
        }
    }

    /// Revoke the refresh token (best effort) and forget the session
    pub async fn logout(&self) -> ClientResult<()> {
        if let Some(refresh) = self.sessions.refresh_token()? {
            if let Err(e) = self.backend.logout(&refresh).await {
                tracing::warn!("Logout request failed: {}", e);
            }
        }
        self.sessions.clear()?;
        lock(&self.state).status = AuthStatus::LoggedOut;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Re-read the stored session and update the header status
    pub fn check_status(&self) -> AuthStatus {
        let status = match self.sessions.load() {
            Ok(Some(session)) => AuthStatus::LoggedIn {
                display_name: session.display_name(),
                email: session.email().unwrap_or_default().to_string(),
            },
            Ok(None) => {
                if let Err(e) = self.sessions.clear() {
                    tracing::warn!("Could not clear partial session: {}", e);
                }
                AuthStatus::LoggedOut
            }
            Err(ClientError::MalformedStoredSession(reason)) => {
                tracing::error!("Invalid user data: {}", reason);
                if let Err(e) = self.sessions.wipe() {
                    tracing::warn!("Could not wipe storage: {}", e);
                }
                AuthStatus::LoggedOut
            }
            Err(e) => {
                tracing::warn!("Could not read session: {}", e);
                AuthStatus::LoggedOut
            }
        };
        lock(&self.state).status = status.clone();
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeBackend;
    use crate::api::AuthRejection;
    use crate::session::{
        KeyValueStore, LocalSessionStore, MemoryStorage, ACCESS_KEY, RECENT_EMAILS_KEY,
        REFRESH_KEY, USER_KEY,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingModal {
        shown: AtomicUsize,
        hidden: AtomicUsize,
    }

    impl ModalController for CountingModal {
        fn show(&self) {
            self.shown.fetch_add(1, Ordering::SeqCst);
        }
        fn hide(&self) {
            self.hidden.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Harness {
        backend: Arc<FakeBackend>,
        memory: Arc<MemoryStorage>,
        modal: Arc<CountingModal>,
        panel: AuthPanel,
    }

    fn harness(backend: FakeBackend) -> Harness {
        let backend = Arc::new(backend);
        let memory = Arc::new(MemoryStorage::new());
        let modal = Arc::new(CountingModal::default());
        let panel = AuthPanel::new(
            backend.clone(),
            Arc::new(LocalSessionStore::new(memory.clone())),
            RecentEmails::new(memory.clone()),
            modal.clone(),
        );
        Harness {
            backend,
            memory,
            modal,
            panel,
        }
    }

    fn rejected(rejection: AuthRejection) -> AuthReply {
        AuthReply::Rejected(rejection)
    }

    #[test]
    fn test_open_switches_view_and_shows_modal() {
        let h = harness(FakeBackend::new());
        h.panel.open_register();
        assert_eq!(h.panel.view(), AuthView::Register);
        assert_eq!(h.panel.title(), "Create an account");

        h.panel.show_login_form();
        assert_eq!(h.panel.view(), AuthView::Login);
        assert_eq!(h.modal.shown.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_login_with_empty_field_makes_no_request() {
        let h = harness(FakeBackend::new());
        let err = h.panel.login("lan@example.vn", "").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(h.backend.calls().is_empty());
        assert_eq!(h.panel.alert(), Some(Alert::danger(MSG_LOGIN_FIELDS)));
    }

    #[tokio::test]
    async fn test_login_stores_session_and_remembers_email() {
        let h = harness(FakeBackend::new());
        let outcome = h.panel.login("lan@example.vn", "secret1").await.unwrap();
        assert!(matches!(outcome, AuthOutcome::Accepted(_)));

        assert_eq!(
            h.memory.get(ACCESS_KEY).unwrap().as_deref(),
            Some("access-token")
        );
        assert_eq!(
            h.memory.get(REFRESH_KEY).unwrap().as_deref(),
            Some("refresh-token")
        );
        assert!(h.memory.get(USER_KEY).unwrap().is_some());
        assert_eq!(
            h.memory.get(RECENT_EMAILS_KEY).unwrap().as_deref(),
            Some(r#"["lan@example.vn"]"#)
        );

        assert_eq!(h.modal.hidden.load(Ordering::SeqCst), 1);
        assert_eq!(
            h.panel.status(),
            AuthStatus::LoggedIn {
                display_name: "traveler".to_string(),
                email: "lan@example.vn".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_login_rejection_uses_detail_or_default() {
        let h = harness(FakeBackend::new().with_auth(rejected(AuthRejection {
            detail: Some("Account locked".to_string()),
            ..Default::default()
        })));
        let outcome = h.panel.login("a@b.vn", "x").await.unwrap();
        assert_eq!(outcome, AuthOutcome::Rejected("Account locked".to_string()));

        let h = harness(FakeBackend::new().with_auth(rejected(AuthRejection::default())));
        let outcome = h.panel.login("a@b.vn", "x").await.unwrap();
        assert_eq!(outcome, AuthOutcome::Rejected(MSG_LOGIN_REJECTED.to_string()));
        assert!(h.memory.is_empty());
    }

    #[tokio::test]
    async fn test_login_transport_failure_alerts() {
        let h = harness(FakeBackend::new());
        h.backend.set_failing(true);
        let err = h.panel.login("a@b.vn", "x").await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
        assert_eq!(h.panel.alert(), Some(Alert::danger(MSG_UNREACHABLE)));
    }

    #[tokio::test]
    async fn test_register_validation_order() {
        let h = harness(FakeBackend::new());
        let cases = [
            (("", "a@b.vn", "secret1", "secret1"), MSG_REGISTER_FIELDS),
            (("lan", "a@b.vn", "secret1", "secret2"), MSG_PASSWORD_MISMATCH),
            (("lan", "a@b.vn", "abc", "abc"), MSG_PASSWORD_SHORT),
        ];
        for ((user, email, pass, confirm), expected) in cases {
            let err = h
                .panel
                .register(user, email, pass, confirm)
                .await
                .unwrap_err();
            assert_eq!(err, ClientError::Validation(expected.to_string()));
        }
        assert!(h.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_register_success_moves_to_preferences() {
        let h = harness(FakeBackend::new());
        h.panel.open_register();
        h.panel
            .register("lan", "lan@example.vn", "secret1", "secret1")
            .await
            .unwrap();

        assert_eq!(h.panel.view(), AuthView::Preferences);
        assert_eq!(h.panel.title(), "Choose your preferences");
        assert_eq!(h.modal.hidden.load(Ordering::SeqCst), 0);
        assert_eq!(
            h.backend.calls(),
            vec!["register:lan:lan@example.vn".to_string()]
        );
    }

    #[tokio::test]
    async fn test_register_rejection_prefers_field_errors_in_order() {
        let h = harness(FakeBackend::new().with_auth(rejected(AuthRejection {
            detail: None,
            email: vec!["Email already registered".to_string()],
            username: vec!["Username taken".to_string()],
        })));
        let outcome = h
            .panel
            .register("lan", "lan@example.vn", "secret1", "secret1")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            AuthOutcome::Rejected("Email already registered".to_string())
        );
        assert_eq!(h.panel.view(), AuthView::Login);
    }

    #[tokio::test]
    async fn test_preferences_require_selection_and_token() {
        let h = harness(FakeBackend::new());
        let err = h
            .panel
            .save_preferences(vec!["beach".to_string()], vec![])
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::Validation(MSG_PREFERENCES_EMPTY.to_string()));

        let err = h
            .panel
            .save_preferences(vec!["beach".to_string()], vec!["Huế".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::Validation(MSG_LOGIN_AGAIN.to_string()));
        assert!(h.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_preferences_401_forces_logout() {
        let h = harness(FakeBackend::new().with_preferences(PreferencesReply::Unauthorized));
        h.panel.login("lan@example.vn", "secret1").await.unwrap();

        let err = h
            .panel
            .save_preferences(vec!["beach".to_string()], vec!["Huế".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err, ClientError::AuthExpired);
        assert_eq!(h.panel.alert(), Some(Alert::danger(MSG_SESSION_EXPIRED)));
        assert_eq!(h.panel.status(), AuthStatus::LoggedOut);
        assert_eq!(h.memory.get(ACCESS_KEY).unwrap(), None);
        assert_eq!(h.backend.call_count("logout:refresh-token"), 1);
        // Recent emails survive a logout
        assert!(h.memory.get(RECENT_EMAILS_KEY).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_preferences_saved_hides_modal() {
        let h = harness(FakeBackend::new());
        h.panel
            .register("lan", "lan@example.vn", "secret1", "secret1")
            .await
            .unwrap();
        h.panel
            .save_preferences(vec!["beach".to_string()], vec!["Huế".to_string()])
            .await
            .unwrap();
        assert_eq!(h.panel.alert(), Some(Alert::success(MSG_PREFERENCES_OK)));
        assert_eq!(h.modal.hidden.load(Ordering::SeqCst), 1);
        assert_eq!(h.backend.call_count("preferences:access-token"), 1);
    }

    #[tokio::test]
    async fn test_logout_without_refresh_token_skips_request() {
        let h = harness(FakeBackend::new());
        h.memory.set(ACCESS_KEY, "a").unwrap();
        h.panel.logout().await.unwrap();
        assert!(h.backend.calls().is_empty());
        assert!(h.memory.is_empty());
    }

    #[tokio::test]
    async fn test_logout_request_failure_still_clears_session() {
        let h = harness(FakeBackend::new());
        h.panel.login("lan@example.vn", "secret1").await.unwrap();
        h.backend.set_failing(true);
        h.panel.logout().await.unwrap();
        assert_eq!(h.memory.get(USER_KEY).unwrap(), None);
    }

    #[test]
    fn test_malformed_user_wipes_everything() {
        let h = harness(FakeBackend::new());
        h.memory.set(ACCESS_KEY, "a").unwrap();
        h.memory.set(USER_KEY, "{broken").unwrap();
        h.memory.set(RECENT_EMAILS_KEY, r#"["a@b.vn"]"#).unwrap();

        assert_eq!(h.panel.check_status(), AuthStatus::LoggedOut);
        assert!(h.memory.is_empty());
    }

    #[test]
    fn test_null_user_wipes_everything() {
        let h = harness(FakeBackend::new());
        h.memory.set(ACCESS_KEY, "a").unwrap();
        h.memory.set(USER_KEY, "null").unwrap();
        h.memory.set(RECENT_EMAILS_KEY, r#"["a@b.vn"]"#).unwrap();

        assert_eq!(h.panel.check_status(), AuthStatus::LoggedOut);
        assert!(h.memory.is_empty());
    }

    #[test]
    fn test_partial_session_clears_session_keys_only() {
        let h = harness(FakeBackend::new());
        h.memory.set(REFRESH_KEY, "r").unwrap();
        h.memory.set(RECENT_EMAILS_KEY, r#"["a@b.vn"]"#).unwrap();

        assert_eq!(h.panel.check_status(), AuthStatus::LoggedOut);
        assert_eq!(h.memory.len(), 1);
    }
}
