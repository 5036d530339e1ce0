//! Province lookup for the origin and destination inputs
//!
//! Same debounce → fetch → render cycle as quick search, without the submit
//! cache or highlighting. Picking a row copies the province name into the
//! input and closes the panel.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::Backend;
use crate::debounce::Debouncer;
use crate::util::{lock, log_query};

use super::controller::ControllerState;
use super::panel::{Binding, Dismissable, Panel, PanelItem};
use super::render::{Selection, Suggestion};
use super::sequence::RequestSequence;

/// Quiet period before a province request is issued
pub const PROVINCE_DELAY: Duration = Duration::from_millis(200);

struct Inner {
    state: ControllerState,
    input: String,
    panel: Panel<PanelItem>,
    sequence: RequestSequence,
}

/// Province autocomplete bound to one input. Clones share state.
#[derive(Clone)]
pub struct ProvinceLookup {
    binding: Binding,
    backend: Arc<dyn Backend>,
    debouncer: Debouncer<Binding>,
    delay: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl ProvinceLookup {
    /// Lookup for the "from" input
    pub fn origin(backend: Arc<dyn Backend>) -> Self {
        Self::new(Binding::FromLocation, backend, PROVINCE_DELAY)
    }

    /// Lookup for the "to" input
    pub fn destination(backend: Arc<dyn Backend>) -> Self {
        Self::new(Binding::ToLocation, backend, PROVINCE_DELAY)
    }

    pub fn new(binding: Binding, backend: Arc<dyn Backend>, delay: Duration) -> Self {
        Self {
            binding,
            backend,
            debouncer: Debouncer::new(),
            delay,
            inner: Arc::new(Mutex::new(Inner {
                state: ControllerState::Idle,
                input: String::new(),
                panel: Panel::default(),
                sequence: RequestSequence::default(),
            })),
        }
    }

    /// Schedule on a shared, page-wide debouncer instead of a private one
    pub fn with_debouncer(mut self, debouncer: Debouncer<Binding>) -> Self {
        self.debouncer = debouncer;
        self
    }

    pub fn on_input(&self, text: &str) {
        let query = text.trim().to_string();
        let mut inner = lock(&self.inner);
        inner.input = text.to_string();

        if query.is_empty() {
            self.debouncer.cancel(&self.binding);
            inner.sequence.invalidate();
            inner.panel.hide();
            inner.state = ControllerState::Idle;
            return;
        }

        inner.state = ControllerState::Pending;
        let mark = inner.sequence.mark();
        let this = self.clone();
        self.debouncer.schedule(self.binding, self.delay, async move {
            this.run_query(query, mark).await;
        });
    }

    async fn run_query(&self, query: String, mark: u64) {
        let ticket = {
            let mut inner = lock(&self.inner);
            let Some(ticket) = inner.sequence.issue_since(mark) else {
                tracing::debug!("Dropping superseded {} lookup", self.binding.as_str());
                return;
            };
            inner.state = ControllerState::Waiting;
            ticket
        };

        let result = self.backend.provinces(&query).await;

        let mut inner = lock(&self.inner);
        if !inner.sequence.is_current(ticket) {
            tracing::debug!(
                "Discarding stale {} response #{}",
                self.binding.as_str(),
                ticket
            );
            return;
        }

        let settled = match result {
            Ok(provinces) if !provinces.is_empty() => {
                let items = provinces
                    .into_iter()
                    .map(|p| PanelItem::new(Suggestion::Province(p), &query))
                    .collect();
                inner.panel.show(items);
                ControllerState::Displaying
            }
            Ok(_) => {
                inner.panel.hide();
                ControllerState::Idle
            }
            Err(e) => {
                tracing::warn!(
                    "Province lookup ({}) failed for {:?}: {}",
                    self.binding.as_str(),
                    log_query(&query),
                    e
                );
                inner.panel.hide();
                ControllerState::Idle
            }
        };

        inner.state = if self.debouncer.is_pending(&self.binding) {
            ControllerState::Pending
        } else {
            settled
        };
    }

    /// Click on row `index`: fill the input with the literal province name
    pub fn select(&self, index: usize) -> Option<String> {
        let mut inner = lock(&self.inner);
        let selection = inner.panel.get(index)?.suggestion.select();

        let Selection::Fill(province) = selection else {
            return None;
        };

        self.debouncer.cancel(&self.binding);
        inner.sequence.invalidate();
        inner.input = province.clone();
        inner.panel.hide();
        inner.state = ControllerState::Idle;
        Some(province)
    }

    pub fn state(&self) -> ControllerState {
        lock(&self.inner).state
    }

    pub fn input(&self) -> String {
        lock(&self.inner).input.clone()
    }

    pub fn is_open(&self) -> bool {
        lock(&self.inner).panel.is_open()
    }

    /// Province names currently in the panel
    pub fn options(&self) -> Vec<String> {
        lock(&self.inner)
            .panel
            .items()
            .iter()
            .map(|item| item.suggestion.name().to_string())
            .collect()
    }
}

impl Dismissable for ProvinceLookup {
    fn binding(&self) -> Binding {
        self.binding
    }

    fn close_panel(&self) -> bool {
        let mut inner = lock(&self.inner);
        if inner.state == ControllerState::Displaying {
            inner.state = ControllerState::Idle;
        }
        inner.panel.hide()
    }
}
