//! Quick-search autocomplete controller
//!
//! State machine per bound input:
//!
//! ```text
//! Idle --input--> Pending --timer--> Waiting --ok--> Displaying
//!                   ^                   |  empty/error -> Idle
//!                   +------ input ------+
//! any --submit/select--> Navigating (terminal)
//! any --cleared--> Idle
//! ```
//!
//! Only the latest issued request may touch the cache or the panel. An empty
//! answer hides the panel but leaves the cache alone, so a later submit can
//! still land on destinations from an earlier, non-empty query.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::{Backend, SearchResponse};
use crate::debounce::Debouncer;
use crate::nav::Navigation;
use crate::util::{lock, log_query};

use super::cache::{CacheEntry, SuggestionCache};
use super::panel::{Binding, Dismissable, Panel, PanelItem};
use super::render::{Selection, Suggestion};
use super::sequence::RequestSequence;

/// Quiet period before a quick-search request is issued
pub const QUICK_SEARCH_DELAY: Duration = Duration::from_millis(300);

const BINDING: Binding = Binding::QuickSearch;

/// Where the controller is in its input → fetch → display cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// No text, nothing scheduled
    Idle,
    /// Debounce timer running
    Pending,
    /// Request in flight
    Waiting,
    /// Results rendered in the panel
    Displaying,
    /// A selection or submit decided where to go
    Navigating,
}

struct Inner {
    state: ControllerState,
    /// Raw value of the bound input
    input: String,
    cache: SuggestionCache,
    panel: Panel<PanelItem>,
    sequence: RequestSequence,
}

/// Autocomplete for the quick-search box. Clones share state.
#[derive(Clone)]
pub struct AutocompleteController {
    backend: Arc<dyn Backend>,
    debouncer: Debouncer<Binding>,
    delay: Duration,
    inner: Arc<Mutex<Inner>>,
}

impl AutocompleteController {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self::with_delay(backend, QUICK_SEARCH_DELAY)
    }

    pub fn with_delay(backend: Arc<dyn Backend>, delay: Duration) -> Self {
        Self {
            backend,
            debouncer: Debouncer::new(),
            delay,
            inner: Arc::new(Mutex::new(Inner {
                state: ControllerState::Idle,
                input: String::new(),
                cache: SuggestionCache::new(),
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

    /// The bound input's value changed
    pub fn on_input(&self, text: &str) {
        let query = text.trim().to_string();
        let mut inner = lock(&self.inner);

        if inner.state == ControllerState::Navigating {
            tracing::debug!("Ignoring input after navigation");
            return;
        }
        inner.input = text.to_string();

        if query.is_empty() {
            self.debouncer.cancel(&BINDING);
            inner.sequence.invalidate();
            inner.cache.clear();
            inner.panel.hide();
            inner.state = ControllerState::Idle;
            return;
        }

        inner.state = ControllerState::Pending;
        let mark = inner.sequence.mark();
        let this = self.clone();
        self.debouncer.schedule(BINDING, self.delay, async move {
            this.run_query(query, mark).await;
        });
    }

    /// Debounce fired: fetch and, if still current, render
    async fn run_query(&self, query: String, mark: u64) {
        let ticket = {
            let mut inner = lock(&self.inner);
            if inner.state == ControllerState::Navigating {
                return;
            }
            // Cleared, submitted or selected after the timer fired
            let Some(ticket) = inner.sequence.issue_since(mark) else {
                tracing::debug!("Dropping superseded quick search {:?}", log_query(&query));
                return;
            };
            inner.state = ControllerState::Waiting;
            ticket
        };

        tracing::debug!("Quick search #{} q={:?}", ticket, log_query(&query));
        let result = self.backend.search(&query).await;

        let mut inner = lock(&self.inner);
        if !inner.sequence.is_current(ticket) {
            tracing::debug!("Discarding stale quick-search response #{}", ticket);
            return;
        }

        let settled = match result {
            Ok(response) if response.is_empty() => {
                inner.panel.hide();
                ControllerState::Idle
            }
            Ok(response) => {
                let items = panel_items(&response, &query);
                inner.cache.update(CacheEntry::from(response));
                inner.panel.show(items);
                ControllerState::Displaying
            }
            Err(e) => {
                tracing::warn!("Quick search failed for {:?}: {}", log_query(&query), e);
                inner.panel.hide();
                ControllerState::Idle
            }
        };

        // Newer input already re-armed the timer
        inner.state = if self.debouncer.is_pending(&BINDING) {
            ControllerState::Pending
        } else {
            settled
        };
    }

    /// Enter key or search button.
    ///
    /// A cached destination wins without a round trip; otherwise one fetch
    /// decides between the first destination and the generic results page.
    pub async fn submit(&self) -> Navigation {
        let (query, cached) = {
            let mut inner = lock(&self.inner);
            self.debouncer.cancel(&BINDING);
            inner.sequence.invalidate();
            inner.panel.hide();
            inner.state = ControllerState::Navigating;
            (
                inner.input.trim().to_string(),
                inner.cache.first_destination().map(|d| d.id),
            )
        };

        if let Some(id) = cached {
            tracing::debug!("Submit resolved from cache: destination {}", id);
            return Navigation::Destination { id };
        }

        if query.is_empty() {
            return Navigation::search(query);
        }

        match self.backend.search(&query).await {
            Ok(response) => match response.results.first() {
                Some(destination) => Navigation::Destination { id: destination.id },
                None => Navigation::search(query),
            },
            Err(e) => {
                tracing::warn!("Submit lookup failed for {:?}: {}", log_query(&query), e);
                Navigation::search(query)
            }
        }
    }

    /// Click on row `index` of the open panel
    pub fn select(&self, index: usize) -> Option<Navigation> {
        let mut inner = lock(&self.inner);
        let suggestion = inner.panel.get(index)?.suggestion.clone();

        inner.input = suggestion.name().to_string();
        inner.panel.hide();
        self.debouncer.cancel(&BINDING);
        inner.sequence.invalidate();

        match suggestion.select() {
            Selection::Navigate(navigation) => {
                inner.state = ControllerState::Navigating;
                Some(navigation)
            }
            Selection::Fill(_) => {
                inner.state = ControllerState::Idle;
                None
            }
        }
    }

    pub fn state(&self) -> ControllerState {
        lock(&self.inner).state
    }

    pub fn input(&self) -> String {
        lock(&self.inner).input.clone()
    }

    pub fn cache(&self) -> CacheEntry {
        lock(&self.inner).cache.peek()
    }

    pub fn is_open(&self) -> bool {
        lock(&self.inner).panel.is_open()
    }

    pub fn items(&self) -> Vec<PanelItem> {
        lock(&self.inner).panel.items().to_vec()
    }
}

impl Dismissable for AutocompleteController {
    fn binding(&self) -> Binding {
        BINDING
    }

    fn close_panel(&self) -> bool {
        let mut inner = lock(&self.inner);
        if inner.state == ControllerState::Displaying {
            inner.state = ControllerState::Idle;
        }
        inner.panel.hide()
    }
}

/// Destinations first, then tours
fn panel_items(response: &SearchResponse, query: &str) -> Vec<PanelItem> {
    let destinations = response
        .results
        .iter()
        .cloned()
        .map(Suggestion::Destination);
    let tours = response.tours.iter().cloned().map(Suggestion::Tour);

    destinations
        .chain(tours)
        .map(|suggestion| PanelItem::new(suggestion, query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{destination, tour, FakeBackend};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn results(destinations: Vec<crate::api::Destination>) -> SearchResponse {
        SearchResponse {
            results: destinations,
            tours: vec![],
        }
    }

    fn controller(backend: &Arc<FakeBackend>) -> AutocompleteController {
        AutocompleteController::new(backend.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_request_after_last_keystroke() {
        let backend = Arc::new(
            FakeBackend::new().with_search("Huế", results(vec![destination(3, "Huế")])),
        );
        let ac = controller(&backend);

        ac.on_input("H");
        tokio::time::sleep(ms(100)).await;
        ac.on_input("Hu");
        tokio::time::sleep(ms(100)).await;
        ac.on_input("Huế");

        tokio::time::sleep(ms(299)).await;
        assert!(backend.calls().is_empty());
        assert_eq!(ac.state(), ControllerState::Pending);

        tokio::time::sleep(ms(10)).await;
        assert_eq!(backend.calls(), vec!["search:Huế".to_string()]);
        assert_eq!(ac.state(), ControllerState::Displaying);
        assert!(ac.is_open());
        assert_eq!(ac.cache().destinations.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_input_is_trimmed_before_query() {
        let backend = Arc::new(FakeBackend::new());
        let ac = controller(&backend);

        ac.on_input("  Sapa  ");
        tokio::time::sleep(ms(350)).await;
        assert_eq!(backend.calls(), vec!["search:Sapa".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_hides_panel_and_clears_cache() {
        let backend = Arc::new(
            FakeBackend::new().with_search("Huế", results(vec![destination(3, "Huế")])),
        );
        let ac = controller(&backend);

        ac.on_input("Huế");
        tokio::time::sleep(ms(350)).await;
        assert!(ac.is_open());

        ac.on_input("   ");
        assert_eq!(ac.state(), ControllerState::Idle);
        assert!(!ac.is_open());
        assert!(ac.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_cancels_pending_request() {
        let backend = Arc::new(FakeBackend::new());
        let ac = controller(&backend);

        ac.on_input("Hội An");
        tokio::time::sleep(ms(200)).await;
        ac.on_input("");
        tokio::time::sleep(ms(500)).await;

        assert!(backend.calls().is_empty());
        assert_eq!(ac.state(), ControllerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let backend = Arc::new(
            FakeBackend::new()
                .with_search("Đà", results(vec![destination(1, "Đà Nẵng")]))
                .with_delay("Đà", ms(500))
                .with_search("Đà Lạt", results(vec![destination(2, "Đà Lạt")]))
                .with_delay("Đà Lạt", ms(10)),
        );
        let ac = controller(&backend);

        ac.on_input("Đà");
        // Fires at 300, answers at 800
        tokio::time::sleep(ms(350)).await;
        assert_eq!(ac.state(), ControllerState::Waiting);

        ac.on_input("Đà Lạt");
        // Fires at 650, answers at 660
        tokio::time::sleep(ms(350)).await;
        assert_eq!(ac.cache().destinations[0].id, 2);

        // The slow "Đà" answer lands now and must not win
        tokio::time::sleep(ms(200)).await;
        assert_eq!(backend.call_count("search:"), 2);
        assert_eq!(ac.cache().destinations[0].id, 2);
        assert_eq!(ac.items()[0].suggestion.name(), "Đà Lạt");
        assert_eq!(ac.state(), ControllerState::Displaying);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_after_clear_does_not_repaint() {
        let backend = Arc::new(
            FakeBackend::new()
                .with_search("Huế", results(vec![destination(3, "Huế")]))
                .with_delay("Huế", ms(400)),
        );
        let ac = controller(&backend);

        ac.on_input("Huế");
        tokio::time::sleep(ms(350)).await;
        ac.on_input("");
        tokio::time::sleep(ms(500)).await;

        assert!(!ac.is_open());
        assert!(ac.cache().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_fired_before_clear_but_run_after_is_dropped() {
        let backend = Arc::new(
            FakeBackend::new().with_search("Huế", results(vec![destination(3, "Huế")])),
        );
        let ac = controller(&backend);

        // The timer already fired and handed off its query task
        let mark = lock(&ac.inner).sequence.mark();
        ac.on_input("");
        ac.run_query("Huế".to_string(), mark).await;

        assert!(backend.calls().is_empty());
        assert!(!ac.is_open());
        assert!(ac.cache().is_empty());
        assert_eq!(ac.state(), ControllerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_fired_before_newer_query_still_runs() {
        let backend = Arc::new(
            FakeBackend::new().with_search("Huế", results(vec![destination(3, "Huế")])),
        );
        let ac = controller(&backend);

        let mark = lock(&ac.inner).sequence.mark();
        ac.run_query("Hu".to_string(), mark).await;
        ac.run_query("Huế".to_string(), mark).await;

        assert_eq!(backend.call_count("search:"), 2);
        assert!(ac.is_open());
        assert_eq!(ac.cache().destinations[0].id, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_with_cached_destination_skips_request() {
        let backend = Arc::new(FakeBackend::new().with_search(
            "Hạ Long",
            results(vec![destination(8, "Vịnh Hạ Long"), destination(9, "Hạ Long Park")]),
        ));
        let ac = controller(&backend);

        ac.on_input("Hạ Long");
        tokio::time::sleep(ms(350)).await;
        assert_eq!(backend.call_count("search:"), 1);

        let nav = ac.submit().await;
        assert_eq!(nav, Navigation::Destination { id: 8 });
        assert_eq!(nav.to_url(), "/destination/8/");
        assert_eq!(backend.call_count("search:"), 1);
        assert_eq!(ac.state(), ControllerState::Navigating);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_with_empty_cache_falls_back_to_search_page() {
        let backend = Arc::new(FakeBackend::new());
        let ac = controller(&backend);

        ac.on_input("Đà Lạt");
        let nav = ac.submit().await;

        assert_eq!(nav.to_url(), "/search/?q=%C4%90%C3%A0%20L%E1%BA%A1t");
        assert_eq!(backend.calls(), vec!["search:Đà Lạt".to_string()]);

        // The pending debounce was cancelled by the submit
        tokio::time::sleep(ms(500)).await;
        assert_eq!(backend.call_count("search:"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_fetch_finds_destination() {
        let backend = Arc::new(
            FakeBackend::new().with_search("Phú Quốc", results(vec![destination(21, "Phú Quốc")])),
        );
        let ac = controller(&backend);

        ac.on_input("Phú Quốc");
        assert_eq!(ac.submit().await, Navigation::Destination { id: 21 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_fetch_error_falls_back_to_search_page() {
        let backend = Arc::new(FakeBackend::new());
        backend.set_failing(true);
        let ac = controller(&backend);

        ac.on_input("Mũi Né");
        assert_eq!(ac.submit().await, Navigation::search("Mũi Né"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tours_only_cache_still_fetches_on_submit() {
        let backend = Arc::new(FakeBackend::new().with_search(
            "Sapa",
            SearchResponse {
                results: vec![],
                tours: vec![tour("sapa-2n1d", "Sapa 2N1Đ")],
            },
        ));
        let ac = controller(&backend);

        ac.on_input("Sapa");
        tokio::time::sleep(ms(350)).await;
        assert!(ac.is_open());

        assert_eq!(ac.submit().await, Navigation::search("Sapa"));
        assert_eq!(backend.call_count("search:"), 2);
    }

    /// Known quirk: an empty answer hides the panel but keeps the previous
    /// results, so submit still lands on the earlier destination.
    #[tokio::test(start_paused = true)]
    async fn test_empty_response_keeps_previous_cache() {
        let backend = Arc::new(
            FakeBackend::new().with_search("Huế", results(vec![destination(3, "Huế")])),
        );
        let ac = controller(&backend);

        ac.on_input("Huế");
        tokio::time::sleep(ms(350)).await;
        ac.on_input("Huếzzz");
        tokio::time::sleep(ms(350)).await;

        assert!(!ac.is_open());
        assert_eq!(ac.state(), ControllerState::Idle);
        assert_eq!(ac.cache().destinations[0].id, 3);

        assert_eq!(ac.submit().await, Navigation::Destination { id: 3 });
        assert_eq!(backend.call_count("search:"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_hides_panel() {
        let backend = Arc::new(
            FakeBackend::new().with_search("Huế", results(vec![destination(3, "Huế")])),
        );
        let ac = controller(&backend);

        ac.on_input("Huế");
        tokio::time::sleep(ms(350)).await;
        assert!(ac.is_open());

        backend.set_failing(true);
        ac.on_input("Huế ");
        ac.on_input("Huế x");
        tokio::time::sleep(ms(350)).await;

        assert!(!ac.is_open());
        assert_eq!(ac.state(), ControllerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_navigates_and_is_terminal() {
        let backend = Arc::new(FakeBackend::new().with_search(
            "hội",
            SearchResponse {
                results: vec![destination(5, "Phố cổ Hội An")],
                tours: vec![tour("hoi-an-1n", "Hội An 1N")],
            },
        ));
        let ac = controller(&backend);

        ac.on_input("hội");
        tokio::time::sleep(ms(350)).await;
        assert_eq!(ac.items().len(), 2);
        assert_eq!(
            ac.items()[0].view.title,
            r#"Phố cổ <strong class="text-primary">Hội</strong> An"#
        );

        assert_eq!(ac.select(7), None);
        assert_eq!(
            ac.select(1),
            Some(Navigation::Tour {
                slug: "hoi-an-1n".into()
            })
        );
        assert_eq!(ac.input(), "Hội An 1N");
        assert_eq!(ac.state(), ControllerState::Navigating);

        ac.on_input("something else");
        tokio::time::sleep(ms(350)).await;
        assert_eq!(backend.call_count("search:"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_closes_displayed_panel() {
        let backend = Arc::new(
            FakeBackend::new().with_search("Huế", results(vec![destination(3, "Huế")])),
        );
        let ac = controller(&backend);

        ac.on_input("Huế");
        tokio::time::sleep(ms(350)).await;

        assert!(ac.close_panel());
        assert!(!ac.is_open());
        assert_eq!(ac.state(), ControllerState::Idle);
        // Cache survives a dismiss
        assert_eq!(ac.cache().destinations.len(), 1);
    }
}
