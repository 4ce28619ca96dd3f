//! services/portal/src/dashboard/debounce.rs
//!
//! The debounced subject search. Each keystroke restarts a timer; only a
//! query that stays unchanged for the whole quiet period is sent.

use super::fetch::FetchOutcome;
use super::Dashboard;
use study_portal_core::navigation::Overlay;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

impl Dashboard {
    /// Updates the search box.
    ///
    /// A non-empty query is sent once it has been quiet for the configured
    /// delay; when it fires, any open overlay and the current path give way to
    /// the search results. An empty query sends nothing; if results were
    /// showing it lands on the course list at once, otherwise the current
    /// path is kept.
    pub fn set_search_query(&mut self, query: &str) {
        self.cancel_pending_search();
        self.search_query = query.to_string();

        if query.trim().is_empty() {
            self.active_search = None;
            if matches!(self.nav.overlay(), Some(Overlay::SearchResults)) {
                self.nav.reset();
            }
            self.sync();
            return;
        }

        let generation = self.search_generation;
        let delay = self.settings.search_debounce;
        let token = CancellationToken::new();
        let cancelled = token.clone();
        self.pending_search = Some(token);
        self.spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => debug!("Search {} superseded", generation),
                _ = tokio::time::sleep(delay) => debug!("Search {} is due", generation),
            }
            FetchOutcome::SearchDue { generation }
        });
    }

    /// Stops the running timer. Its outcome still arrives, but with a stale
    /// generation.
    fn cancel_pending_search(&mut self) {
        if let Some(token) = self.pending_search.take() {
            token.cancel();
        }
        self.search_generation += 1;
    }

    /// Forgets the query and its results.
    pub(super) fn clear_search(&mut self) {
        self.cancel_pending_search();
        self.search_query.clear();
        self.active_search = None;
    }

    pub(super) fn fire_search(&mut self, generation: u64) {
        if generation != self.search_generation || self.pending_search.is_none() {
            return;
        }
        self.pending_search = None;

        let query = self.search_query.trim().to_string();
        info!("Searching subjects for '{}'", query);
        self.pending_delete = None;
        self.form_error.clear();
        if let Err(e) = self.nav.open(Overlay::SearchResults) {
            error!("Could not show search results: {}", e);
            return;
        }
        self.active_search = Some(query);
        self.sync();
    }
}
