//! Live, debounced search bound to one user session.

use std::sync::Arc;

use dsefs_storage::SharedStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::aggregator::{SearchAggregator, SearchConfig};
use crate::history::SearchHistory;
use crate::item::{results_path, SearchableItem};
use crate::Result;

/// Snapshot published to observers of a [`GlobalSearch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<SearchableItem>,
    pub is_loading: bool,
}

/// What the user picked from the search box.
#[derive(Debug, Clone)]
pub enum SearchTarget {
    Item(SearchableItem),
    Term(String),
}

impl SearchTarget {
    /// The term recorded in history and the path to navigate to.
    pub fn resolve(self) -> (String, String) {
        match self {
            SearchTarget::Item(item) => (item.title, item.path),
            SearchTarget::Term(term) => {
                let path = results_path(&term);
                (term, path)
            }
        }
    }
}

/// Owns the query, its pending scan and the search history.
///
/// Each query change cancels the pending scan and schedules a new one once the
/// configured quiet period has elapsed. Must be driven from a tokio runtime.
pub struct GlobalSearch {
    aggregator: Arc<SearchAggregator>,
    history: SearchHistory,
    state_tx: Arc<watch::Sender<SearchState>>,
    pending: Option<JoinHandle<()>>,
}

impl GlobalSearch {
    pub fn new(storage: SharedStore, config: SearchConfig) -> Self {
        let history = SearchHistory::load(Arc::clone(&storage), config.max_history_items);
        let aggregator = Arc::new(SearchAggregator::new(storage, config));
        Self::with_aggregator(aggregator, history)
    }

    pub fn with_aggregator(aggregator: Arc<SearchAggregator>, history: SearchHistory) -> Self {
        let (state_tx, _) = watch::channel(SearchState::default());
        Self {
            aggregator,
            history,
            state_tx: Arc::new(state_tx),
            pending: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state_tx.subscribe()
    }

    pub fn state(&self) -> SearchState {
        self.state_tx.borrow().clone()
    }

    pub fn query(&self) -> String {
        self.state_tx.borrow().query.clone()
    }

    pub fn history(&self) -> &SearchHistory {
        &self.history
    }

    pub fn suggestions(&self) -> Vec<SearchableItem> {
        self.history.suggestions()
    }

    /// Update the query and reschedule the scan.
    pub fn set_query(&mut self, query: impl Into<String>) {
        let query = query.into();
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }

        if query.trim().is_empty() {
            self.state_tx.send_replace(SearchState {
                query,
                results: Vec::new(),
                is_loading: false,
            });
            return;
        }

        self.state_tx.send_modify(|state| {
            state.query = query.clone();
            state.is_loading = true;
        });

        let aggregator = Arc::clone(&self.aggregator);
        let state_tx = Arc::clone(&self.state_tx);
        let delay = aggregator.config().debounce;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let results = aggregator.search(&query);
            state_tx.send_modify(|state| {
                if state.query == query {
                    state.results = results;
                    state.is_loading = false;
                } else {
                    debug!(stale = %query, current = %state.query, "dropping stale search results");
                }
            });
        }));
    }

    /// Select a result or submit a literal term: the term becomes the query
    /// and enters the history. Returns the path to navigate to.
    pub fn select(&mut self, target: SearchTarget) -> Result<String> {
        let (term, path) = target.resolve();

        self.set_query(term.clone());
        self.history.add(&term)?;
        Ok(path)
    }

    pub fn clear_history(&mut self) -> Result<()> {
        self.history.clear()
    }
}

impl Drop for GlobalSearch {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::REPORTS_KEY;
    use dsefs_storage::{KeyValueStore, MemoryStore};
    use std::time::Duration;

    fn seeded_store() -> MemoryStore {
        let storage = MemoryStore::new();
        storage
            .set(
                REPORTS_KEY,
                r#"[{"id":"r1","titre":"Rapport Annuel 2024","nature":"annuel","statut":"elaboration","datePrevue":"2024-12-31"},
                    {"id":"r2","titre":"Campagne de reboisement","nature":"autre","statut":"validation","datePrevue":"2025-03-01"}]"#,
            )
            .unwrap();
        storage
    }

    fn session(storage: &MemoryStore) -> GlobalSearch {
        GlobalSearch::new(Arc::new(storage.clone()), SearchConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn results_arrive_after_quiet_period() {
        let storage = seeded_store();
        let mut search = session(&storage);
        let mut updates = search.subscribe();

        search.set_query("reboisement");
        assert!(search.state().is_loading);
        assert!(search.state().results.is_empty());

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(search.state().is_loading);

        updates.borrow_and_update();
        updates.changed().await.unwrap();
        let state = search.state();
        assert!(!state.is_loading);
        assert_eq!(state.results[0].id, "rapport-r2");
    }

    #[tokio::test(start_paused = true)]
    async fn new_keystroke_restarts_timer() {
        let storage = seeded_store();
        let mut search = session(&storage);

        search.set_query("reb");
        tokio::time::sleep(Duration::from_millis(200)).await;
        search.set_query("annuel");
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(search.state().is_loading);

        tokio::time::sleep(Duration::from_millis(150)).await;
        let state = search.state();
        assert_eq!(state.query, "annuel");
        assert!(!state.is_loading);
        assert_eq!(state.results[0].id, "rapport-r1");
        assert!(state.results.iter().all(|item| item.id != "rapport-r2"));
    }

    #[tokio::test(start_paused = true)]
    async fn blank_query_clears_synchronously() {
        let storage = seeded_store();
        let mut search = session(&storage);

        search.set_query("annuel");
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!search.state().results.is_empty());

        search.set_query("   ");
        let state = search.state();
        assert!(state.results.is_empty());
        assert!(!state.is_loading);

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(search.state().results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_records_history_and_returns_path() {
        let storage = seeded_store();
        let mut search = session(&storage);

        let path = search
            .select(SearchTarget::Term("plan de travail".into()))
            .unwrap();
        assert_eq!(path, "/search/results?q=plan%20de%20travail");
        assert_eq!(search.query(), "plan de travail");

        search.set_query("annuel");
        tokio::time::sleep(Duration::from_millis(350)).await;
        let item = search.state().results[0].clone();
        let path = search.select(SearchTarget::Item(item)).unwrap();
        assert_eq!(path, "/rapports/preparation#item-r1");

        let terms: Vec<_> = search
            .history()
            .entries()
            .iter()
            .map(|e| e.term.clone())
            .collect();
        assert_eq!(terms, ["Rapport Annuel 2024", "plan de travail"]);
        assert!(search.suggestions().iter().all(|s| s.is_history == Some(true)));

        search.clear_history().unwrap();
        assert!(search.history().is_empty());
    }
}
