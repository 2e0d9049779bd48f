//! Bounded recent-search history.

use std::time::{SystemTime, UNIX_EPOCH};

use dsefs_storage::{load_json, save_json, SharedStore};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::item::{results_path, ItemIcon, SearchableItem, TYPE_HISTORY};
use crate::Result;

pub const SEARCH_HISTORY_KEY: &str = "global_search_history";

/// One past search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub term: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

impl HistoryEntry {
    pub fn new(term: &str, timestamp: i64) -> Self {
        Self {
            id: format!("hist-{timestamp}-{term}"),
            term: term.to_string(),
            timestamp,
        }
    }

    pub fn to_suggestion(&self) -> SearchableItem {
        SearchableItem {
            id: self.id.clone(),
            title: self.term.clone(),
            type_label: TYPE_HISTORY.to_string(),
            category: "Recherche Récente".to_string(),
            path: results_path(&self.term),
            description: None,
            icon: Some(ItemIcon::History),
            is_history: Some(true),
        }
    }
}

/// Most recent search terms, newest first, persisted after each change.
pub struct SearchHistory {
    storage: SharedStore,
    entries: Vec<HistoryEntry>,
    limit: usize,
}

impl SearchHistory {
    /// Load the stored history. A malformed document is discarded along with
    /// its storage key.
    pub fn load(storage: SharedStore, limit: usize) -> Self {
        let entries = match load_json::<Vec<HistoryEntry>>(storage.as_ref(), SEARCH_HISTORY_KEY) {
            Ok(Some(mut entries)) => {
                entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                entries
            }
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "discarding unreadable search history");
                if let Err(err) = storage.remove(SEARCH_HISTORY_KEY) {
                    warn!(error = %err, "failed to remove search history");
                }
                Vec::new()
            }
        };

        Self {
            storage,
            entries,
            limit,
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a term now.
    pub fn add(&mut self, term: &str) -> Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;
        self.add_at(term, now)
    }

    /// Record a term with an explicit timestamp. Blank terms are ignored; an
    /// existing entry with the same term (ignoring case) is replaced.
    pub fn add_at(&mut self, term: &str, timestamp: i64) -> Result<()> {
        if term.trim().is_empty() {
            return Ok(());
        }

        let lowered = term.to_lowercase();
        let mut entries = Vec::with_capacity(self.limit);
        entries.push(HistoryEntry::new(term, timestamp));
        entries.extend(
            self.entries
                .iter()
                .filter(|entry| entry.term.to_lowercase() != lowered)
                .cloned(),
        );
        entries.truncate(self.limit);

        self.entries = entries;
        save_json(self.storage.as_ref(), SEARCH_HISTORY_KEY, &self.entries)?;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.storage.remove(SEARCH_HISTORY_KEY)?;
        Ok(())
    }

    /// History entries presented as search results.
    pub fn suggestions(&self) -> Vec<SearchableItem> {
        self.entries.iter().map(HistoryEntry::to_suggestion).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsefs_storage::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    fn history(storage: &MemoryStore) -> SearchHistory {
        SearchHistory::load(Arc::new(storage.clone()), 7)
    }

    #[test]
    fn keeps_seven_most_recent_terms() {
        let storage = MemoryStore::new();
        let mut history = history(&storage);

        for i in 0..10 {
            history.add_at(&format!("terme {i}"), 1_000 + i).unwrap();
        }

        let terms: Vec<_> = history.entries().iter().map(|e| e.term.as_str()).collect();
        assert_eq!(
            terms,
            ["terme 9", "terme 8", "terme 7", "terme 6", "terme 5", "terme 4", "terme 3"]
        );
    }

    #[test]
    fn re_adding_term_moves_it_to_front() {
        let storage = MemoryStore::new();
        let mut history = history(&storage);
        history.add_at("Reboisement", 1).unwrap();
        history.add_at("Semences", 2).unwrap();
        history.add_at("reboisement", 3).unwrap();

        let entries = history.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].term, "reboisement");
        assert_eq!(entries[0].id, "hist-3-reboisement");
        assert_eq!(entries[1].term, "Semences");
    }

    #[test]
    fn blank_terms_are_ignored() {
        let storage = MemoryStore::new();
        let mut history = history(&storage);
        history.add_at("   ", 1).unwrap();

        assert!(history.is_empty());
        assert_eq!(storage.get(SEARCH_HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn persists_and_reloads_sorted() {
        let storage = MemoryStore::new();
        storage
            .set(
                SEARCH_HISTORY_KEY,
                r#"[{"id":"hist-1-a","term":"a","timestamp":1},{"id":"hist-5-b","term":"b","timestamp":5}]"#,
            )
            .unwrap();

        let mut history = history(&storage);
        assert_eq!(history.entries()[0].term, "b");

        history.add_at("c", 9).unwrap();
        let reloaded = SearchHistory::load(Arc::new(storage.clone()), 7);
        let terms: Vec<_> = reloaded.entries().iter().map(|e| e.term.as_str()).collect();
        assert_eq!(terms, ["c", "b", "a"]);
    }

    #[test]
    fn malformed_history_is_discarded() {
        let storage = MemoryStore::new();
        storage.set(SEARCH_HISTORY_KEY, "[{broken").unwrap();

        let history = history(&storage);

        assert!(history.is_empty());
        assert_eq!(storage.get(SEARCH_HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn clear_removes_storage_key() {
        let storage = MemoryStore::new();
        let mut history = history(&storage);
        history.add_at("forêt classée", 1).unwrap();

        history.clear().unwrap();

        assert!(history.is_empty());
        assert_eq!(storage.get(SEARCH_HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn suggestions_point_to_results_page() {
        let storage = MemoryStore::new();
        let mut history = history(&storage);
        history.add_at("feux de brousse", 42).unwrap();

        let suggestion = &history.suggestions()[0];
        assert_eq!(suggestion.id, "hist-42-feux de brousse");
        assert_eq!(suggestion.type_label, "Historique");
        assert_eq!(suggestion.category, "Recherche Récente");
        assert_eq!(suggestion.path, "/search/results?q=feux%20de%20brousse");
        assert_eq!(suggestion.is_history, Some(true));
    }
}
