//! Cross-source search aggregation.

use std::time::Duration;

use dsefs_storage::SharedStore;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::item::SearchableItem;
use crate::records::{Agent, RapportEnPreparation, UploadedDocument};
use crate::sources::{NatureCatalogSource, SearchSource, StoredSource};

/// Tuning for the aggregator and the live search session.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub max_results_per_source: usize,
    pub max_history_items: usize,
    pub debounce: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results_per_source: 3,
            max_history_items: 7,
            debounce: Duration::from_millis(300),
        }
    }
}

/// Scans every source for a query and merges the results.
pub struct SearchAggregator {
    storage: SharedStore,
    sources: Vec<Box<dyn SearchSource>>,
    config: SearchConfig,
}

impl SearchAggregator {
    /// Aggregator over reports, documents, agents and the nature catalog.
    pub fn new(storage: SharedStore, config: SearchConfig) -> Self {
        let sources: Vec<Box<dyn SearchSource>> = vec![
            Box::new(StoredSource::<RapportEnPreparation>::new("reports")),
            Box::new(StoredSource::<UploadedDocument>::new("documents")),
            Box::new(StoredSource::<Agent>::new("agents")),
            Box::new(NatureCatalogSource),
        ];
        Self::with_sources(storage, config, sources)
    }

    pub fn with_sources(
        storage: SharedStore,
        config: SearchConfig,
        sources: Vec<Box<dyn SearchSource>>,
    ) -> Self {
        Self {
            storage,
            sources,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run the query against every source.
    ///
    /// A blank query returns nothing without reading storage. A source that
    /// fails to load is logged and skipped.
    pub fn search(&self, query: &str) -> Vec<SearchableItem> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        let needle = query.to_lowercase();

        let mut combined = Vec::new();
        for source in &self.sources {
            match source.search(
                self.storage.as_ref(),
                &needle,
                self.config.max_results_per_source,
            ) {
                Ok(items) => combined.extend(items),
                Err(err) => warn!(source = source.name(), error = %err, "search source failed"),
            }
        }

        let results = dedup_by_id(combined);
        debug!(query, results = results.len(), "search completed");
        results
    }
}

/// Later duplicates replace earlier values but keep the first position.
fn dedup_by_id(items: Vec<SearchableItem>) -> Vec<SearchableItem> {
    let mut unique: IndexMap<String, SearchableItem> = IndexMap::with_capacity(items.len());
    for item in items {
        unique.insert(item.id.clone(), item);
    }
    unique.into_values().collect()
}
