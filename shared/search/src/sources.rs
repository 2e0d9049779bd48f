//! Independent collections the aggregator scans, in declaration order.

use std::marker::PhantomData;

use dsefs_storage::{load_json, KeyValueStore};
use serde_json::Value;
use tracing::warn;

use crate::item::{ItemIcon, SearchableItem, TYPE_CATEGORY};
use crate::records::{ReportNature, SourceRecord};
use crate::Result;

/// One searchable source.
pub trait SearchSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Items whose fields contain `needle` (already lowercase), truncated to
    /// `limit` before mapping.
    fn search(
        &self,
        storage: &dyn KeyValueStore,
        needle: &str,
        limit: usize,
    ) -> Result<Vec<SearchableItem>>;
}

/// A JSON array of records under the record type's storage key.
pub struct StoredSource<R> {
    name: &'static str,
    _record: PhantomData<fn() -> R>,
}

impl<R: SourceRecord> StoredSource<R> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            _record: PhantomData,
        }
    }
}

impl<R: SourceRecord> SearchSource for StoredSource<R> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn search(
        &self,
        storage: &dyn KeyValueStore,
        needle: &str,
        limit: usize,
    ) -> Result<Vec<SearchableItem>> {
        let values: Vec<Value> = load_json(storage, R::STORAGE_KEY)?.unwrap_or_default();
        Ok(values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<R>(value) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(source = self.name, error = %err, "skipping unreadable record");
                    None
                }
            })
            .filter(|record| record.matches(needle))
            .take(limit)
            .map(|record| record.to_searchable())
            .collect())
    }
}

/// The static report-nature catalog, offered as report filters.
pub struct NatureCatalogSource;

impl NatureCatalogSource {
    fn to_searchable(nature: ReportNature) -> SearchableItem {
        SearchableItem {
            id: format!("meta-nature-{}", nature.value()),
            title: nature.label().to_string(),
            type_label: TYPE_CATEGORY.to_string(),
            category: "Filtre de Rapport".to_string(),
            path: format!("/rapports/filtered?nature={}", nature.value()),
            description: None,
            icon: Some(ItemIcon::Category),
            is_history: None,
        }
    }
}

impl SearchSource for NatureCatalogSource {
    fn name(&self) -> &'static str {
        "natures"
    }

    fn search(
        &self,
        _storage: &dyn KeyValueStore,
        needle: &str,
        limit: usize,
    ) -> Result<Vec<SearchableItem>> {
        Ok(ReportNature::ALL
            .into_iter()
            .filter(|nature| nature.label().to_lowercase().contains(needle))
            .take(limit)
            .map(Self::to_searchable)
            .collect())
    }
}
