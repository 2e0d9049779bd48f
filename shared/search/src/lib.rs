//! Global search for the DSEFS dashboard.
//!
//! The [`SearchAggregator`] scans the report, document and agent collections
//! plus the report-nature catalog, keeps at most a few matches per source and
//! merges them into one list of [`SearchableItem`]s. [`GlobalSearch`] adds the
//! debounced live query and the bounded [`SearchHistory`].

pub mod aggregator;
pub mod collection;
pub mod history;
pub mod item;
pub mod records;
pub mod session;
pub mod sources;

pub use aggregator::{SearchAggregator, SearchConfig};
pub use collection::RecordCollection;
pub use history::{HistoryEntry, SearchHistory, SEARCH_HISTORY_KEY};
pub use item::{results_path, ItemIcon, SearchableItem};
pub use records::{
    Agent, RapportEnPreparation, ReportNature, ReportStatus, SourceRecord, UploadedDocument,
};
pub use session::{GlobalSearch, SearchState, SearchTarget};
pub use sources::{NatureCatalogSource, SearchSource, StoredSource};

/// Search-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("storage error: {0}")]
    Storage(#[from] dsefs_storage::StorageError),
}

pub type Result<T> = std::result::Result<T, SearchError>;
