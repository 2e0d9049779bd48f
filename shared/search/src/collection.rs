//! Read/write access to the collections the search scans.

use std::marker::PhantomData;

use dsefs_storage::{load_json, save_json, SharedStore};

use crate::records::SourceRecord;
use crate::Result;

/// The JSON array stored under `R::STORAGE_KEY`.
pub struct RecordCollection<R> {
    storage: SharedStore,
    _record: PhantomData<fn() -> R>,
}

impl<R: SourceRecord> RecordCollection<R> {
    pub fn new(storage: SharedStore) -> Self {
        Self {
            storage,
            _record: PhantomData,
        }
    }

    pub fn list(&self) -> Result<Vec<R>> {
        Ok(load_json(self.storage.as_ref(), R::STORAGE_KEY)?.unwrap_or_default())
    }

    pub fn replace_all(&self, records: &[R]) -> Result<()> {
        save_json(self.storage.as_ref(), R::STORAGE_KEY, records)?;
        Ok(())
    }

    /// Insert a record, or replace the one with the same id in place.
    pub fn upsert(&self, record: R) -> Result<()> {
        let mut records = self.list()?;
        match records.iter_mut().find(|existing| existing.id() == record.id()) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.replace_all(&records)
    }

    /// Remove the record with `id`. Returns whether one was removed.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let mut records = self.list()?;
        let before = records.len();
        records.retain(|record| record.id() != id);
        if records.len() == before {
            return Ok(false);
        }
        self.replace_all(&records)?;
        Ok(true)
    }
}
