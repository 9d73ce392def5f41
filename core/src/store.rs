use crate::record::{Record, RecordId};
use std::collections::HashMap;
use std::sync::Arc;

/// Append-only map of mirrored records keyed by id.
#[derive(Debug, Default)]
pub struct CorpusStore {
    records: HashMap<RecordId, Arc<Record>>,
}

impl CorpusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record unless its id is already present. Returns whether the
    /// record was stored. The first record for an id always wins.
    pub fn insert(&mut self, record: Record) -> bool {
        if let Some(existing) = self.records.get(&record.id) {
            if **existing != record {
                tracing::warn!(id = %record.id, "conflicting duplicate record dropped");
            }
            return false;
        }
        self.records.insert(record.id.clone(), Arc::new(record));
        true
    }

    pub fn get(&self, id: &RecordId) -> Option<&Arc<Record>> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Record>> {
        self.records.values()
    }
}
