//! In-memory document store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use parking_lot::{Mutex, RwLock};

use super::{apply_write, Document, DocumentStore, Fields, StoreError, WriteMode};

/// One write as it reached the store.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteLogEntry {
    pub collection: String,
    pub key: String,
    pub mode: WriteMode,
    /// Fields as written, server timestamps already resolved.
    pub fields: Fields,
}

/// Document store held in memory.
///
/// Every accepted write is appended to a log so callers can inspect the
/// exact sequence of writes. The store can be switched offline to make
/// writes fail.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<(String, String), Fields>>,
    writes: Mutex<Vec<WriteLogEntry>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every write and read fails with [`StoreError::Backend`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// All accepted writes, oldest first.
    pub fn writes(&self) -> Vec<WriteLogEntry> {
        self.writes.lock().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }

    /// Current document, without going through the async API.
    pub fn document(&self, collection: &str, key: &str) -> Option<Fields> {
        self.documents
            .read()
            .get(&(collection.to_string(), key.to_string()))
            .cloned()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.is_offline() {
            Err(StoreError::Backend("store unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl DocumentStore for MemoryStore {
    async fn upsert(
        &self,
        collection: &str,
        key: &str,
        document: Document,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        self.check_online()?;

        let fields = document.resolve(Utc::now());
        let address = (collection.to_string(), key.to_string());

        {
            let mut documents = self.documents.write();
            let existing = documents.remove(&address);
            documents.insert(address, apply_write(existing, fields.clone(), mode));
        }

        self.writes.lock().push(WriteLogEntry {
            collection: collection.to_string(),
            key: key.to_string(),
            mode,
            fields,
        });

        Ok(())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Fields>, StoreError> {
        self.check_online()?;
        Ok(self.document(collection, key))
    }
}
