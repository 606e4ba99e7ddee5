//! Document store collaborator.
//!
//! The remote store is collection/key addressed and stores JSON objects.
//! Writes either overwrite the whole document or merge top-level fields into
//! it. Fields marked with [`Document::with_server_timestamp`] are filled in
//! by the store with its own clock at write time.
//!
//! Two in-process implementations are provided:
//!
//! - [`MemoryStore`] - keeps documents in memory and logs every write
//! - [`JsonDirStore`] - one JSON file per document under a root directory

mod json_dir;
mod memory;

pub use json_dir::JsonDirStore;
pub use memory::{MemoryStore, WriteLogEntry};

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// A stored document: a JSON object.
pub type Fields = Map<String, Value>;

/// Errors returned by a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected or could not perform the operation.
    #[error("store backend error: {0}")]
    Backend(String),

    /// A document could not be encoded or decoded.
    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local I/O failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Collection or key cannot be used as an address.
    #[error("invalid document address '{0}'")]
    InvalidKey(String),

    /// The store did not answer in time.
    #[error("store did not answer within {0:?}")]
    Timeout(Duration),
}

/// How a write combines with an existing document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the whole document.
    Overwrite,
    /// Replace only the fields present in the write.
    Merge,
}

/// A document pending a write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: Fields,
    server_timestamps: Vec<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode any serializable value that maps to a JSON object.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, StoreError> {
        match serde_json::to_value(value)? {
            Value::Object(fields) => Ok(Self {
                fields,
                server_timestamps: Vec::new(),
            }),
            other => Err(StoreError::Backend(format!(
                "documents must be JSON objects, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Set a field.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Ask the store to fill `field` with its own write time.
    pub fn with_server_timestamp(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.fields.remove(&field);
        if !self.server_timestamps.contains(&field) {
            self.server_timestamps.push(field);
        }
        self
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn server_timestamp_fields(&self) -> &[String] {
        &self.server_timestamps
    }

    /// Materialise the document, filling server timestamps with `now`.
    pub fn resolve(self, now: DateTime<Utc>) -> Fields {
        let mut fields = self.fields;
        let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        for field in self.server_timestamps {
            fields.insert(field, Value::String(stamp.clone()));
        }
        fields
    }
}

/// Collection-based document store.
pub trait DocumentStore: Send + Sync + 'static {
    /// Write a document under `collection/key`.
    fn upsert(
        &self,
        collection: &str,
        key: &str,
        document: Document,
        mode: WriteMode,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Read a document, `None` if it does not exist.
    fn get(
        &self,
        collection: &str,
        key: &str,
    ) -> impl Future<Output = Result<Option<Fields>, StoreError>> + Send;
}

/// Apply a write to an existing document.
pub(crate) fn apply_write(existing: Option<Fields>, incoming: Fields, mode: WriteMode) -> Fields {
    match (mode, existing) {
        (WriteMode::Merge, Some(mut current)) => {
            current.extend(incoming);
            current
        }
        _ => incoming,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
