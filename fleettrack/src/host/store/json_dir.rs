//! Document store backed by a directory of JSON files.
//!
//! Layout: `<root>/<collection>/<key>.json`. Writes go to a temporary file
//! first and are renamed into place so readers never see partial documents.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::{apply_write, Document, DocumentStore, Fields, StoreError, WriteMode};

/// File-per-document JSON store.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, collection: &str, key: &str) -> Result<PathBuf, StoreError> {
        validate_segment(collection)?;
        validate_segment(key)?;
        Ok(self.root.join(collection).join(format!("{key}.json")))
    }

    async fn read(&self, path: &Path) -> Result<Option<Fields>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn validate_segment(segment: &str) -> Result<(), StoreError> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\', '\0']);
    if invalid {
        return Err(StoreError::InvalidKey(segment.to_string()));
    }
    Ok(())
}

impl DocumentStore for JsonDirStore {
    async fn upsert(
        &self,
        collection: &str,
        key: &str,
        document: Document,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        let path = self.document_path(collection, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let existing = match mode {
            WriteMode::Merge => self.read(&path).await?,
            WriteMode::Overwrite => None,
        };
        let fields = apply_write(existing, document.resolve(Utc::now()), mode);
        let bytes = serde_json::to_vec_pretty(&fields)?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        tracing::trace!(path = %path.display(), ?mode, "Document written");
        Ok(())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<Fields>, StoreError> {
        let path = self.document_path(collection, key)?;
        self.read(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_write_and_read_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = JsonDirStore::new(dir.path());

        store
            .upsert(
                "locations",
                "INT-7",
                Document::new().set("lat", -34.0).set("isActive", true),
                WriteMode::Overwrite,
            )
            .await
            .unwrap();

        assert!(dir.path().join("locations").join("INT-7.json").exists());
        let doc = store.get("locations", "INT-7").await.unwrap().unwrap();
        assert_eq!(doc.get("lat"), Some(&json!(-34.0)));
    }

    #[tokio::test]
    async fn test_merge_keeps_other_fields() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = JsonDirStore::new(dir.path());

        store
            .upsert(
                "locations",
                "INT-7",
                Document::new().set("plate", "AB123CD").set("isActive", true),
                WriteMode::Overwrite,
            )
            .await
            .unwrap();
        store
            .upsert(
                "locations",
                "INT-7",
                Document::new()
                    .set("isActive", false)
                    .with_server_timestamp("capturedAt"),
                WriteMode::Merge,
            )
            .await
            .unwrap();

        let doc = store.get("locations", "INT-7").await.unwrap().unwrap();
        assert_eq!(doc.get("plate"), Some(&json!("AB123CD")));
        assert_eq!(doc.get("isActive"), Some(&json!(false)));
        assert!(doc.contains_key("capturedAt"));
    }

    #[tokio::test]
    async fn test_missing_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = JsonDirStore::new(dir.path());
        assert!(store.get("locations", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = JsonDirStore::new(dir.path());

        let result = store
            .upsert("locations", "../escape", Document::new(), WriteMode::Overwrite)
            .await;
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));

        let result = store.get("..", "INT-1").await;
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));
    }
}
