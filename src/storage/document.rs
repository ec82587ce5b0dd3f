//! JSON document slots
//!
//! A slot is a named unit of persisted JSON state. Reading a slot that has
//! never been written is not an error: callers supply the default that
//! stands in for the missing document.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use super::StorageError;

/// Whole-document persistence for named JSON slots.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a slot. Returns `None` if the slot has never been written.
    async fn read(&self, slot: &str) -> Result<Option<Value>, StorageError>;

    /// Replace the full contents of a slot.
    async fn write(&self, slot: &str, value: &Value) -> Result<(), StorageError>;
}

/// Load a typed document, falling back to `default` for a missing slot.
pub async fn load_or<T>(store: &dyn DocumentStore, slot: &str, default: T) -> Result<T, StorageError>
where
    T: DeserializeOwned,
{
    match store.read(slot).await? {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| StorageError::SerializationError(format!("slot {}: {}", slot, e))),
        None => Ok(default),
    }
}

/// Serialize and save a typed document, replacing the slot.
pub async fn save<T>(store: &dyn DocumentStore, slot: &str, document: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(document)
        .map_err(|e| StorageError::SerializationError(format!("slot {}: {}", slot, e)))?;
    store.write(slot, &value).await
}

/// Stores each slot as `{slot}.json` under a base directory.
pub struct JsonFileStore {
    base_dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `base_dir`. The directory is created on first write.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Get the file path backing a slot
    pub fn slot_path(&self, slot: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", slot))
    }

    /// Scratch file a slot is written to before it replaces the real one
    fn staging_path(&self, slot: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json.tmp", slot))
    }
}

#[async_trait::async_trait]
impl DocumentStore for JsonFileStore {
    async fn read(&self, slot: &str) -> Result<Option<Value>, StorageError> {
        let path = self.slot_path(slot);

        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("slot {} not on disk yet ({})", slot, path.display());
                return Ok(None);
            }
            Err(e) => return Err(StorageError::IoError(e)),
        };

        let value = serde_json::from_slice(&data)
            .map_err(|e| StorageError::SerializationError(format!("{}: {}", path.display(), e)))?;
        log::debug!("read slot {} ({} bytes)", slot, data.len());
        Ok(Some(value))
    }

    async fn write(&self, slot: &str, value: &Value) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.base_dir).await?;

        let path = self.slot_path(slot);
        let json = serde_json::to_vec_pretty(value)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        // Readers only ever see the old document or the complete new one.
        let staging = self.staging_path(slot);
        tokio::fs::write(&staging, &json).await?;
        tokio::fs::rename(&staging, &path).await?;
        log::debug!("wrote slot {} ({} bytes)", slot, json.len());
        Ok(())
    }
}

/// Keeps slots in memory. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    slots: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, slot: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.slots.read().await.get(slot).cloned())
    }

    async fn write(&self, slot: &str, value: &Value) -> Result<(), StorageError> {
        self.slots.write().await.insert(slot.to_string(), value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_slot_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        assert!(store.read("logs").await.unwrap().is_none());
        let logs: Vec<String> = load_or(&store, "logs", Vec::new()).await.unwrap();
        assert!(logs.is_empty());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.write("mood", &json!({"mood": "開心", "emoji": "😊"})).await.unwrap();
        assert!(dir.path().join("mood.json").exists());

        let value = store.read("mood").await.unwrap().unwrap();
        assert_eq!(value["emoji"], "😊");
    }

    #[tokio::test]
    async fn test_write_replaces_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.write("mood", &json!({"mood": "a", "extra": 1})).await.unwrap();
        store.write("mood", &json!({"mood": "b"})).await.unwrap();

        let value = store.read("mood").await.unwrap().unwrap();
        assert_eq!(value, json!({"mood": "b"}));
    }

    #[tokio::test]
    async fn test_write_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store.write("logs", &json!([{"time": "t", "event": "a"}])).await.unwrap();
        store.write("logs", &json!([])).await.unwrap();

        assert!(!dir.path().join("logs.json.tmp").exists());
        assert_eq!(store.read("logs").await.unwrap(), Some(json!([])));
    }

    #[tokio::test]
    async fn test_interrupted_write_keeps_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.write("logs", &json!(["kept"])).await.unwrap();

        // A crash mid-write leaves only a truncated staging file behind.
        std::fs::write(dir.path().join("logs.json.tmp"), b"[\"half").unwrap();
        assert_eq!(store.read("logs").await.unwrap(), Some(json!(["kept"])));

        store.write("logs", &json!(["next"])).await.unwrap();
        assert_eq!(store.read("logs").await.unwrap(), Some(json!(["next"])));
    }

    #[tokio::test]
    async fn test_creates_base_dir_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data").join("nested");
        let store = JsonFileStore::new(&nested);

        save(&store, "logs", &vec!["x"]).await.unwrap();
        assert!(nested.join("logs.json").exists());
    }

    #[tokio::test]
    async fn test_corrupt_slot_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("logs.json"), b"{not json").unwrap();
        let store = JsonFileStore::new(dir.path());

        let result = store.read("logs").await;
        assert!(matches!(result, Err(StorageError::SerializationError(_))));
    }

    #[tokio::test]
    async fn test_unwritable_base_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file, not a directory").unwrap();
        let store = JsonFileStore::new(&blocker);

        let result = store.write("logs", &json!([])).await;
        assert!(matches!(result, Err(StorageError::IoError(_))));
    }

    #[tokio::test]
    async fn test_wrong_shape_fails_typed_load() {
        let store = MemoryStore::new();
        store.write("logs", &json!({"not": "a list"})).await.unwrap();

        let result: Result<Vec<String>, _> = load_or(&store, "logs", Vec::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.read("mood").await.unwrap().is_none());

        store.write("mood", &json!({"mood": "累"})).await.unwrap();
        assert_eq!(store.read("mood").await.unwrap(), Some(json!({"mood": "累"})));
    }
}
