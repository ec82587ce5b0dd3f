//! Current mood record

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::storage::{self, DocumentStore, StorageError};

pub const MOOD_SLOT: &str = "mood";

/// The mood document. Fields beyond `mood` and `emoji` are passed through.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mood {
    pub mood: String,
    pub emoji: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Mood {
    /// Shown before any mood has been written.
    pub fn unknown() -> Self {
        Self {
            mood: "未知".to_string(),
            emoji: "❓".to_string(),
            extra: Map::new(),
        }
    }
}

/// Read-only view of the mood slot.
pub struct MoodBoard {
    store: Arc<dyn DocumentStore>,
}

impl MoodBoard {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn current(&self) -> Result<Mood, StorageError> {
        storage::load_or(self.store.as_ref(), MOOD_SLOT, Mood::unknown()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_unknown_before_first_write() {
        let board = MoodBoard::new(Arc::new(MemoryStore::new()));
        assert_eq!(board.current().await.unwrap(), Mood::unknown());
    }

    #[tokio::test]
    async fn test_extra_fields_pass_through() {
        let store = Arc::new(MemoryStore::new());
        store
            .write(MOOD_SLOT, &json!({"mood": "開心", "emoji": "😊", "note": "吃飽了"}))
            .await
            .unwrap();

        let mood = MoodBoard::new(store).current().await.unwrap();
        assert_eq!(mood.mood, "開心");
        assert_eq!(mood.extra["note"], "吃飽了");
        assert_eq!(
            serde_json::to_value(&mood).unwrap(),
            json!({"mood": "開心", "emoji": "😊", "note": "吃飽了"})
        );
    }
}
