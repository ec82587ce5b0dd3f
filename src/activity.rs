//! Activity log
//!
//! A newest-first list of display entries capped at [`MAX_LOG_SIZE`]. Both
//! the generic log endpoint and the call-sheep path write through
//! [`BoundedLog::append`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::storage::{self, DocumentStore, StorageError};

/// Maximum number of entries kept in the log.
pub const MAX_LOG_SIZE: usize = 20;

/// Slot the log is persisted under.
pub const LOG_SLOT: &str = "logs";

/// A single log line. Both fields are opaque display strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub time: String,
    pub event: String,
}

impl LogEntry {
    pub fn new(time: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            time: time.into(),
            event: event.into(),
        }
    }
}

/// Prepend `entry` and drop whatever falls past the capacity.
fn push_front_bounded(entries: &mut Vec<LogEntry>, entry: LogEntry, capacity: usize) {
    entries.insert(0, entry);
    entries.truncate(capacity);
}

/// Capacity-capped, newest-first log over a document slot.
///
/// Appends are a read-modify-write of the whole slot. The write lock keeps
/// that cycle atomic within the process, so concurrent appends never
/// overwrite each other.
pub struct BoundedLog {
    store: Arc<dyn DocumentStore>,
    slot: String,
    capacity: usize,
    write_lock: Mutex<()>,
}

impl BoundedLog {
    /// Create a log on the default slot with the default capacity.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_slot(store, LOG_SLOT, MAX_LOG_SIZE)
    }

    pub fn with_slot(store: Arc<dyn DocumentStore>, slot: &str, capacity: usize) -> Self {
        Self {
            store,
            slot: slot.to_string(),
            capacity,
            write_lock: Mutex::new(()),
        }
    }

    /// Current entries, newest first. Empty if nothing was ever written.
    pub async fn list(&self) -> Result<Vec<LogEntry>, StorageError> {
        storage::load_or(self.store.as_ref(), &self.slot, Vec::new()).await
    }

    /// Put `entry` at the head of the log, discarding the oldest entries
    /// beyond capacity.
    pub async fn append(&self, entry: LogEntry) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.list().await?;
        log::info!("log append: [{}] {}", entry.time, entry.event);
        push_front_bounded(&mut entries, entry, self.capacity);
        storage::save(self.store.as_ref(), &self.slot, &entries).await
    }
}
