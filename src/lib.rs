// Sheep Status - personal status board with activity log and call-sheep alerts

pub mod activity;
pub mod call;
pub mod config;
pub mod mood;
pub mod notify;
pub mod server;
pub mod storage;

pub use activity::{BoundedLog, LogEntry, MAX_LOG_SIZE};
pub use call::{CallReport, CallRequest, CallSheep};
pub use config::ServiceConfig;
pub use notify::{CommandNotifier, Notifier, NotifierConfig, NotifierError, NotifyOutcome};
pub use storage::{DocumentStore, JsonFileStore, MemoryStore, StorageError};
