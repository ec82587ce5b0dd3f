//! Call-sheep flow
//!
//! Records the call in the activity log, then alerts the sheep through the
//! notifier. The log entry is written first and is never rolled back; a
//! failed alert is logged and otherwise ignored.

use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::activity::{BoundedLog, LogEntry};
use crate::notify::{Notifier, NotifyOutcome};
use crate::storage::StorageError;

pub const DEFAULT_USER: &str = "未知客戶";
pub const DEFAULT_REASON: &str = "想找羊羊聊天";

/// Message returned to the caller once the call is recorded.
pub const CALL_ACK: &str = "已通知羊羊";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

fn default_reason() -> String {
    DEFAULT_REASON.to_string()
}

/// Who is calling and why. Missing fields take the defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallRequest {
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_reason")]
    pub reason: String,
}

impl Default for CallRequest {
    fn default() -> Self {
        Self {
            user: default_user(),
            reason: default_reason(),
        }
    }
}

impl CallRequest {
    /// Text of the activity log entry
    pub fn log_event(&self) -> String {
        format!("📞 {} 呼叫羊羊：{}", self.user, self.reason)
    }

    /// Text of the outbound alert
    pub fn alert_message(&self) -> String {
        format!("🐑 {} 正在呼叫羊羊！原因：{}", self.user, self.reason)
    }
}

/// What happened while handling a call.
#[derive(Debug)]
pub struct CallReport {
    pub entry: LogEntry,
    pub notification: NotifyOutcome,
}

pub struct CallSheep {
    log: Arc<BoundedLog>,
    notifier: Arc<dyn Notifier>,
}

impl CallSheep {
    pub fn new(log: Arc<BoundedLog>, notifier: Arc<dyn Notifier>) -> Self {
        Self { log, notifier }
    }

    /// Handle a call end to end.
    ///
    /// Only a storage failure while recording the call is an error. The
    /// notification outcome is reported back but never fails the call.
    pub async fn call(&self, request: CallRequest) -> Result<CallReport, StorageError> {
        let entry = LogEntry::new(Local::now().format(TIME_FORMAT).to_string(), request.log_event());
        self.log.append(entry.clone()).await?;

        log::info!("{} is calling the sheep: {}", request.user, request.reason);

        let notification = self.notifier.notify(&request.alert_message()).await;
        if let NotifyOutcome::Failed(e) = &notification {
            log::warn!("call from {} recorded but alert failed: {}", request.user, e);
        }

        Ok(CallReport { entry, notification })
    }
}
