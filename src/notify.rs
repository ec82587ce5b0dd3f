//! Outbound notifications
//!
//! Sends a one-shot message to a fixed external channel by running the
//! messaging client as a child process. Dispatch is not idempotent: every
//! call delivers another message.

use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

/// Errors that can occur while dispatching a notification.
#[derive(Error, Debug)]
pub enum NotifierError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Lost track of {program} while waiting for it: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Messaging client exited with {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("Messaging client timed out after {0:?}")]
    Timeout(Duration),
}

/// Result of a single dispatch attempt.
#[derive(Debug)]
pub enum NotifyOutcome {
    Delivered,
    Failed(NotifierError),
}

impl NotifyOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, NotifyOutcome::Delivered)
    }
}

impl From<Result<(), NotifierError>> for NotifyOutcome {
    fn from(result: Result<(), NotifierError>) -> Self {
        match result {
            Ok(()) => NotifyOutcome::Delivered,
            Err(e) => NotifyOutcome::Failed(e),
        }
    }
}

/// Something that can deliver a message to the configured channel.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> NotifyOutcome;
}

/// Configuration for the command-line messaging client
#[derive(Clone, Debug)]
pub struct NotifierConfig {
    /// Path or name of the messaging client binary
    pub program: String,

    /// Destination channel identifier
    pub target: String,

    /// How long to wait for the client before giving up
    pub timeout: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            program: "openclaw".to_string(),
            target: "sheep".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Runs `<program> message send --target <target> --message <text>`.
pub struct CommandNotifier {
    config: NotifierConfig,
}

impl CommandNotifier {
    pub fn new(config: NotifierConfig) -> Self {
        Self { config }
    }

    /// Arguments passed to the client for a given message
    fn args<'a>(&'a self, message: &'a str) -> [&'a str; 6] {
        ["message", "send", "--target", self.config.target.as_str(), "--message", message]
    }

    async fn dispatch(&self, message: &str) -> Result<(), NotifierError> {
        let child = Command::new(&self.config.program)
            .args(self.args(message))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| NotifierError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(self.config.timeout, child.wait_with_output())
            .await
            .map_err(|_| NotifierError::Timeout(self.config.timeout))?
            .map_err(|source| NotifierError::Wait {
                program: self.config.program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(NotifierError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[async_trait::async_trait]
impl Notifier for CommandNotifier {
    async fn notify(&self, message: &str) -> NotifyOutcome {
        log::debug!("dispatching notification via {}", self.config.program);
        self.dispatch(message).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier(program: &str, timeout: Duration) -> CommandNotifier {
        CommandNotifier::new(NotifierConfig {
            program: program.to_string(),
            target: "test-channel".to_string(),
            timeout,
        })
    }

    #[test]
    fn test_args_layout() {
        let n = notifier("client", Duration::from_secs(1));
        assert_eq!(
            n.args("hello"),
            ["message", "send", "--target", "test-channel", "--message", "hello"]
        );
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let n = notifier("/nonexistent/messaging-client", Duration::from_secs(1));
        match n.notify("hi").await {
            NotifyOutcome::Failed(NotifierError::Spawn { program, .. }) => {
                assert_eq!(program, "/nonexistent/messaging-client");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_wait_error_does_not_claim_spawn_failure() {
        let err = NotifierError::Wait {
            program: "client".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Interrupted, "pipe closed"),
        };
        let message = err.to_string();
        assert!(!message.contains("Failed to start"));
        assert!(message.contains("client"));
        assert!(message.contains("pipe closed"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_zero_exit_is_delivered() {
        let n = notifier("true", Duration::from_secs(5));
        assert!(n.notify("hi").await.is_delivered());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let n = notifier("false", Duration::from_secs(5));
        match n.notify("hi").await {
            NotifyOutcome::Failed(NotifierError::Failed { code, .. }) => assert_eq!(code, Some(1)),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_client_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow-client");
        std::fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let n = notifier(script.to_str().unwrap(), Duration::from_millis(100));
        match n.notify("hi").await {
            NotifyOutcome::Failed(NotifierError::Timeout(d)) => {
                assert_eq!(d, Duration::from_millis(100))
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
