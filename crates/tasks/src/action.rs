//! The work performed for a test trigger.
//!
//! Actions are awaited by the handler, watch the request-scoped cancellation
//! token, and are bounded by a deadline. Any failure becomes an errored
//! finished notification.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use k6svc_events::{HandlerError, TestTriggeredEventData};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("action cancelled")]
    Cancelled,

    #[error("action did not finish within {0:?}")]
    DeadlineExceeded(Duration),

    #[error("action failed: {0}")]
    Failed(String),
}

impl From<ActionError> for HandlerError {
    fn from(value: ActionError) -> Self {
        match value {
            ActionError::Cancelled => HandlerError::Cancelled(value.to_string()),
            ActionError::DeadlineExceeded(_) | ActionError::Failed(_) => {
                HandlerError::Failed(value.to_string())
            }
        }
    }
}

/// Runs a test against the deployment described by the trigger.
///
/// Returns the human-readable message for the finished notification.
#[async_trait]
pub trait TestAction: Send + Sync + 'static {
    async fn run(
        &self,
        data: &TestTriggeredEventData,
        cancel: &CancellationToken,
    ) -> Result<String, ActionError>;
}

/// Placeholder test: waits a fixed duration.
#[derive(Debug, Clone)]
pub struct SleepAction {
    duration: Duration,
}

impl SleepAction {
    pub const MESSAGE: &'static str = "Successfully sleeped!";

    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

#[async_trait]
impl TestAction for SleepAction {
    async fn run(
        &self,
        _data: &TestTriggeredEventData,
        cancel: &CancellationToken,
    ) -> Result<String, ActionError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ActionError::Cancelled),
            _ = tokio::time::sleep(self.duration) => Ok(Self::MESSAGE.to_string()),
        }
    }
}

/// Run `action`, giving up after `deadline`.
pub async fn run_with_deadline<A: TestAction + ?Sized>(
    action: &A,
    data: &TestTriggeredEventData,
    cancel: &CancellationToken,
    deadline: Duration,
) -> Result<String, ActionError> {
    if cancel.is_cancelled() {
        return Err(ActionError::Cancelled);
    }
    tokio::time::timeout(deadline, action.run(data, cancel))
        .await
        .map_err(|_| ActionError::DeadlineExceeded(deadline))?
}
