//! Lifecycle notifications (`*.started` / `*.finished`) for a trigger.
//!
//! Every notification copies the trigger's correlation context and points back
//! at it through `triggeredid`, so an observer can pair started and finished
//! events even when many runs interleave.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value as JsonValue;

use k6svc_core::{EventId, ServiceConfig};

use crate::envelope::JSON_CONTENT_TYPE;
use crate::error::SendError;
use crate::event_type::{finished_event_type, started_event_type};
use crate::payload::{EventData, FinishedEventData, Outcome};
use crate::{Envelope, EventSender};

/// Builds and sends lifecycle notifications.
///
/// Cheap to clone; clones share the underlying sender.
#[derive(Clone)]
pub struct NotificationEmitter {
    sender: Arc<dyn EventSender>,
    source: String,
}

impl core::fmt::Debug for NotificationEmitter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NotificationEmitter")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl NotificationEmitter {
    pub fn new(sender: Arc<dyn EventSender>, source: impl Into<String>) -> Self {
        Self {
            sender,
            source: source.into(),
        }
    }

    /// Emitter stamping the configured service name as `source`.
    pub fn from_config(sender: Arc<dyn EventSender>, config: &ServiceConfig) -> Self {
        Self::new(sender, config.service_name.clone())
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Announce that work on `trigger` has begun.
    pub async fn emit_started(&self, trigger: &Envelope, task_name: &str) -> Result<(), SendError> {
        let data = carried_data(trigger);
        let envelope = self.notification(trigger, started_event_type(task_name), &data)?;
        self.send(envelope).await
    }

    /// Report the outcome of work on `trigger`.
    pub async fn emit_finished(
        &self,
        trigger: &Envelope,
        task_name: &str,
        outcome: &Outcome,
    ) -> Result<(), SendError> {
        let data = FinishedEventData::new(carried_data(trigger), outcome);
        let envelope = self.notification(trigger, finished_event_type(task_name), &data)?;
        self.send(envelope).await
    }

    fn notification<D: Serialize>(
        &self,
        trigger: &Envelope,
        event_type: String,
        data: &D,
    ) -> Result<Envelope, SendError> {
        let data: JsonValue =
            serde_json::to_value(data).map_err(|e| SendError::Transport(e.to_string()))?;

        Ok(Envelope::new(EventId::generate(), self.source.clone(), event_type, data)
            .with_time(Utc::now())
            .with_content_type(JSON_CONTENT_TYPE)
            .with_context(trigger.context().cloned())
            .with_triggered_id(Some(trigger.id().clone()))
            .with_keptn_spec_version(trigger.keptn_spec_version().map(str::to_string)))
    }

    async fn send(&self, envelope: Envelope) -> Result<(), SendError> {
        let event_type = envelope.event_type().to_string();
        let id = envelope.id().clone();

        match self.sender.send(envelope).await {
            Ok(()) => {
                tracing::debug!(event_type = %event_type, event_id = %id, "sent notification");
                Ok(())
            }
            Err(e) => {
                tracing::error!(event_type = %event_type, event_id = %id, error = %e, "failed to send notification");
                Err(e)
            }
        }
    }
}

/// Project/stage/service/labels of the trigger; empty when `data` has none.
fn carried_data(trigger: &Envelope) -> EventData {
    trigger.data_as::<EventData>().unwrap_or_default()
}

/// Lifecycle state of one handler invocation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Started,
    Finished,
    Errored,
}

/// A task run that has not announced itself yet (`Idle`).
///
/// The only way to finish a run is through the [`StartedTask`] returned by
/// [`TaskRun::start`], so `started` always goes out before `finished`.
#[derive(Debug)]
pub struct TaskRun<'a> {
    emitter: &'a NotificationEmitter,
    trigger: &'a Envelope,
    task_name: &'a str,
}

impl<'a> TaskRun<'a> {
    pub fn new(emitter: &'a NotificationEmitter, trigger: &'a Envelope, task_name: &'a str) -> Self {
        Self {
            emitter,
            trigger,
            task_name,
        }
    }

    pub fn state(&self) -> TaskState {
        TaskState::Idle
    }

    /// `Idle -> Started`.
    pub async fn start(self) -> Result<StartedTask<'a>, SendError> {
        self.emitter.emit_started(self.trigger, self.task_name).await?;
        tracing::info!(
            task = self.task_name,
            triggered_id = %self.trigger.id(),
            "task started"
        );
        Ok(StartedTask {
            emitter: self.emitter,
            trigger: self.trigger,
            task_name: self.task_name,
        })
    }
}

/// A task run whose started notification has been sent.
#[derive(Debug)]
pub struct StartedTask<'a> {
    emitter: &'a NotificationEmitter,
    trigger: &'a Envelope,
    task_name: &'a str,
}

impl StartedTask<'_> {
    pub fn state(&self) -> TaskState {
        TaskState::Started
    }

    /// `Started -> Finished` or `Started -> Errored`, depending on the outcome.
    pub async fn finish(self, outcome: Outcome) -> Result<TaskState, SendError> {
        self.emitter
            .emit_finished(self.trigger, self.task_name, &outcome)
            .await?;

        let state = if outcome.is_success() {
            TaskState::Finished
        } else {
            TaskState::Errored
        };
        tracing::info!(
            task = self.task_name,
            triggered_id = %self.trigger.id(),
            state = ?state,
            message = %outcome.message,
            "task finished"
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryEventSender;
    use crate::payload::{Status, TaskResult};
    use k6svc_core::KeptnContext;
    use serde_json::json;

    fn trigger() -> Envelope {
        Envelope::new(
            EventId::from("evt-1"),
            "shipyard-controller",
            "sh.keptn.event.test.triggered",
            json!({
                "project": "sockshop",
                "stage": "dev",
                "service": "carts",
                "test": { "teststrategy": "functional" }
            }),
        )
        .with_context(Some(KeptnContext::from("ctx-1")))
        .with_keptn_spec_version(Some("0.2.0".to_string()))
    }

    fn emitter() -> (Arc<InMemoryEventSender>, NotificationEmitter) {
        let sender = Arc::new(InMemoryEventSender::new());
        let emitter = NotificationEmitter::new(sender.clone(), "k6-service");
        (sender, emitter)
    }

    #[tokio::test]
    async fn started_copies_correlation() {
        let (sender, emitter) = emitter();
        let trigger = trigger();

        emitter.emit_started(&trigger, "test").await.unwrap();

        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        let started = &sent[0];
        assert_eq!(started.event_type(), "sh.keptn.event.test.started");
        assert_eq!(started.source(), "k6-service");
        assert_eq!(started.context(), trigger.context());
        assert_eq!(started.triggered_id(), Some(trigger.id()));
        assert_eq!(started.keptn_spec_version(), Some("0.2.0"));
        assert_ne!(started.id(), trigger.id());
        assert_eq!(
            started.data(),
            &json!({ "project": "sockshop", "stage": "dev", "service": "carts" })
        );
    }

    #[tokio::test]
    async fn finished_carries_outcome() {
        let (sender, emitter) = emitter();
        let trigger = trigger();

        emitter
            .emit_finished(&trigger, "test", &Outcome::succeeded("done"))
            .await
            .unwrap();

        let finished = &sender.sent()[0];
        assert_eq!(finished.event_type(), "sh.keptn.event.test.finished");
        let data: FinishedEventData = finished.data_as().unwrap();
        assert_eq!(data.status, Status::Succeeded);
        assert_eq!(data.result, TaskResult::Pass);
        assert_eq!(data.message, "done");
        assert_eq!(data.event.service.as_deref(), Some("carts"));
    }

    #[tokio::test]
    async fn trigger_without_object_data_still_notifies() {
        let (sender, emitter) = emitter();
        let trigger = Envelope::new(EventId::from("e"), "s", "t", json!("text"));

        emitter.emit_started(&trigger, "test").await.unwrap();
        assert_eq!(sender.sent()[0].data(), &json!({}));
    }

    #[tokio::test]
    async fn send_failure_is_returned() {
        let sender = Arc::new(InMemoryEventSender::failing());
        let emitter = NotificationEmitter::new(sender, "k6-service");

        let err = emitter.emit_started(&trigger(), "test").await.unwrap_err();
        assert!(matches!(err, SendError::Rejected { .. }));
    }

    #[tokio::test]
    async fn task_run_walks_the_lifecycle() {
        let (sender, emitter) = emitter();
        let trigger = trigger();

        let run = TaskRun::new(&emitter, &trigger, "test");
        assert_eq!(run.state(), TaskState::Idle);
        let started = run.start().await.unwrap();
        assert_eq!(started.state(), TaskState::Started);
        let state = started.finish(Outcome::errored("nope")).await.unwrap();

        assert_eq!(state, TaskState::Errored);
        assert_eq!(
            sender.sent_types(),
            vec!["sh.keptn.event.test.started", "sh.keptn.event.test.finished"]
        );
    }

    #[tokio::test]
    async fn successful_outcome_finishes_the_run() {
        let (_sender, emitter) = emitter();
        let trigger = trigger();

        let started = TaskRun::new(&emitter, &trigger, "test").start().await.unwrap();
        let state = started.finish(Outcome::succeeded("ok")).await.unwrap();

        assert_eq!(state, TaskState::Finished);
    }
}
