use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::error::{DispatchError, HandlerError};
use crate::notifier::{NotificationEmitter, TaskRun};
use crate::Envelope;

/// Per-invocation context handed to a task handler.
///
/// Built by the dispatcher for every inbound event; never shared between
/// invocations.
#[derive(Debug)]
pub struct HandlerContext {
    trigger: Envelope,
    emitter: NotificationEmitter,
    cancel: CancellationToken,
}

impl HandlerContext {
    pub fn new(trigger: Envelope, emitter: NotificationEmitter, cancel: CancellationToken) -> Self {
        Self {
            trigger,
            emitter,
            cancel,
        }
    }

    pub fn trigger(&self) -> &Envelope {
        &self.trigger
    }

    pub fn emitter(&self) -> &NotificationEmitter {
        &self.emitter
    }

    /// Request-scoped cancellation signal. Long-running actions must watch it.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Start a lifecycle run for `task_name` against this context's trigger.
    pub fn task_run<'a>(&'a self, task_name: &'a str) -> TaskRun<'a> {
        TaskRun::new(&self.emitter, &self.trigger, task_name)
    }
}

/// Handles the `<task>.triggered` event of one task.
///
/// ## Contract
///
/// - `task_name()` decides which trigger type the handler is registered for
///   (`sh.keptn.event.<task>.triggered`).
/// - `Payload` is the schema of the trigger's `data`; the dispatcher decodes it
///   before calling `handle` and reports mismatches without invoking the handler.
/// - Handlers emit their own lifecycle notifications through the context.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    type Payload: DeserializeOwned + Send + 'static;

    fn task_name(&self) -> &'static str;

    async fn handle(&self, ctx: &HandlerContext, payload: Self::Payload) -> Result<(), HandlerError>;
}

/// Object-safe view of an [`EventHandler`], used for the dispatch table.
#[async_trait]
pub trait DynEventHandler: Send + Sync {
    fn task_name(&self) -> &'static str;

    async fn handle_envelope(&self, ctx: &HandlerContext) -> Result<(), DispatchError>;
}

/// Adapter that decodes the payload and forwards to the typed handler.
#[derive(Debug)]
pub struct TypedEventHandler<H> {
    handler: H,
}

impl<H: EventHandler> TypedEventHandler<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<H: EventHandler> DynEventHandler for TypedEventHandler<H> {
    fn task_name(&self) -> &'static str {
        self.handler.task_name()
    }

    async fn handle_envelope(&self, ctx: &HandlerContext) -> Result<(), DispatchError> {
        let payload: H::Payload = ctx.trigger().data_as()?;
        self.handler.handle(ctx, payload).await?;
        Ok(())
    }
}
