//! Event dispatch: inbound envelope → registered task handler.
//!
//! ## Dispatch Flow
//!
//! ```text
//! Envelope
//!   ↓
//! 1. Look up `type` in the handler table (exact match)
//!   ↓
//! 2. Build the per-invocation HandlerContext
//!   ↓
//! 3. Decode the typed payload (schema errors stop here, nothing is sent)
//!   ↓
//! 4. Run the handler; its error is returned unchanged
//! ```
//!
//! The table is an explicit map from trigger type to handler, so adding a task
//! means registering another handler; the dispatch code itself does not change.
//! The dispatcher holds no per-event state and can be shared across concurrent
//! requests.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::{DispatchError, RegistryError};
use crate::event_type::{parse_event_type, triggered_event_type};
use crate::handler::{DynEventHandler, EventHandler, HandlerContext, TypedEventHandler};
use crate::notifier::NotificationEmitter;
use crate::Envelope;

pub struct Dispatcher {
    emitter: NotificationEmitter,
    handlers: HashMap<String, Arc<dyn DynEventHandler>>,
}

impl core::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("emitter", &self.emitter)
            .field("handled_types", &self.handled_types())
            .finish()
    }
}

impl Dispatcher {
    pub fn new(emitter: NotificationEmitter) -> Self {
        Self {
            emitter,
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for `sh.keptn.event.<task>.triggered`.
    pub fn register<H: EventHandler>(&mut self, handler: H) -> Result<(), RegistryError> {
        let event_type = triggered_event_type(handler.task_name());
        if self.handlers.contains_key(&event_type) {
            return Err(RegistryError::AlreadyRegistered(event_type));
        }
        self.handlers
            .insert(event_type, Arc::new(TypedEventHandler::new(handler)));
        Ok(())
    }

    /// Builder-style [`Dispatcher::register`].
    pub fn with_handler<H: EventHandler>(mut self, handler: H) -> Result<Self, RegistryError> {
        self.register(handler)?;
        Ok(self)
    }

    /// Event types with a registered handler, sorted.
    pub fn handled_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn handles(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }

    /// Dispatch with a cancellation signal nobody else holds.
    pub async fn dispatch(&self, envelope: Envelope) -> Result<(), DispatchError> {
        self.dispatch_with_cancellation(envelope, CancellationToken::new())
            .await
    }

    /// Dispatch `envelope` to its handler.
    ///
    /// `cancel` is the request-scoped signal passed through to the handler.
    pub async fn dispatch_with_cancellation(
        &self,
        envelope: Envelope,
        cancel: CancellationToken,
    ) -> Result<(), DispatchError> {
        tracing::info!(
            event_type = envelope.event_type(),
            context = envelope.context().map(|c| c.as_str()).unwrap_or_default(),
            event_id = %envelope.id(),
            "received event"
        );

        let Some(handler) = self.handlers.get(envelope.event_type()) else {
            match parse_event_type(envelope.event_type()) {
                Some((task, phase)) => tracing::warn!(
                    event_type = envelope.event_type(),
                    task,
                    phase = phase.as_str(),
                    "no handler for task event"
                ),
                None => tracing::warn!(
                    event_type = envelope.event_type(),
                    "unhandled event type"
                ),
            }
            return Err(DispatchError::UnhandledType {
                event_type: envelope.event_type().to_string(),
            });
        };

        let ctx = HandlerContext::new(envelope, self.emitter.clone(), cancel);
        let result = handler.handle_envelope(&ctx).await;

        if let Err(e) = &result {
            tracing::warn!(
                event_type = ctx.trigger().event_type(),
                event_id = %ctx.trigger().id(),
                task = handler.task_name(),
                error = %e,
                "dispatch failed"
            );
        }
        result
    }
}
