//! Outbound event transport abstraction (mechanics only).
//!
//! The emitter hands finished envelopes to an [`EventSender`] and awaits the
//! transport's answer. Delivery guarantees, retries and connection handling
//! belong to the implementation; the emitter never retries.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{Envelope, error::SendError};

/// Sends envelopes onto the event bus.
///
/// Implementations are shared by every in-flight invocation, so they must be
/// `Send + Sync` and safe to call concurrently. `send` resolves once the
/// transport has accepted or rejected the event.
#[async_trait]
pub trait EventSender: Send + Sync {
    async fn send(&self, envelope: Envelope) -> Result<(), SendError>;
}

#[async_trait]
impl<S> EventSender for Arc<S>
where
    S: EventSender + ?Sized,
{
    async fn send(&self, envelope: Envelope) -> Result<(), SendError> {
        (**self).send(envelope).await
    }
}
