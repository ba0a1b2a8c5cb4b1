//! In-memory event sender for tests/dev.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::{Envelope, error::SendError, sender::EventSender};

/// Records every accepted envelope in send order.
///
/// - No IO
/// - Optional failure injection: accept the first `n` sends, reject the rest
#[derive(Debug, Default)]
pub struct InMemoryEventSender {
    sent: Mutex<Vec<Envelope>>,
    accept_limit: Option<usize>,
}

impl InMemoryEventSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender that rejects every event.
    pub fn failing() -> Self {
        Self::failing_after(0)
    }

    /// A sender that accepts `accepted` events and rejects everything after.
    pub fn failing_after(accepted: usize) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            accept_limit: Some(accepted),
        }
    }

    /// Snapshot of the accepted envelopes, oldest first.
    pub fn sent(&self) -> Vec<Envelope> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn sent_types(&self) -> Vec<String> {
        self.sent()
            .iter()
            .map(|e| e.event_type().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventSender for InMemoryEventSender {
    async fn send(&self, envelope: Envelope) -> Result<(), SendError> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| SendError::Unavailable("lock poisoned".to_string()))?;

        if let Some(limit) = self.accept_limit {
            if sent.len() >= limit {
                return Err(SendError::Rejected {
                    status: 503,
                    message: format!("in-memory sender refuses `{}`", envelope.event_type()),
                });
            }
        }

        sent.push(envelope);
        Ok(())
    }
}
