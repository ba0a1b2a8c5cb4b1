//! Error taxonomy for receiving, dispatching and emitting events.

use thiserror::Error;

/// The inbound body is not a usable event envelope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Not valid JSON, or not shaped like an envelope.
    #[error("malformed event: {0}")]
    Malformed(String),

    /// A required attribute is missing or empty.
    #[error("missing required attribute `{0}`")]
    MissingAttribute(&'static str),

    #[error("unsupported specversion `{0}`")]
    UnsupportedSpecVersion(String),
}

/// The envelope is well-formed but its `data` does not match the expected shape.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("payload of `{event_type}` does not match the expected schema: {message}")]
pub struct SchemaError {
    pub event_type: String,
    pub message: String,
}

/// A notification could not be handed to the transport.
///
/// Never retried by the emitter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The receiving side answered with a non-success status.
    #[error("event rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The request could not be completed (connection, timeout, encoding).
    #[error("transport error: {0}")]
    Transport(String),

    /// The sender is not usable (e.g. internal lock poisoning).
    #[error("sender unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by a task handler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// A lifecycle notification could not be sent.
    #[error(transparent)]
    Send(#[from] SendError),

    /// The action was cancelled before completing.
    #[error("task cancelled: {0}")]
    Cancelled(String),

    /// The action failed.
    #[error("task failed: {0}")]
    Failed(String),
}

/// Registering a handler failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a handler for event type `{0}` is already registered")]
    AlreadyRegistered(String),
}

/// Outcome of a failed dispatch, surfaced to the transport as a failed request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No handler is registered for this event type.
    #[error("unhandled event type: {event_type}")]
    UnhandledType { event_type: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The handler's own error, unchanged.
    #[error(transparent)]
    Handler(#[from] HandlerError),
}
