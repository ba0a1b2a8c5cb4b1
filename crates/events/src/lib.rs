//! Event envelope, lifecycle notifications and dispatch.
//!
//! Transport-agnostic: inbound HTTP lives in `k6svc-api`, outbound HTTP in
//! `k6svc-infra`. Everything here works against the [`EventSender`] trait.

pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod event_type;
pub mod handler;
pub mod in_memory_sender;
pub mod notifier;
pub mod payload;
pub mod sender;

pub use dispatcher::Dispatcher;
pub use envelope::Envelope;
pub use error::{DecodeError, DispatchError, HandlerError, RegistryError, SchemaError, SendError};
pub use handler::{DynEventHandler, EventHandler, HandlerContext, TypedEventHandler};
pub use in_memory_sender::InMemoryEventSender;
pub use notifier::{NotificationEmitter, StartedTask, TaskRun, TaskState};
pub use payload::{EventData, FinishedEventData, Outcome, Status, TaskResult, TestTriggeredEventData};
pub use sender::EventSender;
