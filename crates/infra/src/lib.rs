//! Infrastructure layer: outbound transports and external services.

pub mod event_sender;

pub use event_sender::HttpEventSender;
