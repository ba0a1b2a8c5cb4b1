//! `k6svc-core`: shared building blocks for the worker.
//!
//! Identifiers, service configuration and the small error model used by the
//! event crates. No IO besides reading environment variables.

pub mod config;
pub mod error;
pub mod id;

pub use config::{ConfigError, Environment, ServiceConfig, SERVICE_NAME};
pub use error::CoreError;
pub use id::{EventId, KeptnContext};
