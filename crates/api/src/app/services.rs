//! Service wiring for the HTTP shell.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use k6svc_core::ServiceConfig;
use k6svc_events::{Dispatcher, EventSender, RegistryError, SendError};
use k6svc_infra::HttpEventSender;

#[derive(Debug, Error)]
pub enum ServicesError {
    #[error("failed to build event sender: {0}")]
    Sender(#[from] SendError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Shared state of the running service.
#[derive(Debug)]
pub struct AppServices {
    dispatcher: Arc<Dispatcher>,
    shutdown: CancellationToken,
}

impl AppServices {
    /// Wire the dispatcher against an arbitrary sender (tests use the in-memory one).
    pub fn with_sender(
        config: &ServiceConfig,
        sender: Arc<dyn EventSender>,
        shutdown: CancellationToken,
    ) -> Result<Self, ServicesError> {
        let dispatcher = k6svc_tasks::build_dispatcher(config, sender)?;
        tracing::info!(handled_types = ?dispatcher.handled_types(), "dispatcher ready");

        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            shutdown,
        })
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Token cancelled when the process shuts down.
    pub fn shutdown(&self) -> &CancellationToken {
        &self.shutdown
    }
}

/// Production wiring: events go to the configured broker over HTTP.
pub fn build_services(
    config: &ServiceConfig,
    shutdown: CancellationToken,
) -> Result<AppServices, ServicesError> {
    let sender: Arc<dyn EventSender> = Arc::new(HttpEventSender::from_config(config)?);
    AppServices::with_sender(config, sender, shutdown)
}
