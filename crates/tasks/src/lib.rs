//! Task handlers registered with the dispatcher.

pub mod action;
pub mod test_triggered;

pub use action::{ActionError, SleepAction, TestAction, run_with_deadline};
pub use test_triggered::{FUNCTIONAL_STRATEGY, TestTriggeredHandler};

use std::sync::Arc;

use k6svc_core::ServiceConfig;
use k6svc_events::{Dispatcher, EventSender, NotificationEmitter, RegistryError};

/// Dispatcher with every task handler of this service registered.
pub fn build_dispatcher(
    config: &ServiceConfig,
    sender: Arc<dyn EventSender>,
) -> Result<Dispatcher, RegistryError> {
    Dispatcher::new(NotificationEmitter::from_config(sender, config))
        .with_handler(TestTriggeredHandler::from_config(config))
}
