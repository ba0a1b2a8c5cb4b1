//! Handler for `sh.keptn.event.test.triggered`.

use std::time::Duration;

use async_trait::async_trait;

use k6svc_core::ServiceConfig;
use k6svc_events::event_type::TEST_TASK_NAME;
use k6svc_events::{EventHandler, HandlerContext, HandlerError, Outcome, TestTriggeredEventData};

use crate::action::{SleepAction, TestAction, run_with_deadline};

/// The only test strategy this service runs.
pub const FUNCTIONAL_STRATEGY: &str = "functional";

/// Runs the test action for `functional` triggers.
///
/// - `functional`: started → action → finished (`succeeded/pass`, or
///   `errored/fail` when the action fails, is cancelled or times out)
/// - any other strategy: logged and skipped, nothing is sent
#[derive(Debug)]
pub struct TestTriggeredHandler<A = SleepAction> {
    action: A,
    timeout: Duration,
}

impl TestTriggeredHandler<SleepAction> {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(SleepAction::new(config.action_duration), config.action_timeout)
    }
}

impl<A: TestAction> TestTriggeredHandler<A> {
    pub fn new(action: A, timeout: Duration) -> Self {
        Self { action, timeout }
    }
}

#[async_trait]
impl<A: TestAction> EventHandler for TestTriggeredHandler<A> {
    type Payload = TestTriggeredEventData;

    fn task_name(&self) -> &'static str {
        TEST_TASK_NAME
    }

    async fn handle(
        &self,
        ctx: &HandlerContext,
        data: TestTriggeredEventData,
    ) -> Result<(), HandlerError> {
        tracing::info!(event_id = %ctx.trigger().id(), "handling test.triggered event");

        if data.test.test_strategy != FUNCTIONAL_STRATEGY {
            tracing::info!(
                strategy = %data.test.test_strategy,
                "retrieved unknown test strategy, skipping"
            );
            return Ok(());
        }

        let started = ctx.task_run(TEST_TASK_NAME).start().await?;

        match run_with_deadline(&self.action, &data, ctx.cancellation(), self.timeout).await {
            Ok(message) => {
                started.finish(Outcome::succeeded(message)).await?;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(event_id = %ctx.trigger().id(), error = %e, "test action failed");
                started.finish(Outcome::errored(e.to_string())).await?;
                Err(e.into())
            }
        }
    }
}
