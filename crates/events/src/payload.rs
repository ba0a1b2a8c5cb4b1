//! Typed `data` payloads of task events.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Fields common to every task event payload.
///
/// Copied from a trigger onto its started/finished notifications so consumers
/// can attribute them without looking the trigger up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
}

/// Whether processing of a task completed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Succeeded,
    Errored,
}

/// Verdict of a completed task. Only meaningful when the status is `Succeeded`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskResult {
    #[serde(rename = "pass")]
    Pass,
    #[serde(rename = "fail")]
    Failed,
}

/// Result of handling a trigger, reported on the finished notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: Status,
    pub result: TaskResult,
    pub message: String,
}

impl Outcome {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            status: Status::Succeeded,
            result: TaskResult::Pass,
            message: message.into(),
        }
    }

    pub fn errored(message: impl Into<String>) -> Self {
        Self {
            status: Status::Errored,
            result: TaskResult::Failed,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Succeeded && self.result == TaskResult::Pass
    }
}

/// `data` of a `*.finished` notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedEventData {
    #[serde(flatten)]
    pub event: EventData,
    pub status: Status,
    pub result: TaskResult,
    pub message: String,
}

impl FinishedEventData {
    pub fn new(event: EventData, outcome: &Outcome) -> Self {
        Self {
            event,
            status: outcome.status,
            result: outcome.result,
            message: outcome.message.clone(),
        }
    }
}

/// `data` of `sh.keptn.event.test.triggered`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestTriggeredEventData {
    #[serde(flatten)]
    pub event: EventData,
    pub test: TestDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDetails {
    /// Selects which variant of the test action runs.
    #[serde(rename = "teststrategy")]
    pub test_strategy: String,
}

/// Where the artifact under test was deployed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentDetails {
    #[serde(rename = "deploymentURIsLocal", default)]
    pub local_uris: Vec<String>,
    #[serde(rename = "deploymentURIsPublic", default)]
    pub public_uris: Vec<String>,
    #[serde(rename = "deploymentNames", default)]
    pub names: Vec<String>,
    #[serde(rename = "gitCommit", default, skip_serializing_if = "Option::is_none")]
    pub git_commit: Option<String>,
}
