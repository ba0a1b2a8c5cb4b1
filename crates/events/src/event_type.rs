//! Event type naming.
//!
//! Task events follow `sh.keptn.event.<task>.<phase>`, e.g.
//! `sh.keptn.event.test.triggered`. Types are derived, never hand-written, so
//! the started/finished types always pair with their trigger.

/// Prefix shared by every task event type.
pub const EVENT_TYPE_PREFIX: &str = "sh.keptn.event";

/// Task name of the test task.
pub const TEST_TASK_NAME: &str = "test";

/// Phase of a task lifecycle, as encoded in the last segment of the type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TaskPhase {
    Triggered,
    Started,
    Finished,
}

impl TaskPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Triggered => "triggered",
            Self::Started => "started",
            Self::Finished => "finished",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "triggered" => Some(Self::Triggered),
            "started" => Some(Self::Started),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }
}

pub fn event_type(task_name: &str, phase: TaskPhase) -> String {
    format!("{EVENT_TYPE_PREFIX}.{task_name}.{}", phase.as_str())
}

pub fn triggered_event_type(task_name: &str) -> String {
    event_type(task_name, TaskPhase::Triggered)
}

pub fn started_event_type(task_name: &str) -> String {
    event_type(task_name, TaskPhase::Started)
}

pub fn finished_event_type(task_name: &str) -> String {
    event_type(task_name, TaskPhase::Finished)
}

/// Split a task event type into `(task_name, phase)`.
///
/// Returns `None` for types outside the task event namespace.
pub fn parse_event_type(event_type: &str) -> Option<(&str, TaskPhase)> {
    let rest = event_type.strip_prefix(EVENT_TYPE_PREFIX)?.strip_prefix('.')?;
    let (task, phase) = rest.rsplit_once('.')?;
    if task.is_empty() {
        return None;
    }
    Some((task, TaskPhase::parse(phase)?))
}
