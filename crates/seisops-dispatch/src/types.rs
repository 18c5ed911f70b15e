use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::{DispatchError, Result};

/// One external event notification: which event to refine and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRequest {
    /// Id used to build composite sub-run ids.
    pub event_id: String,
    /// Id passed to the origin-resolution tool.
    pub original_event_id: String,
    /// Seconds after dispatcher start, in submission order.
    pub delays: Vec<u64>,
}

impl TriggerRequest {
    /// Request whose resolution id is the event id itself.
    pub fn new(event_id: impl Into<String>, delays: Vec<u64>) -> Self {
        let event_id = event_id.into();
        Self {
            original_event_id: event_id.clone(),
            event_id,
            delays,
        }
    }
}

/// `<event_id>_<delay>`: lets the generator treat each pass as its own event.
pub fn composite_id(event_id: &str, delay: u64) -> String {
    format!("{event_id}_{delay}")
}

/// Lifecycle state of a single delayed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubRunStatus {
    /// Submitted, not yet claimed.
    Pending,
    /// Skipped: this composite id was already seen in-process or on disk.
    Deduplicated,
    /// Marker claimed; waiting for its deadline or calling external tools.
    Running,
    /// Map generation exited 0.
    Succeeded,
    /// Resolution or generation failed, or the worker hit an unexpected error.
    Failed,
}

impl SubRunStatus {
    /// Whether `self -> next` is a legal step.
    ///
    /// `Pending -> Failed` covers unexpected errors raised while claiming the
    /// durable marker, before the sub-run could start running.
    pub fn can_transition_to(self, next: SubRunStatus) -> bool {
        use SubRunStatus::*;
        matches!(
            (self, next),
            (Pending, Deduplicated)
                | (Pending, Running)
                | (Pending, Failed)
                | (Running, Succeeded)
                | (Running, Failed)
        )
    }
}

impl std::fmt::Display for SubRunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SubRunStatus::Pending => "pending",
            SubRunStatus::Deduplicated => "deduplicated",
            SubRunStatus::Running => "running",
            SubRunStatus::Succeeded => "succeeded",
            SubRunStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for SubRunStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubRunStatus::Pending),
            "deduplicated" => Ok(SubRunStatus::Deduplicated),
            "running" => Ok(SubRunStatus::Running),
            "succeeded" => Ok(SubRunStatus::Succeeded),
            "failed" => Ok(SubRunStatus::Failed),
            other => Err(format!("unknown sub-run status: {other}")),
        }
    }
}

/// Which external tool a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Resolver,
    Generator,
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tool::Resolver => write!(f, "origin resolution"),
            Tool::Generator => write!(f, "ShakeMap"),
        }
    }
}

/// Why a sub-run ended in [`SubRunStatus::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The resolution output had no preferred-origin field.
    ResolutionNotFound,
    /// An external tool exited non-zero.
    ToolFailed {
        tool: Tool,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    /// Spawn failure, marker I/O, timeout or a panicked worker.
    Unexpected { message: String },
}

/// A scheduled pass, owned by the worker that executes it.
#[derive(Debug, Clone)]
pub struct SubRun {
    pub composite_id: String,
    pub delay: u64,
    /// Dispatcher start + delay.
    pub deadline: Instant,
    pub status: SubRunStatus,
    pub origin_id: Option<String>,
    pub failure: Option<FailureReason>,
}

impl SubRun {
    /// Fails when `started + delay` is past what the clock can represent.
    pub fn new(event_id: &str, delay: u64, started: Instant) -> Result<Self> {
        let deadline = started
            .checked_add(Duration::from_secs(delay))
            .ok_or(DispatchError::DeadlineOverflow { delay })?;
        Ok(Self {
            composite_id: composite_id(event_id, delay),
            delay,
            deadline,
            status: SubRunStatus::Pending,
            origin_id: None,
            failure: None,
        })
    }

    /// Move to `next`, ignoring illegal steps so a terminal state is never
    /// overwritten.
    pub fn advance(&mut self, next: SubRunStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }

    pub fn fail(&mut self, reason: FailureReason) {
        if self.advance(SubRunStatus::Failed) {
            self.failure = Some(reason);
        }
    }

    pub fn outcome(&self) -> SubRunOutcome {
        SubRunOutcome {
            delay: self.delay,
            composite_id: self.composite_id.clone(),
            status: self.status,
            origin_id: self.origin_id.clone(),
            failure: self.failure.clone(),
        }
    }
}

/// Terminal record of one sub-run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRunOutcome {
    pub delay: u64,
    pub composite_id: String,
    pub status: SubRunStatus,
    pub origin_id: Option<String>,
    pub failure: Option<FailureReason>,
}

impl SubRunOutcome {
    /// Failed outcome for a sub-run that never got a usable [`SubRun`].
    pub fn unexpected(event_id: &str, delay: u64, message: impl Into<String>) -> Self {
        Self {
            delay,
            composite_id: composite_id(event_id, delay),
            status: SubRunStatus::Failed,
            origin_id: None,
            failure: Some(FailureReason::Unexpected {
                message: message.into(),
            }),
        }
    }
}

/// Everything one `dispatch` call did, in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub event_id: String,
    pub outcomes: Vec<SubRunOutcome>,
}

impl DispatchReport {
    pub fn count(&self, status: SubRunStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn outcome_for(&self, delay: u64) -> Option<&SubRunOutcome> {
        self.outcomes.iter().find(|o| o.delay == delay)
    }
}
