//! Task record domain model.
//!
//! A task record tracks one delegated unit of work through a strict
//! linear state machine. Records are never deleted; closure is the
//! terminal state `Completed` or `Escalated`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of a task in the delegation lifecycle.
///
/// The happy path is linear and monotonic:
/// `Undefined -> Defined -> Delegated -> Accepted -> InProgress -> Completed`.
/// `Error` and `Escalated` are absorbing side states reachable from any
/// in-flight state; `Escalated` requires a manual reset to continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Placeholder for a task that has not been defined yet
    Undefined,
    /// Task definition recorded, not yet handed to an executor
    Defined,
    /// Task handed to an executor, awaiting acknowledgement
    Delegated,
    /// Executor acknowledged the task
    Accepted,
    /// Executor reported active work
    InProgress,
    /// Executor reported completion
    Completed,
    /// Task failed outside the normal retry path
    Error,
    /// Task gave up and requires operator intervention
    Escalated,
}

impl Default for TaskState {
    fn default() -> Self {
        Self::Undefined
    }
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Defined => "defined",
            Self::Delegated => "delegated",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Escalated => "escalated",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "undefined" => Some(Self::Undefined),
            "defined" => Some(Self::Defined),
            "delegated" => Some(Self::Delegated),
            "accepted" => Some(Self::Accepted),
            "in_progress" | "in-progress" => Some(Self::InProgress),
            "completed" | "complete" => Some(Self::Completed),
            "error" => Some(Self::Error),
            "escalated" => Some(Self::Escalated),
            _ => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Escalated)
    }

    /// States from which `check` polls the executor.
    pub fn is_awaiting_response(&self) -> bool {
        matches!(self, Self::Delegated | Self::Accepted | Self::InProgress)
    }

    /// Valid automatic transitions from this state.
    ///
    /// Operator overrides (`reset`, `force-complete`) and `escalate`
    /// deliberately bypass this table.
    pub fn valid_transitions(&self) -> Vec<TaskState> {
        match self {
            Self::Undefined => vec![Self::Defined],
            Self::Defined => vec![Self::Delegated, Self::Error, Self::Escalated],
            Self::Delegated => vec![
                Self::Accepted,
                Self::InProgress,
                Self::Completed,
                Self::Error,
                Self::Escalated,
            ],
            Self::Accepted => vec![
                Self::InProgress,
                Self::Completed,
                Self::Error,
                Self::Escalated,
            ],
            Self::InProgress => vec![Self::Completed, Self::Error, Self::Escalated],
            Self::Completed | Self::Error | Self::Escalated => vec![],
        }
    }

    pub fn can_transition_to(&self, new_state: Self) -> bool {
        self.valid_transitions().contains(&new_state)
    }
}

/// Priority classification supplied by the caller.
///
/// The orchestrator records but does not interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Medium
    }
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "normal" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Kind tag for a lifecycle audit event.
///
/// Operator overrides carry distinct kinds so manual interventions are
/// always distinguishable from automatic transitions in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Defined,
    DelegationSent,
    DelegationFailed,
    CheckWaiting,
    Accepted,
    ProgressReported,
    Completed,
    CheckFailed,
    Escalated,
    ManualReset,
    ForceCompleted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Defined => "defined",
            Self::DelegationSent => "delegation_sent",
            Self::DelegationFailed => "delegation_failed",
            Self::CheckWaiting => "check_waiting",
            Self::Accepted => "accepted",
            Self::ProgressReported => "progress_reported",
            Self::Completed => "completed",
            Self::CheckFailed => "check_failed",
            Self::Escalated => "escalated",
            Self::ManualReset => "manual_reset",
            Self::ForceCompleted => "force_completed",
        }
    }
}

/// One entry in a task's append-only audit log.
///
/// Audit only; control flow never reads these back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl LifecycleEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            detail: None,
        }
    }

    pub fn with_detail(kind: EventKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            detail: Some(detail.into()),
        }
    }
}

/// A delegated unit of work tracked by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Caller-assigned unique identifier, immutable once created
    pub task_id: String,
    /// Current lifecycle state
    pub state: TaskState,
    /// Identifier of the executor/worker assigned to this task
    pub agent: String,
    /// Opaque reference to the task's specification payload
    pub task_file: String,
    /// Caller-supplied classification, not interpreted by the core
    pub priority: TaskPriority,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// Delegation attempts so far (success or failure)
    pub delegation_attempts: u32,
    /// Timestamp of the most recent delegation attempt
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Response polls since the last forward transition
    pub check_attempts: u32,
    /// Polling should not occur before this instant
    pub next_check_at: Option<DateTime<Utc>>,
    /// Optional estimated completion time, drives polling suspension
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<DateTime<Utc>>,
    /// When the executor last reported a fresh signal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_progress_at: Option<DateTime<Utc>>,
    /// Set only when the task becomes Escalated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_reason: Option<String>,
    /// Append-only lifecycle audit log
    #[serde(default)]
    pub messages: Vec<LifecycleEvent>,
}

impl TaskRecord {
    /// Create a record in the `Defined` state.
    pub fn new(
        task_id: impl Into<String>,
        agent: impl Into<String>,
        task_file: impl Into<String>,
        priority: TaskPriority,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            state: TaskState::Defined,
            agent: agent.into(),
            task_file: task_file.into(),
            priority,
            created_at: Utc::now(),
            delegation_attempts: 0,
            last_attempt_at: None,
            check_attempts: 0,
            next_check_at: None,
            estimated_completion: None,
            last_progress_at: None,
            escalation_reason: None,
            messages: vec![LifecycleEvent::new(EventKind::Defined)],
        }
    }

    /// Set the estimated completion time.
    pub fn with_estimated_completion(mut self, eta: DateTime<Utc>) -> Self {
        self.estimated_completion = Some(eta);
        self
    }

    /// Check if a transition along the validated table is permitted.
    pub fn can_transition_to(&self, new_state: TaskState) -> bool {
        self.state.can_transition_to(new_state)
    }

    /// Advance along the validated transition table.
    ///
    /// Forward transitions reset the check counter and clear the backoff
    /// gate so polling of the new state starts fresh.
    pub fn transition_to(&mut self, new_state: TaskState) -> Result<(), String> {
        if !self.can_transition_to(new_state) {
            return Err(format!(
                "cannot transition from {} to {}",
                self.state.as_str(),
                new_state.as_str()
            ));
        }
        self.state = new_state;
        self.check_attempts = 0;
        self.next_check_at = None;
        Ok(())
    }

    /// Operator override: set the state without consulting the table.
    ///
    /// The only callers are `reset` and `force-complete`, which append
    /// their own distinct audit events.
    pub fn override_state(&mut self, new_state: TaskState) {
        self.state = new_state;
        self.check_attempts = 0;
        self.next_check_at = None;
        if new_state != TaskState::Escalated {
            self.escalation_reason = None;
        }
    }

    /// Append an audit event.
    pub fn record_event(&mut self, event: LifecycleEvent) {
        self.messages.push(event);
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_creation() {
        let record = TaskRecord::new("T1", "agent-x", "/tmp/task.md", TaskPriority::High);
        assert_eq!(record.task_id, "T1");
        assert_eq!(record.state, TaskState::Defined);
        assert_eq!(record.delegation_attempts, 0);
        assert_eq!(record.messages.len(), 1);
        assert_eq!(record.messages[0].kind, EventKind::Defined);
    }

    #[test]
    fn test_linear_transitions() {
        let mut record = TaskRecord::new("T1", "agent-x", "/tmp/task.md", TaskPriority::Medium);

        record.transition_to(TaskState::Delegated).unwrap();
        record.transition_to(TaskState::Accepted).unwrap();
        record.transition_to(TaskState::InProgress).unwrap();
        record.transition_to(TaskState::Completed).unwrap();
        assert!(record.is_terminal());
    }

    #[test]
    fn test_no_backwards_transitions() {
        let mut record = TaskRecord::new("T1", "agent-x", "/tmp/task.md", TaskPriority::Medium);
        record.transition_to(TaskState::Delegated).unwrap();

        // Cannot go back to Defined through the validated path
        assert!(record.transition_to(TaskState::Defined).is_err());
        assert_eq!(record.state, TaskState::Delegated);
    }

    #[test]
    fn test_delegated_may_jump_to_in_progress() {
        // An executor may report progress without a separate acceptance signal
        let mut record = TaskRecord::new("T1", "agent-x", "/tmp/task.md", TaskPriority::Medium);
        record.transition_to(TaskState::Delegated).unwrap();
        record.transition_to(TaskState::InProgress).unwrap();
        assert_eq!(record.state, TaskState::InProgress);
    }

    #[test]
    fn test_forward_transition_resets_check_state() {
        let mut record = TaskRecord::new("T1", "agent-x", "/tmp/task.md", TaskPriority::Medium);
        record.transition_to(TaskState::Delegated).unwrap();
        record.check_attempts = 4;
        record.next_check_at = Some(Utc::now());

        record.transition_to(TaskState::Accepted).unwrap();
        assert_eq!(record.check_attempts, 0);
        assert!(record.next_check_at.is_none());
    }

    #[test]
    fn test_terminal_states_absorb() {
        for terminal in [TaskState::Completed, TaskState::Error, TaskState::Escalated] {
            assert!(terminal.valid_transitions().is_empty());
            assert!(terminal.is_terminal());
        }
    }

    #[test]
    fn test_override_clears_escalation() {
        let mut record = TaskRecord::new("T1", "agent-x", "/tmp/task.md", TaskPriority::Medium);
        record.state = TaskState::Escalated;
        record.escalation_reason = Some("stuck".to_string());

        record.override_state(TaskState::Defined);
        assert_eq!(record.state, TaskState::Defined);
        assert!(record.escalation_reason.is_none());
    }

    #[test]
    fn test_state_string_round_trip() {
        for state in [
            TaskState::Undefined,
            TaskState::Defined,
            TaskState::Delegated,
            TaskState::Accepted,
            TaskState::InProgress,
            TaskState::Completed,
            TaskState::Error,
            TaskState::Escalated,
        ] {
            assert_eq!(TaskState::from_str(state.as_str()), Some(state));
        }
        assert_eq!(TaskState::from_str("bogus"), None);
    }
}
