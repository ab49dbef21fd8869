//! The durable registry document.
//!
//! One registry per session, serialized as a single JSON document.
//! The in-memory copy and the durable copy must never diverge for more
//! than the duration of a single operation, so mutating operations
//! re-load from the store before validating preconditions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::{TaskRecord, TaskState};

/// A detected attempt to repeat an operation beyond the sane retry
/// ceiling, indicating a bug or runaway loop in the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolViolation {
    /// Operation name that spun past the ceiling
    pub operation: String,
    /// Human-readable error description
    pub error: String,
    /// When the violation was recorded
    pub timestamp: DateTime<Utc>,
    /// Task ids tracked by the registry at the time of the violation
    pub task_ids: Vec<String>,
}

/// One entry in the process-wide escalation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationRecord {
    pub task_id: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// The registry of task records owned by one orchestration session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRegistry {
    /// Session this registry belongs to
    pub session_id: Uuid,
    /// All task records, keyed by task id
    pub tasks: BTreeMap<String, TaskRecord>,
    /// When the document was last persisted
    pub last_updated: DateTime<Utc>,
    /// Loop-guard violations, ordered oldest first
    #[serde(default)]
    pub protocol_violations: Vec<ProtocolViolation>,
    /// Escalated tasks, ordered oldest first
    #[serde(default)]
    pub escalated_tasks: Vec<EscalationRecord>,
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRegistry {
    /// Create an empty registry with a fresh session id.
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            tasks: BTreeMap::new(),
            last_updated: Utc::now(),
            protocol_violations: Vec::new(),
            escalated_tasks: Vec::new(),
        }
    }

    pub fn get(&self, task_id: &str) -> Option<&TaskRecord> {
        self.tasks.get(task_id)
    }

    pub fn get_mut(&mut self, task_id: &str) -> Option<&mut TaskRecord> {
        self.tasks.get_mut(task_id)
    }

    pub fn insert(&mut self, record: TaskRecord) {
        self.tasks.insert(record.task_id.clone(), record);
    }

    /// Record a loop-guard violation against the current set of tasks.
    pub fn record_violation(&mut self, operation: impl Into<String>, error: impl Into<String>) {
        self.protocol_violations.push(ProtocolViolation {
            operation: operation.into(),
            error: error.into(),
            timestamp: Utc::now(),
            task_ids: self.tasks.keys().cloned().collect(),
        });
    }

    /// Record an escalation in the process-wide list.
    pub fn record_escalation(&mut self, task_id: impl Into<String>, reason: impl Into<String>) {
        self.escalated_tasks.push(EscalationRecord {
            task_id: task_id.into(),
            reason: reason.into(),
            timestamp: Utc::now(),
        });
    }

    /// Count tasks per state.
    pub fn state_counts(&self) -> BTreeMap<TaskState, usize> {
        let mut counts = BTreeMap::new();
        for record in self.tasks.values() {
            *counts.entry(record.state).or_insert(0) += 1;
        }
        counts
    }

    /// Stamp `last_updated`; called by the store on every persist.
    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

// BTreeMap keyed on TaskState needs a total order; derive from the
// serialized name so the report ordering is stable.
impl Ord for TaskState {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for TaskState {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Aggregate snapshot returned by the `report` operation.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryReport {
    pub session_id: Uuid,
    pub last_updated: DateTime<Utc>,
    pub total_tasks: usize,
    pub state_counts: BTreeMap<String, usize>,
    pub escalated_tasks: Vec<EscalationRecord>,
    pub protocol_violations: Vec<ProtocolViolation>,
}

impl RegistryReport {
    pub fn from_registry(registry: &TaskRegistry) -> Self {
        Self {
            session_id: registry.session_id,
            last_updated: registry.last_updated,
            total_tasks: registry.tasks.len(),
            state_counts: registry
                .state_counts()
                .into_iter()
                .map(|(state, count)| (state.as_str().to_string(), count))
                .collect(),
            escalated_tasks: registry.escalated_tasks.clone(),
            protocol_violations: registry.protocol_violations.clone(),
        }
    }
}
