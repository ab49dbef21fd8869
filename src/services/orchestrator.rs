//! The task state orchestrator.
//!
//! Single source of truth for task progress. Every public operation:
//!
//! 1. registers with the loop guard (runaway callers are refused),
//! 2. takes the in-process operation lock,
//! 3. acquires the store's exclusive lock and re-loads the latest
//!    durable registry before validating preconditions,
//! 4. mutates, persists atomically, and only then returns.
//!
//! Executor calls are bounded by a timeout; a wedged executor is a
//! recorded failure, never a hang.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::domain::errors::{OrchestratorError, OrchestratorResult};
use crate::domain::models::{
    EventKind, LifecycleEvent, OrchestratorConfig, RegistryReport, TaskPriority, TaskRecord,
    TaskRegistry, TaskState,
};
use crate::domain::ports::{DelegationRequest, RegistryStore, ResponseReport, TaskExecutor};

use super::loop_guard::LoopGuard;
use super::polling;

/// Result of a delegation attempt that did not error.
#[derive(Debug)]
pub enum DelegationOutcome {
    /// Executor accepted the hand-off
    Delegated(TaskRecord),
    /// Attempt budget was already spent; task escalated instead
    Escalated(TaskRecord),
}

/// Result of a response check that did not error.
#[derive(Debug)]
pub enum CheckOutcome {
    /// Backoff gate not yet open; executor was not called
    Waiting {
        record: TaskRecord,
        until: DateTime<Utc>,
    },
    /// Executor reported a state-appropriate signal
    Advanced { record: TaskRecord, from: TaskState },
    /// Polling suspended until near the task's ETA
    Suspended {
        record: TaskRecord,
        until: DateTime<Utc>,
    },
    /// Executor was polled but had nothing new
    StillWaiting {
        record: TaskRecord,
        until: DateTime<Utc>,
    },
    /// Check budget exhausted; task escalated
    Escalated(TaskRecord),
}

/// Persistent task-delegation state machine.
pub struct Orchestrator {
    store: Arc<dyn RegistryStore>,
    executor: Arc<dyn TaskExecutor>,
    config: OrchestratorConfig,
    /// Serializes operations within this process and carries the
    /// loop-guard window.
    ops: Mutex<LoopGuard>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn RegistryStore>,
        executor: Arc<dyn TaskExecutor>,
        config: OrchestratorConfig,
    ) -> Self {
        let ceiling = config.max_operations_per_cycle;
        Self {
            store,
            executor,
            config,
            ops: Mutex::new(LoopGuard::new(ceiling)),
        }
    }

    /// Create a task record in the `Defined` state.
    pub async fn define_task(
        &self,
        task_id: &str,
        agent: &str,
        task_file: &str,
        priority: TaskPriority,
        estimated_completion: Option<DateTime<Utc>>,
    ) -> OrchestratorResult<TaskRecord> {
        let mut ops = self.ops.lock().await;
        self.register_or_refuse(&mut ops, "define", task_id).await?;

        if !tokio::fs::try_exists(task_file).await.unwrap_or(false) {
            return Err(OrchestratorError::InvalidReference(task_file.to_string()));
        }

        let _lock = self.store.lock_exclusive().await?;
        let mut registry = self.store.load().await?;

        if let Some(existing) = registry.get(task_id) {
            if existing.state != TaskState::Undefined {
                return Err(OrchestratorError::DuplicateTask(task_id.to_string()));
            }
        }

        let mut record = TaskRecord::new(task_id, agent, task_file, priority);
        if let Some(eta) = estimated_completion {
            record = record.with_estimated_completion(eta);
        }
        registry.insert(record.clone());
        self.store.save(&mut registry).await?;

        info!(task_id, agent, "task defined");
        Ok(record)
    }

    /// Hand a `Defined` task to the executor.
    ///
    /// Executor failure or timeout increments the attempt counter,
    /// persists, and returns the typed failure; the task stays
    /// `Defined` so a later call can retry. An exhausted attempt budget
    /// escalates without touching the executor.
    pub async fn delegate_task(&self, task_id: &str) -> OrchestratorResult<DelegationOutcome> {
        let mut ops = self.ops.lock().await;
        self.register_or_refuse(&mut ops, "delegate", task_id).await?;

        let _lock = self.store.lock_exclusive().await?;
        let mut registry = self.store.load().await?;
        let mut record = Self::fetch(&registry, task_id)?;

        if record.state != TaskState::Defined {
            return Err(Self::invalid_transition(&record, "delegate"));
        }

        if record.delegation_attempts >= self.config.max_delegation_attempts {
            let reason = format!(
                "max delegation attempts ({}) exceeded",
                self.config.max_delegation_attempts
            );
            warn!(task_id, %reason, "escalating instead of delegating");
            let record = Self::escalate_record(&mut registry, record, &reason);
            self.store.save(&mut registry).await?;
            return Ok(DelegationOutcome::Escalated(record));
        }

        let call = timeout(
            self.config.executor_timeout(),
            self.executor.delegate(DelegationRequest {
                task_id,
                agent: &record.agent,
                task_file: &record.task_file,
            }),
        )
        .await;

        record.delegation_attempts += 1;
        record.last_attempt_at = Some(Utc::now());

        let failure = match call {
            Ok(Ok(reply)) if reply.success => {
                record
                    .transition_to(TaskState::Delegated)
                    .map_err(|_| Self::invalid_transition(&record, "delegate"))?;
                record.record_event(LifecycleEvent::with_detail(
                    EventKind::DelegationSent,
                    reply.detail,
                ));
                registry.insert(record.clone());
                self.store.save(&mut registry).await?;
                info!(
                    task_id,
                    attempts = record.delegation_attempts,
                    "task delegated"
                );
                return Ok(DelegationOutcome::Delegated(record));
            }
            Ok(Ok(reply)) => OrchestratorError::ExecutorFailure {
                task_id: task_id.to_string(),
                detail: format!("executor declined delegation: {}", reply.detail),
            },
            Ok(Err(err)) => OrchestratorError::ExecutorFailure {
                task_id: task_id.to_string(),
                detail: err.to_string(),
            },
            Err(_) => OrchestratorError::ExecutorTimeout {
                task_id: task_id.to_string(),
                timeout_secs: self.config.executor_timeout_secs,
            },
        };

        record.record_event(LifecycleEvent::with_detail(
            EventKind::DelegationFailed,
            failure.to_string(),
        ));
        registry.insert(record.clone());
        self.store.save(&mut registry).await?;
        warn!(
            task_id,
            attempts = record.delegation_attempts,
            error = %failure,
            "delegation attempt failed"
        );
        Err(failure)
    }

    /// Poll the executor for progress on an in-flight task.
    pub async fn check_response(&self, task_id: &str) -> OrchestratorResult<CheckOutcome> {
        let mut ops = self.ops.lock().await;
        self.register_or_refuse(&mut ops, "check", task_id).await?;

        let _lock = self.store.lock_exclusive().await?;
        let mut registry = self.store.load().await?;
        let mut record = Self::fetch(&registry, task_id)?;

        if !record.state.is_awaiting_response() {
            return Err(Self::invalid_transition(&record, "check"));
        }

        let now = Utc::now();

        // First check after a transition only arms the backoff gate.
        let Some(gate) = record.next_check_at else {
            let until = now + ChronoDuration::seconds(self.config.initial_check_wait_secs as i64);
            record.next_check_at = Some(until);
            record.record_event(LifecycleEvent::with_detail(
                EventKind::CheckWaiting,
                format!("initial wait until {}", until.to_rfc3339()),
            ));
            registry.insert(record.clone());
            self.store.save(&mut registry).await?;
            return Ok(CheckOutcome::Waiting { record, until });
        };

        if now < gate {
            return Ok(CheckOutcome::Waiting {
                record,
                until: gate,
            });
        }

        record.check_attempts += 1;

        if record.check_attempts > self.config.max_check_attempts {
            let reason = format!("no response after {} checks", self.config.max_check_attempts);
            warn!(task_id, %reason, "check budget exhausted");
            let record = Self::escalate_record(&mut registry, record, &reason);
            self.store.save(&mut registry).await?;
            return Ok(CheckOutcome::Escalated(record));
        }

        // ETA refinement: a demonstrably alive agent with a future ETA
        // does not need to be polled yet. The attempt above was still
        // counted, so the escalation net is intact.
        if let Some(until) = polling::eta_suspension(&self.config, &record, now) {
            record.next_check_at = Some(until);
            registry.insert(record.clone());
            self.store.save(&mut registry).await?;
            info!(task_id, resume_at = %until.to_rfc3339(), "polling suspended until near ETA");
            return Ok(CheckOutcome::Suspended { record, until });
        }

        let call = timeout(
            self.config.executor_timeout(),
            self.executor.check_response(task_id),
        )
        .await;

        let wait_secs = polling::compute_wait_secs(&self.config, record.check_attempts);
        let until = now + ChronoDuration::seconds(wait_secs as i64);

        match call {
            Ok(Ok(report)) => {
                if let Some(target) = Self::advance_target(record.state, &report) {
                    let from = record.state;
                    record
                        .transition_to(target)
                        .map_err(|_| Self::invalid_transition(&record, "check"))?;
                    record.last_progress_at = Some(now);
                    record.record_event(LifecycleEvent::with_detail(
                        Self::event_for(target),
                        report.raw_output,
                    ));
                    registry.insert(record.clone());
                    self.store.save(&mut registry).await?;
                    info!(task_id, from = from.as_str(), to = target.as_str(), "task advanced");
                    return Ok(CheckOutcome::Advanced { record, from });
                }

                record.next_check_at = Some(until);
                registry.insert(record.clone());
                self.store.save(&mut registry).await?;
                Ok(CheckOutcome::StillWaiting { record, until })
            }
            Ok(Err(err)) => {
                self.record_check_failure(&mut registry, &mut record, until, &err.to_string())
                    .await?;
                Err(OrchestratorError::ExecutorFailure {
                    task_id: task_id.to_string(),
                    detail: err.to_string(),
                })
            }
            Err(_) => {
                let detail = format!(
                    "check timed out after {}s",
                    self.config.executor_timeout_secs
                );
                self.record_check_failure(&mut registry, &mut record, until, &detail)
                    .await?;
                Err(OrchestratorError::ExecutorTimeout {
                    task_id: task_id.to_string(),
                    timeout_secs: self.config.executor_timeout_secs,
                })
            }
        }
    }

    /// Unconditionally move a task to `Escalated`.
    ///
    /// Idempotent: an already-escalated task only gains an audit entry.
    pub async fn escalate(&self, task_id: &str, reason: &str) -> OrchestratorResult<TaskRecord> {
        let mut ops = self.ops.lock().await;
        self.register_or_refuse(&mut ops, "escalate", task_id).await?;

        let _lock = self.store.lock_exclusive().await?;
        let mut registry = self.store.load().await?;
        let mut record = Self::fetch(&registry, task_id)?;

        if record.state == TaskState::Escalated {
            record.record_event(LifecycleEvent::with_detail(EventKind::Escalated, reason));
            registry.insert(record.clone());
            self.store.save(&mut registry).await?;
            return Ok(record);
        }

        error!(task_id, reason, "task escalated");
        let record = Self::escalate_record(&mut registry, record, reason);
        self.store.save(&mut registry).await?;
        Ok(record)
    }

    /// Operator override: force a task into an arbitrary state.
    ///
    /// The only path that bypasses the transition table. Counters and
    /// the escalation reason are cleared so the task can make progress
    /// again from the chosen state.
    pub async fn reset_task(
        &self,
        task_id: &str,
        to_state: TaskState,
    ) -> OrchestratorResult<TaskRecord> {
        let mut ops = self.ops.lock().await;
        self.register_or_refuse(&mut ops, "reset", task_id).await?;

        let _lock = self.store.lock_exclusive().await?;
        let mut registry = self.store.load().await?;
        let mut record = Self::fetch(&registry, task_id)?;

        let from = record.state;
        record.override_state(to_state);
        record.delegation_attempts = 0;
        record.last_attempt_at = None;
        record.record_event(LifecycleEvent::with_detail(
            EventKind::ManualReset,
            format!("{} -> {}", from.as_str(), to_state.as_str()),
        ));
        registry.insert(record.clone());
        self.store.save(&mut registry).await?;

        warn!(task_id, from = from.as_str(), to = to_state.as_str(), "manual reset");
        Ok(record)
    }

    /// Operator override: mark a task `Completed` regardless of state.
    pub async fn force_complete(
        &self,
        task_id: &str,
        reason: &str,
    ) -> OrchestratorResult<TaskRecord> {
        let mut ops = self.ops.lock().await;
        self.register_or_refuse(&mut ops, "force_complete", task_id).await?;

        let _lock = self.store.lock_exclusive().await?;
        let mut registry = self.store.load().await?;
        let mut record = Self::fetch(&registry, task_id)?;

        let from = record.state;
        record.override_state(TaskState::Completed);
        record.record_event(LifecycleEvent::with_detail(EventKind::ForceCompleted, reason));
        registry.insert(record.clone());
        self.store.save(&mut registry).await?;

        warn!(task_id, from = from.as_str(), reason, "force-completed");
        Ok(record)
    }

    /// Snapshot one task, or every task when no id is given.
    pub async fn status(&self, task_id: Option<&str>) -> OrchestratorResult<Vec<TaskRecord>> {
        let registry = self.store.load().await?;
        match task_id {
            Some(id) => {
                let record = Self::fetch(&registry, id)?;
                Ok(vec![record])
            }
            None => Ok(registry.tasks.values().cloned().collect()),
        }
    }

    /// Aggregate report over the whole registry.
    pub async fn report(&self) -> OrchestratorResult<RegistryReport> {
        let registry = self.store.load().await?;
        Ok(RegistryReport::from_registry(&registry))
    }

    /// Drop all recorded protocol violations.
    pub async fn clear_violations(&self) -> OrchestratorResult<usize> {
        let mut ops = self.ops.lock().await;
        ops.reset();

        let _lock = self.store.lock_exclusive().await?;
        let mut registry = self.store.load().await?;
        let cleared = registry.protocol_violations.len();
        registry.protocol_violations.clear();
        self.store.save(&mut registry).await?;
        Ok(cleared)
    }

    /// Consult the loop guard; on refusal, record the violation
    /// durably (best effort) and raise.
    async fn register_or_refuse(
        &self,
        ops: &mut LoopGuard,
        operation: &str,
        task_id: &str,
    ) -> OrchestratorResult<()> {
        let Err(count) = ops.register(operation, task_id) else {
            return Ok(());
        };

        let violation = OrchestratorError::ProtocolViolation {
            operation: operation.to_string(),
            task_id: task_id.to_string(),
            count,
        };
        error!(operation, task_id, count, "loop guard tripped");

        // The violation must be raised even if recording it fails; the
        // whole point is to stop the caller's loop.
        match self.store.lock_exclusive().await {
            Ok(_guard) => match self.store.load().await {
                Ok(mut registry) => {
                    registry.record_violation(operation, violation.to_string());
                    if let Err(err) = self.store.save(&mut registry).await {
                        warn!(error = %err, "failed to persist protocol violation");
                    }
                }
                Err(err) => warn!(error = %err, "failed to load registry for violation record"),
            },
            Err(err) => warn!(error = %err, "failed to lock store for violation record"),
        }

        Err(violation)
    }

    async fn record_check_failure(
        &self,
        registry: &mut TaskRegistry,
        record: &mut TaskRecord,
        until: DateTime<Utc>,
        detail: &str,
    ) -> OrchestratorResult<()> {
        record.next_check_at = Some(until);
        record.record_event(LifecycleEvent::with_detail(EventKind::CheckFailed, detail));
        registry.insert(record.clone());
        self.store.save(registry).await?;
        warn!(
            task_id = %record.task_id,
            attempts = record.check_attempts,
            detail,
            "response check failed"
        );
        Ok(())
    }

    fn fetch(registry: &TaskRegistry, task_id: &str) -> OrchestratorResult<TaskRecord> {
        registry
            .get(task_id)
            .cloned()
            .ok_or_else(|| OrchestratorError::TaskNotFound(task_id.to_string()))
    }

    fn invalid_transition(record: &TaskRecord, operation: &str) -> OrchestratorError {
        OrchestratorError::InvalidTransition {
            task_id: record.task_id.clone(),
            from: record.state.as_str().to_string(),
            operation: operation.to_string(),
        }
    }

    /// Escalate a record and mirror it into the process-wide list.
    fn escalate_record(
        registry: &mut TaskRegistry,
        mut record: TaskRecord,
        reason: &str,
    ) -> TaskRecord {
        record.override_state(TaskState::Escalated);
        record.escalation_reason = Some(reason.to_string());
        record.record_event(LifecycleEvent::with_detail(EventKind::Escalated, reason));
        registry.record_escalation(record.task_id.clone(), reason);
        registry.insert(record.clone());
        record
    }

    /// Furthest state the report's signals justify from `state`, or
    /// None when the report carries nothing appropriate.
    fn advance_target(state: TaskState, report: &ResponseReport) -> Option<TaskState> {
        if report.completed {
            return Some(TaskState::Completed);
        }
        if report.in_progress
            && matches!(state, TaskState::Delegated | TaskState::Accepted)
        {
            return Some(TaskState::InProgress);
        }
        if report.accepted && state == TaskState::Delegated {
            return Some(TaskState::Accepted);
        }
        None
    }

    fn event_for(target: TaskState) -> EventKind {
        match target {
            TaskState::Accepted => EventKind::Accepted,
            TaskState::Completed => EventKind::Completed,
            _ => EventKind::ProgressReported,
        }
    }
}
