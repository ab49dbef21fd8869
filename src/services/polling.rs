//! Adaptive check scheduling.
//!
//! The wait between unproductive response checks grows geometrically up
//! to a ceiling. When a task carries an estimated completion time and
//! its agent has been heard from recently, active polling can be
//! suspended until shortly before the ETA instead.

use chrono::{DateTime, Duration as ChronoDuration, Utc};

use crate::domain::models::{OrchestratorConfig, TaskRecord};

/// Seconds to wait after `check_attempts` unproductive checks:
/// `min(initial * factor^attempts, max)`.
pub fn compute_wait_secs(config: &OrchestratorConfig, check_attempts: u32) -> u64 {
    let factor = config.backoff_factor.max(1.0);
    let wait = (config.initial_check_wait_secs as f64) * factor.powi(check_attempts as i32);
    if wait.is_finite() {
        (wait as u64).min(config.max_check_wait_secs)
    } else {
        config.max_check_wait_secs
    }
}

/// Decide whether active polling should be suspended until near the
/// task's estimated completion.
///
/// Suspension applies only when all of these hold:
/// - the record carries an ETA and it (minus the safety buffer) is
///   still in the future;
/// - the agent has reported progress within the silence threshold, so
///   we have evidence it is alive.
///
/// Returns the instant at which checking should resume. This is purely
/// an optimization; the max-attempts escalation net is untouched
/// because the attempt that triggered this call was already counted.
pub fn eta_suspension(
    config: &OrchestratorConfig,
    record: &TaskRecord,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let eta = record.estimated_completion?;
    let last_progress = record.last_progress_at?;

    let silence = now.signed_duration_since(last_progress);
    if silence > ChronoDuration::seconds(config.progress_silence_threshold_secs as i64) {
        return None;
    }

    let resume_at = eta - ChronoDuration::seconds(config.eta_safety_buffer_secs as i64);
    if resume_at <= now {
        return None;
    }

    Some(resume_at)
}
