//! Runaway-loop detection.
//!
//! Tracks consecutive invocations of the same (operation, task id)
//! pair within the current process. A caller stuck retrying the same
//! operation past the ceiling gets refused instead of spinning forever.
//! The window is in-memory only; a different operation name resets it.

/// Rolling window over the most recent operation invocations.
#[derive(Debug)]
pub struct LoopGuard {
    ceiling: u32,
    window: Option<Window>,
}

#[derive(Debug)]
struct Window {
    operation: String,
    task_id: String,
    count: u32,
}

impl LoopGuard {
    pub fn new(ceiling: u32) -> Self {
        Self {
            ceiling,
            window: None,
        }
    }

    /// Register an invocation before it executes.
    ///
    /// Returns the consecutive count as an error once it exceeds the
    /// ceiling; the caller is expected to refuse the operation.
    pub fn register(&mut self, operation: &str, task_id: &str) -> Result<(), u32> {
        match &mut self.window {
            Some(window) if window.operation == operation && window.task_id == task_id => {
                window.count += 1;
                if window.count > self.ceiling {
                    return Err(window.count);
                }
            }
            _ => {
                self.window = Some(Window {
                    operation: operation.to_string(),
                    task_id: task_id.to_string(),
                    count: 1,
                });
            }
        }
        Ok(())
    }

    /// Forget the current window.
    pub fn reset(&mut self) {
        self.window = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trips_on_ceiling_plus_one() {
        let mut guard = LoopGuard::new(5);
        for _ in 0..5 {
            assert!(guard.register("delegate", "T1").is_ok());
        }
        assert_eq!(guard.register("delegate", "T1"), Err(6));
    }

    #[test]
    fn test_different_operation_resets_window() {
        let mut guard = LoopGuard::new(3);
        for _ in 0..3 {
            guard.register("check", "T1").unwrap();
        }
        guard.register("delegate", "T1").unwrap();
        // Window restarted; three more checks are fine again
        for _ in 0..3 {
            assert!(guard.register("check", "T1").is_ok());
        }
    }

    #[test]
    fn test_different_task_resets_window() {
        let mut guard = LoopGuard::new(2);
        guard.register("check", "T1").unwrap();
        guard.register("check", "T1").unwrap();
        guard.register("check", "T2").unwrap();
        assert!(guard.register("check", "T2").is_ok());
    }

    #[test]
    fn test_stays_tripped_until_reset() {
        let mut guard = LoopGuard::new(2);
        guard.register("check", "T1").unwrap();
        guard.register("check", "T1").unwrap();
        assert!(guard.register("check", "T1").is_err());
        assert!(guard.register("check", "T1").is_err());

        guard.reset();
        assert!(guard.register("check", "T1").is_ok());
    }
}
