//! Advisory lock file with bounded retry.
//!
//! The lock is a sidecar file created with `O_EXCL` semantics so only
//! one process can hold it. Acquisition never blocks indefinitely: a
//! handful of exponentially backed-off attempts, then `StoreError::Busy`.
//! Locks abandoned by dead or wedged processes are broken after a
//! liveness check.

use std::path::{Path, PathBuf};
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;
use chrono::{DateTime, Utc};
use nix::sys::signal::kill;
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::domain::errors::StoreError;
use crate::domain::models::StoreConfig;
use crate::domain::ports::StoreGuard;

/// Contents of the lock file, for diagnostics and staleness checks.
#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    pid: i32,
    acquired_at: DateTime<Utc>,
}

/// Held lock; dropping it releases the file.
#[derive(Debug)]
pub struct FileLockGuard {
    path: PathBuf,
}

impl StoreGuard for FileLockGuard {}

impl Drop for FileLockGuard {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %err, "failed to release store lock");
            }
        }
    }
}

/// Acquire the exclusive store lock at `path`.
pub async fn acquire(path: &Path, config: &StoreConfig) -> Result<FileLockGuard, StoreError> {
    let mut backoff = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(config.lock_retry_initial_ms))
        .with_multiplier(2.0)
        .with_max_elapsed_time(None)
        .build();

    for attempt in 1..=config.lock_retry_attempts {
        match try_create(path).await {
            Ok(guard) => return Ok(guard),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                if break_if_stale(path, config.lock_stale_secs).await {
                    // The break freed the path; claim it right away
                    // instead of spending another attempt on it.
                    match try_create(path).await {
                        Ok(guard) => return Ok(guard),
                        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {}
                        Err(err) => return Err(StoreError::Io(err)),
                    }
                }
                if attempt < config.lock_retry_attempts {
                    let wait = backoff
                        .next_backoff()
                        .unwrap_or_else(|| Duration::from_millis(config.lock_retry_initial_ms));
                    tokio::time::sleep(wait).await;
                }
            }
            Err(err) => return Err(StoreError::Io(err)),
        }
    }

    Err(StoreError::Busy {
        attempts: config.lock_retry_attempts,
    })
}

async fn try_create(path: &Path) -> Result<FileLockGuard, std::io::Error> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;

    let info = LockInfo {
        pid: std::process::id() as i32,
        acquired_at: Utc::now(),
    };
    let body = serde_json::to_vec(&info).unwrap_or_default();
    file.write_all(&body).await?;
    file.flush().await?;

    Ok(FileLockGuard {
        path: path.to_path_buf(),
    })
}

/// Remove a lock whose owner is gone or which has outlived the stale
/// threshold. Returns true when the lock was broken.
async fn break_if_stale(path: &Path, stale_secs: u64) -> bool {
    let info: Option<LockInfo> = match tokio::fs::read_to_string(path).await {
        Ok(body) => serde_json::from_str(&body).ok(),
        // Racing with a release is fine; the next attempt re-checks.
        Err(_) => return false,
    };

    let stale = match info {
        Some(info) => {
            let age = Utc::now().signed_duration_since(info.acquired_at);
            let owner_dead = !process_alive(info.pid);
            if owner_dead {
                warn!(pid = info.pid, path = %path.display(), "breaking lock held by dead process");
            } else if age.num_seconds() >= stale_secs as i64 {
                warn!(
                    pid = info.pid,
                    age_secs = age.num_seconds(),
                    path = %path.display(),
                    "breaking stale lock"
                );
            }
            owner_dead || age.num_seconds() >= stale_secs as i64
        }
        // Unreadable lock contents: only age can save us, and we cannot
        // read the acquisition time. Treat as live.
        None => false,
    };

    if stale {
        tokio::fs::remove_file(path).await.is_ok()
    } else {
        false
    }
}

fn process_alive(pid: i32) -> bool {
    // Signal 0 performs the permission and existence checks without
    // delivering anything.
    kill(Pid::from_raw(pid), None).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn quick_config() -> StoreConfig {
        StoreConfig {
            lock_retry_attempts: 3,
            lock_retry_initial_ms: 1,
            lock_stale_secs: 300,
        }
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registry.lock");

        let guard = acquire(&path, &quick_config()).await.unwrap();
        assert!(path.exists());
        drop(guard);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_busy_when_held_by_live_process() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registry.lock");

        let _guard = acquire(&path, &quick_config()).await.unwrap();
        let err = acquire(&path, &quick_config()).await.unwrap_err();
        assert!(matches!(err, StoreError::Busy { attempts: 3 }));
    }

    #[tokio::test]
    async fn test_breaks_lock_of_dead_process() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registry.lock");

        // A pid far beyond pid_max will not be alive.
        let info = LockInfo {
            pid: i32::MAX,
            acquired_at: Utc::now(),
        };
        std::fs::write(&path, serde_json::to_vec(&info).unwrap()).unwrap();

        let guard = acquire(&path, &quick_config()).await.unwrap();
        drop(guard);
    }

    #[tokio::test]
    async fn test_breaks_dead_lock_with_single_attempt_budget() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registry.lock");

        let info = LockInfo {
            pid: i32::MAX,
            acquired_at: Utc::now(),
        };
        std::fs::write(&path, serde_json::to_vec(&info).unwrap()).unwrap();

        // Breaking the stale lock must not consume the only attempt.
        let mut config = quick_config();
        config.lock_retry_attempts = 1;
        let guard = acquire(&path, &config).await.unwrap();
        drop(guard);
    }

    #[tokio::test]
    async fn test_breaks_expired_lock() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registry.lock");

        let info = LockInfo {
            pid: std::process::id() as i32,
            acquired_at: Utc::now() - chrono::Duration::hours(1),
        };
        std::fs::write(&path, serde_json::to_vec(&info).unwrap()).unwrap();

        let mut config = quick_config();
        config.lock_stale_secs = 60;
        let guard = acquire(&path, &config).await.unwrap();
        drop(guard);
    }
}
