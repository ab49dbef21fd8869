//! JSON document store for the task registry.
//!
//! The registry lives in a single pretty-printed JSON file. Writes go
//! to a temp file and are renamed over the canonical path, so readers
//! never observe a truncated document. A backup of the previous version
//! is taken before every write and restored if the write fails partway.
//! A document that fails to parse is quarantined and the store recovers
//! what it can before continuing from the survivors.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::domain::errors::StoreError;
use crate::domain::models::{StoreConfig, TaskRecord, TaskRegistry};
use crate::domain::ports::{RegistryStore, StoreGuard};

use super::lock;

const REGISTRY_FILE: &str = "registry.json";
const LOCK_FILE: &str = "registry.lock";
const BACKUP_FILE: &str = "registry.json.bak";
const TEMP_FILE: &str = "registry.json.tmp";

/// File-backed registry store rooted at a data directory.
pub struct JsonRegistryStore {
    data_dir: PathBuf,
    config: StoreConfig,
}

impl JsonRegistryStore {
    pub fn new(data_dir: impl Into<PathBuf>, config: StoreConfig) -> Self {
        Self {
            data_dir: data_dir.into(),
            config,
        }
    }

    fn registry_path(&self) -> PathBuf {
        self.data_dir.join(REGISTRY_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.data_dir.join(LOCK_FILE)
    }

    fn backup_path(&self) -> PathBuf {
        self.data_dir.join(BACKUP_FILE)
    }

    fn temp_path(&self) -> PathBuf {
        self.data_dir.join(TEMP_FILE)
    }

    async fn ensure_data_dir(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(StoreError::Io)
    }

    /// Quarantine a corrupt document and salvage what parses.
    async fn recover_from_corruption(&self, content: &str) -> Result<TaskRegistry, StoreError> {
        let quarantine = self.data_dir.join(format!(
            "{REGISTRY_FILE}.corrupt-{}",
            Utc::now().format("%Y%m%dT%H%M%S%.3fZ")
        ));
        error!(
            quarantine = %quarantine.display(),
            "registry document failed to parse; quarantining (data-loss event)"
        );
        tokio::fs::rename(self.registry_path(), &quarantine)
            .await
            .map_err(StoreError::Io)?;

        // Prefer the pre-write backup when it is intact.
        if let Ok(body) = tokio::fs::read_to_string(self.backup_path()).await {
            if let Ok(registry) = serde_json::from_str::<TaskRegistry>(&body) {
                warn!(
                    tasks = registry.tasks.len(),
                    "recovered registry from pre-write backup"
                );
                return Ok(registry);
            }
        }

        // Last resort: scan the corrupt text for intact task fragments.
        let fragments = scan_task_fragments(content);
        let mut registry = TaskRegistry::new();
        for record in fragments {
            registry.insert(record);
        }
        if registry.tasks.is_empty() {
            error!("no task records recovered; continuing from an empty registry");
        } else {
            warn!(
                tasks = registry.tasks.len(),
                "partially recovered task records from corrupt registry"
            );
        }
        Ok(registry)
    }
}

#[async_trait]
impl RegistryStore for JsonRegistryStore {
    async fn lock_exclusive(&self) -> Result<Box<dyn StoreGuard>, StoreError> {
        self.ensure_data_dir().await?;
        let guard = lock::acquire(&self.lock_path(), &self.config).await?;
        Ok(Box::new(guard))
    }

    async fn load(&self) -> Result<TaskRegistry, StoreError> {
        let path = self.registry_path();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no registry on disk, starting empty");
                return Ok(TaskRegistry::new());
            }
            Err(err) => return Err(StoreError::Io(err)),
        };

        match serde_json::from_str(&content) {
            Ok(registry) => Ok(registry),
            Err(_) => self.recover_from_corruption(&content).await,
        }
    }

    async fn save(&self, registry: &mut TaskRegistry) -> Result<(), StoreError> {
        self.ensure_data_dir().await?;
        registry.touch();

        let path = self.registry_path();
        let temp = self.temp_path();
        let backup = self.backup_path();

        let had_previous = tokio::fs::try_exists(&path).await.unwrap_or(false);
        if had_previous {
            tokio::fs::copy(&path, &backup).await.map_err(StoreError::Io)?;
        }

        let body = serde_json::to_vec_pretty(registry)?;
        let result = write_and_replace(&temp, &path, &body).await;

        if let Err(err) = result {
            let _ = tokio::fs::remove_file(&temp).await;
            if had_previous {
                match tokio::fs::copy(&backup, &path).await {
                    Ok(_) => warn!("registry write failed, backup restored"),
                    Err(restore_err) => error!(
                        error = %restore_err,
                        "registry write failed AND backup restore failed"
                    ),
                }
            }
            return Err(StoreError::WriteFailed {
                detail: err.to_string(),
            });
        }

        info!(
            tasks = registry.tasks.len(),
            path = %path.display(),
            "registry persisted"
        );
        Ok(())
    }
}

async fn write_and_replace(temp: &Path, target: &Path, body: &[u8]) -> Result<(), std::io::Error> {
    let mut file = tokio::fs::File::create(temp).await?;
    file.write_all(body).await?;
    // The rename must not outlive the data it points at.
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(temp, target).await
}

/// Best-effort scan of corrupt JSON text for parseable `TaskRecord`
/// objects. Finds each `"task_id"` key, walks back to the opening brace
/// of the enclosing object and forward to its balanced close, then lets
/// serde decide whether the slice is a real record.
fn scan_task_fragments(content: &str) -> Vec<TaskRecord> {
    let bytes = content.as_bytes();
    let mut records: Vec<TaskRecord> = Vec::new();

    for (key_pos, _) in content.match_indices("\"task_id\"") {
        let Some(start) = content[..key_pos].rfind('{') else {
            continue;
        };
        let Some(end) = balanced_object_end(bytes, start) else {
            continue;
        };
        if let Ok(record) = serde_json::from_str::<TaskRecord>(&content[start..=end]) {
            if !records.iter().any(|r| r.task_id == record.task_id) {
                records.push(record);
            }
        }
    }

    records
}

/// Find the index of the `}` closing the object opened at `start`,
/// skipping braces inside string literals.
fn balanced_object_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}
