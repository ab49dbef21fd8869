//! Registry store port.

use async_trait::async_trait;

use crate::domain::errors::StoreError;
use crate::domain::models::TaskRegistry;

/// RAII handle for exclusive store access.
///
/// Dropping the guard releases the lock. Holding it across a
/// load-mutate-save cycle is what serializes writers from different
/// processes.
pub trait StoreGuard: Send + std::fmt::Debug {}

/// Durable persistence for the task registry.
///
/// Implementations must guarantee write-ahead semantics: `save` either
/// commits the whole document atomically or leaves the previous version
/// intact. `load` must tolerate corruption by quarantining the damaged
/// document and returning what it could recover.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Acquire the exclusive write lock with bounded retries.
    ///
    /// Returns `StoreError::Busy` when another process holds the lock
    /// past the retry budget.
    async fn lock_exclusive(&self) -> Result<Box<dyn StoreGuard>, StoreError>;

    /// Load the latest durable registry, creating an empty one if none
    /// exists yet. Reads do not require the exclusive lock because the
    /// document is only ever replaced atomically.
    async fn load(&self) -> Result<TaskRegistry, StoreError>;

    /// Persist the registry atomically. Callers mutating existing state
    /// must hold the guard from `lock_exclusive` across the whole
    /// read-modify-write cycle.
    async fn save(&self, registry: &mut TaskRegistry) -> Result<(), StoreError>;
}
