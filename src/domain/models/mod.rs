//! Domain models.

pub mod config;
pub mod registry;
pub mod task;

pub use config::{Config, ExecutorConfig, LoggingConfig, OrchestratorConfig, StoreConfig};
pub use registry::{EscalationRecord, ProtocolViolation, RegistryReport, TaskRegistry};
pub use task::{EventKind, LifecycleEvent, TaskPriority, TaskRecord, TaskState};
