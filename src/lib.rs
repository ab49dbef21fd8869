//! Steward - Persistent Task Delegation Orchestrator
//!
//! Steward tracks tasks handed to external worker agents through an
//! explicit state machine (defined, delegated, accepted, in progress,
//! completed), persists every transition to a durable JSON registry,
//! and polls for responses with adaptive backoff. Tasks that stop
//! making progress are escalated instead of silently stalling.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): task records, the transition table,
//!   configuration and the store/executor ports
//! - **Service Layer** (`services`): the orchestrator state machine,
//!   loop guard and polling policy
//! - **Adapters** (`adapters`): the file-backed registry store and the
//!   subprocess executor
//! - **Infrastructure Layer** (`infrastructure`): configuration loading
//!   and logging setup
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use steward::adapters::executor::ProcessExecutor;
//! use steward::adapters::file_store::JsonRegistryStore;
//! use steward::{Config, Orchestrator, TaskPriority};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let store = Arc::new(JsonRegistryStore::new(".steward", config.store.clone()));
//!     let executor = Arc::new(ProcessExecutor::new("my-executor"));
//!     let orchestrator = Orchestrator::new(store, executor, config.orchestrator);
//!
//!     orchestrator
//!         .define_task("T1", "worker-agent", "tasks/t1.md", TaskPriority::High, None)
//!         .await?;
//!     orchestrator.delegate_task("T1").await?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{OrchestratorError, OrchestratorResult, StoreError};
pub use domain::models::{
    Config, ExecutorConfig, LoggingConfig, OrchestratorConfig, RegistryReport, StoreConfig,
    TaskPriority, TaskRecord, TaskRegistry, TaskState,
};
pub use domain::ports::{RegistryStore, TaskExecutor};
pub use services::{CheckOutcome, DelegationOutcome, Orchestrator};
