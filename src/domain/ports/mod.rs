//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the trait interfaces that adapters must implement:
//! - `TaskExecutor`: the external collaborator that performs delegated work
//! - `RegistryStore`: durable persistence for the task registry
//!
//! These traits keep the state machine core independent of how work is
//! actually executed and where state is actually stored.

pub mod registry_store;
pub mod task_executor;

pub use registry_store::{RegistryStore, StoreGuard};
pub use task_executor::{
    DelegationReply, DelegationRequest, ExecutorError, ResponseReport, TaskExecutor,
};
