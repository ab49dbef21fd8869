//! Service layer: the orchestrator state machine and its supporting
//! policies.

pub mod loop_guard;
pub mod orchestrator;
pub mod polling;

pub use loop_guard::LoopGuard;
pub use orchestrator::{CheckOutcome, DelegationOutcome, Orchestrator};
