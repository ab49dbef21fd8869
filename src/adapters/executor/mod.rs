//! Executor adapters.

pub mod process;

pub use process::ProcessExecutor;
