//! Infrastructure adapters implementing the domain ports.

pub mod executor;
pub mod file_store;

pub use executor::ProcessExecutor;
pub use file_store::JsonRegistryStore;
