//! File-backed registry store: one JSON document, an advisory lock
//! file, atomic replace and a pre-write backup.

pub mod lock;
pub mod store;

pub use lock::FileLockGuard;
pub use store::JsonRegistryStore;
