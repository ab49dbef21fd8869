//! Domain layer: pure business logic and domain models.

pub mod errors;
pub mod models;
pub mod ports;
