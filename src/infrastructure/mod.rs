//! Infrastructure layer: provider and analytics boundaries, implementations, DI container
//!
//! This layer implements I/O boundary traits and wires up services.

pub mod analytics;
pub mod di;
pub mod error;
pub mod provider;
pub mod traits;

pub use error::{InfraError, InfraResult};
