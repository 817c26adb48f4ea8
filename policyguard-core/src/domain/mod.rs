// policyguard-core/src/domain/mod.rs

pub mod anomaly;
pub mod error;
pub mod rules;
pub mod scoring;
pub mod table;

// Convenience re-exports to simplify imports elsewhere
pub use error::DomainError;
