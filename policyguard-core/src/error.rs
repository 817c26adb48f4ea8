// policyguard-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolicyGuardError {
    // --- DOMAIN ERRORS (table schema, rule engine, scoring) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (IO, HTTP, parsing) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- GENERIC / APPLICATION ERRORS ---
    #[error("Internal Error: {0}")]
    InternalError(String),
}

// Manual implementation to avoid duplicate enum variant but keep ergonomics
impl From<std::io::Error> for PolicyGuardError {
    fn from(err: std::io::Error) -> Self {
        PolicyGuardError::Infrastructure(InfrastructureError::Io(err))
    }
}
