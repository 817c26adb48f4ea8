// policyguard-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Malformed transaction table: {0}")]
    #[diagnostic(
        code(policyguard::domain::table),
        help("Every row must have exactly one cell per column.")
    )]
    MalformedTable(String),

    #[error("Chunk schema mismatch: {0}")]
    #[diagnostic(
        code(policyguard::domain::schema),
        help("All chunks of one run must share the same column set, in the same order.")
    )]
    SchemaMismatch(String),
}
