// policyguard-core/src/infrastructure/mod.rs

pub mod config;
pub mod error;
pub mod fs;
pub mod llm;
pub mod report;
pub mod tabular;
