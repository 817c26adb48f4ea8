// policyguard/src/commands/mod.rs

pub mod analyze;
pub mod extract;
pub mod inspect;
pub mod report;
pub mod score;
