// policyguard-core/src/domain/rules/mod.rs

pub mod engine;
pub mod expr;
pub mod spec;

// Re-exports
pub use engine::apply_rules;
pub use expr::{ExprError, Predicate};
pub use spec::RuleSpec;
