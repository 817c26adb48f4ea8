// policyguard-core/src/ports/mod.rs

pub mod extractor;

pub use extractor::RuleExtractor;
