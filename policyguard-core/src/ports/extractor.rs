// policyguard-core/src/ports/extractor.rs
//
// What the application needs from a rule extractor, without knowing how it
// is done. The production adapter calls a hosted LLM; tests plug in a
// canned implementation. The client is constructed explicitly and passed
// in — there is no process-global model handle.

use async_trait::async_trait;

use crate::domain::rules::RuleSpec;
use crate::error::PolicyGuardError;

#[async_trait]
pub trait RuleExtractor: Send + Sync {
    /// Turn free-form policy text into actionable monitoring rules.
    /// Unusable model output maps to an empty list, not an error; transport
    /// failures surface as errors so the caller can decide.
    async fn extract_rules(&self, policy_text: &str) -> Result<Vec<RuleSpec>, PolicyGuardError>;
}
