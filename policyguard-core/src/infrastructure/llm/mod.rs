// policyguard-core/src/infrastructure/llm/mod.rs
//
// LLM-backed rule extraction. The transport adapter lives in `gemini`;
// this module owns the model-output cleanup, which is transport agnostic:
// models wrap JSON in markdown fences or chat around it, so we isolate
// the first JSON array before parsing.

pub mod gemini;

pub use gemini::GeminiExtractor;

use regex::Regex;
use tracing::warn;

use crate::domain::rules::RuleSpec;

/// Strip markdown code fences the model may wrap its answer in.
fn clean_model_response(raw: &str) -> String {
    let mut text = raw.trim().to_string();
    if let Some(stripped) = text.strip_prefix("```json") {
        text = stripped.to_string();
    } else if let Some(stripped) = text.strip_prefix("```") {
        text = stripped.to_string();
    }
    if let Some(stripped) = text.strip_suffix("```") {
        text = stripped.to_string();
    }
    text.trim().to_string()
}

/// Extract the outermost JSON array from free-form model text.
fn extract_json_array(text: &str) -> Option<&str> {
    // Greedy so nested arrays inside rule objects stay intact.
    static PATTERN: &str = r"(?s)\[.*\]";
    let re = Regex::new(PATTERN).ok()?;
    re.find(text).map(|m| m.as_str())
}

/// Parse a raw model response into rule specs.
///
/// An unparseable response yields an empty rule set rather than an error:
/// the pipeline then runs with anomaly detection and scoring only.
pub fn parse_rules(raw: &str) -> Vec<RuleSpec> {
    let cleaned = clean_model_response(raw);
    let Some(array) = extract_json_array(&cleaned) else {
        warn!("No JSON array found in model response, continuing without rules");
        return Vec::new();
    };
    match serde_json::from_str::<Vec<RuleSpec>>(array) {
        Ok(rules) => rules,
        Err(e) => {
            warn!(error = %e, "Model response is not a valid rule array, continuing without rules");
            Vec::new()
        }
    }
}
