// policyguard-core/src/infrastructure/llm/gemini.rs
//
// Gemini `generateContent` adapter for the `RuleExtractor` port. The
// client is constructed explicitly from settings; nothing here reads
// global state after construction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::domain::rules::RuleSpec;
use crate::error::PolicyGuardError;
use crate::infrastructure::config::LlmSettings;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::llm::parse_rules;
use crate::ports::RuleExtractor;

/// Columns the model is allowed to reference, exactly as they appear in the
/// transactions dataset.
const DATASET_COLUMNS: &[&str] = &[
    "Timestamp",
    "From Bank",
    "Account",
    "To Bank",
    "Account.1",
    "Amount Received",
    "Receiving Currency",
    "Amount Paid",
    "Payment Currency",
    "Payment Format",
    "Is Laundering",
];

pub struct GeminiExtractor {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    max_policy_chars: usize,
}

impl GeminiExtractor {
    /// Build the extractor from settings, reading the API key from the
    /// environment variable the settings name.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, PolicyGuardError> {
        let api_key = std::env::var(&settings.api_key_env).map_err(|_| {
            InfrastructureError::ConfigError(format!(
                "API key not found: set the {} environment variable",
                settings.api_key_env
            ))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(InfrastructureError::Http)?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key,
            max_policy_chars: settings.max_policy_chars,
        })
    }

    fn build_prompt(&self, policy_text: &str) -> String {
        let truncated: String = policy_text.chars().take(self.max_policy_chars).collect();
        format!(
            "You are an AML compliance expert.\n\
             \n\
             Extract actionable transaction monitoring rules.\n\
             \n\
             Return STRICTLY valid JSON: an array of objects with the keys\n\
             \"name\", \"description\" and \"condition\".\n\
             \n\
             IMPORTANT:\n\
             - Do NOT add explanations.\n\
             - Do NOT add markdown.\n\
             - Do NOT wrap JSON in ```json.\n\
             - Only return pure JSON array.\n\
             - Use dataset columns EXACTLY as written below:\n\
             \n\
             Available Columns:\n\
             {columns}\n\
             \n\
             The \"condition\" must be a boolean expression over those columns\n\
             using comparisons, and/or/not and arithmetic.\n\
             \n\
             Return ONLY JSON.\n\
             \n\
             Policy Text:\n\
             {policy}",
            columns = DATASET_COLUMNS.join("\n"),
            policy = truncated,
        )
    }

    async fn generate(&self, prompt: &str) -> Result<String, PolicyGuardError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        debug!(model = %self.model, "Sending generateContent request");
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(InfrastructureError::Http)?
            .error_for_status()
            .map_err(InfrastructureError::Http)?;

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(InfrastructureError::Http)?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();

        Ok(text)
    }
}

#[async_trait]
impl RuleExtractor for GeminiExtractor {
    #[instrument(skip(self, policy_text), fields(model = %self.model))]
    async fn extract_rules(&self, policy_text: &str) -> Result<Vec<RuleSpec>, PolicyGuardError> {
        let prompt = self.build_prompt(policy_text);
        let raw = self.generate(&prompt).await?;

        let rules = parse_rules(&raw);
        if rules.is_empty() {
            warn!("Model returned no usable rules");
        } else {
            info!(count = rules.len(), "Extracted rules from policy text");
        }
        Ok(rules)
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn extractor() -> GeminiExtractor {
        GeminiExtractor {
            client: reqwest::Client::new(),
            base_url: "https://example.invalid/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: "test-key".to_string(),
            max_policy_chars: 100,
        }
    }

    #[test]
    fn test_prompt_lists_dataset_columns() {
        let prompt = extractor().build_prompt("Flag large cash transactions.");
        assert!(prompt.contains("Amount Received"));
        assert!(prompt.contains("Account.1"));
        assert!(prompt.contains("Flag large cash transactions."));
    }

    #[test]
    fn test_prompt_truncates_long_policy_text() {
        let long_text = "x".repeat(1000);
        let prompt = extractor().build_prompt(&long_text);
        assert!(prompt.len() < 1000 + 900);
        assert!(prompt.ends_with(&"x".repeat(100)));
    }

    #[test]
    fn test_prompt_truncation_is_char_safe() {
        // Multibyte characters must not be split mid-sequence.
        let text = "é".repeat(200);
        let prompt = extractor().build_prompt(&text);
        assert!(prompt.ends_with(&"é".repeat(100)));
    }

    #[test]
    fn test_response_deserialization() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "[{\"name\": \"R1\"}]"}]}}
            ]
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.candidates[0].content.parts[0].text, "[{\"name\": \"R1\"}]");
    }
}
