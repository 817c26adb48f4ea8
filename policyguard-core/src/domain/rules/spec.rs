// policyguard-core/src/domain/rules/spec.rs

use serde::{Deserialize, Serialize};

/// One extracted compliance rule. `condition` is a boolean expression over
/// normalized transaction column names, evaluated per row by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub condition: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_deserialize_full_rule() -> Result<()> {
        let json = r#"{"name":"R1","description":"large transfer","condition":"Amount_Received > 10000"}"#;
        let rule: RuleSpec = serde_json::from_str(json)?;
        assert_eq!(rule.name, "R1");
        assert_eq!(rule.condition, "Amount_Received > 10000");
        Ok(())
    }

    #[test]
    fn test_missing_fields_default_to_empty() -> Result<()> {
        // Model output is not always complete; absent fields must not fail parsing.
        let rule: RuleSpec = serde_json::from_str(r#"{"name":"R2"}"#)?;
        assert_eq!(rule.description, "");
        assert_eq!(rule.condition, "");
        Ok(())
    }
}
