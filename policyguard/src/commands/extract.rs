// policyguard/src/commands/extract.rs
//
// USE CASE: Policy text -> rules JSON artifact.

use std::path::PathBuf;

use anyhow::Context;
use policyguard_core::application::save_json;
use policyguard_core::infrastructure::config::load_config;
use policyguard_core::infrastructure::llm::GeminiExtractor;
use policyguard_core::ports::RuleExtractor;

pub async fn execute(
    policy: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = load_config(config.as_deref()).context("Failed to load configuration")?;

    let policy_text = std::fs::read_to_string(&policy)
        .with_context(|| format!("Failed to read policy text from {:?}", policy))?;

    println!("🧠 Extracting rules with model '{}'...", config.llm.model);
    let extractor = GeminiExtractor::from_settings(&config.llm)
        .context("Failed to initialize the LLM extractor")?;

    // Strict here, unlike analyze: an extraction-only run that produced
    // nothing should fail loudly rather than write an empty artifact.
    let rules = extractor
        .extract_rules(&policy_text)
        .await
        .context("Rule extraction failed")?;
    if rules.is_empty() {
        anyhow::bail!("The model returned no usable rules");
    }

    save_json(&rules, &output).with_context(|| format!("Failed to write {:?}", output))?;
    println!("✨ Wrote {} rules to {}", rules.len(), output.display());
    Ok(())
}
