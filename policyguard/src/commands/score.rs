// policyguard/src/commands/score.rs
//
// USE CASE: Rules JSON + transactions CSV -> scored CSV, no LLM involved.

use std::path::PathBuf;

use anyhow::Context;
use policyguard_core::application::{analyze_file, load_rules_file};
use policyguard_core::infrastructure::config::load_config;
use policyguard_core::infrastructure::tabular::write_scored_csv;

pub fn execute(
    transactions: PathBuf,
    rules: PathBuf,
    output: PathBuf,
    all: bool,
    config: Option<PathBuf>,
) -> anyhow::Result<()> {
    let start = std::time::Instant::now();
    let config = load_config(config.as_deref()).context("Failed to load configuration")?;

    let rule_set = load_rules_file(&rules)
        .with_context(|| format!("Failed to load rules from {:?}", rules))?;
    println!("📜 Loaded {} rules from {}", rule_set.len(), rules.display());

    println!("🚀 Scoring {}...", transactions.display());
    let result = analyze_file(&transactions, &rule_set, &config)
        .with_context(|| format!("Scoring failed for {:?}", transactions))?;

    let table = if all {
        result.table
    } else {
        result.table.filter_high_risk()
    };

    write_scored_csv(&table, &output).with_context(|| format!("Failed to write {:?}", output))?;

    println!(
        "💾 Wrote {} ({} rows, {} violations, {} anomalies)",
        output.display(),
        table.len(),
        result.summary.total_violations,
        result.summary.total_anomalies
    );
    println!("\n✨ SUCCESS! Scoring finished in {:.2?}", start.elapsed());
    Ok(())
}
