// policyguard/src/commands/analyze.rs
//
// USE CASE: Run the full pipeline (policy or rules -> scored transactions).

use std::path::PathBuf;

use anyhow::{bail, Context};
use tracing::debug;
use policyguard_core::application::{
    analyze_file, extract_rules_lenient, load_rules_file, render_report, save_json,
};
use policyguard_core::domain::rules::RuleSpec;
use policyguard_core::infrastructure::config::load_config;
use policyguard_core::infrastructure::fs::atomic_write;
use policyguard_core::infrastructure::llm::GeminiExtractor;
use policyguard_core::infrastructure::tabular::write_scored_csv;

#[allow(clippy::too_many_arguments)]
pub async fn execute(
    transactions: PathBuf,
    policy: Option<PathBuf>,
    rules: Option<PathBuf>,
    output_dir: PathBuf,
    all: bool,
    pdf: bool,
    config: Option<PathBuf>,
) -> anyhow::Result<()> {
    let start = std::time::Instant::now();

    println!("⚙️  Loading configuration...");
    let config = load_config(config.as_deref()).context("Failed to load configuration")?;
    debug!(chunk_size = config.chunk_size, model = %config.llm.model, "Configuration loaded");

    // A. Obtain the rule set (pre-extracted file or LLM extraction)
    let (rule_set, extracted): (Vec<RuleSpec>, bool) = match (&policy, &rules) {
        (None, Some(rules_path)) => {
            let rule_set = load_rules_file(rules_path)
                .with_context(|| format!("Failed to load rules from {:?}", rules_path))?;
            println!("📜 Loaded {} rules from {}", rule_set.len(), rules_path.display());
            (rule_set, false)
        }
        (Some(policy_path), None) => {
            let policy_text = std::fs::read_to_string(policy_path)
                .with_context(|| format!("Failed to read policy text from {:?}", policy_path))?;
            println!("🧠 Extracting rules with model '{}'...", config.llm.model);
            let extractor = GeminiExtractor::from_settings(&config.llm)
                .context("Failed to initialize the LLM extractor")?;
            let rule_set = extract_rules_lenient(&extractor, &policy_text).await;
            println!("📜 Extracted {} rules.", rule_set.len());
            (rule_set, true)
        }
        (None, None) => bail!("Provide either --policy or --rules"),
        (Some(_), Some(_)) => bail!("--policy and --rules are mutually exclusive"),
    };

    // B. Run the pipeline
    println!("🚀 Analyzing {}...", transactions.display());
    let result = analyze_file(&transactions, &rule_set, &config)
        .with_context(|| format!("Analysis failed for {:?}", transactions))?;

    println!(
        "   {} rows | {} violations | {} anomalies ({} chunks)",
        result.summary.total_rows,
        result.summary.total_violations,
        result.summary.total_anomalies,
        result.summary.chunks
    );

    // C. Write the artifacts
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory {:?}", output_dir))?;

    let (table, csv_name) = if all {
        (result.table.clone(), "scored_transactions.csv")
    } else {
        (result.table.filter_high_risk(), "high_risk_transactions.csv")
    };

    let csv_path = output_dir.join(csv_name);
    write_scored_csv(&table, &csv_path)
        .with_context(|| format!("Failed to write {:?}", csv_path))?;
    println!("💾 Wrote {} ({} rows)", csv_path.display(), table.len());

    save_json(&result.summary, &output_dir.join("summary.json"))
        .context("Failed to write summary.json")?;

    if extracted {
        save_json(&rule_set, &output_dir.join("rules.json"))
            .context("Failed to write rules.json")?;
    }

    if pdf {
        let bytes = render_report(&table, &result.summary, config.report.max_rows)
            .context("Failed to render the PDF report")?;
        let pdf_path = output_dir.join("report.pdf");
        atomic_write(&pdf_path, bytes)
            .with_context(|| format!("Failed to write {:?}", pdf_path))?;
        println!("📄 Wrote {}", pdf_path.display());
    }

    println!("\n✨ SUCCESS! Pipeline finished in {:.2?}", start.elapsed());
    Ok(())
}
