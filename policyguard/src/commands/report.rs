// policyguard/src/commands/report.rs
//
// USE CASE: Scored CSV -> PDF report.

use std::path::PathBuf;

use anyhow::Context;
use policyguard_core::infrastructure::config::load_config;
use policyguard_core::infrastructure::fs::atomic_write;
use policyguard_core::infrastructure::report::{render_pdf_report, ReportSummary};
use policyguard_core::infrastructure::tabular::read_csv_strings;

pub fn execute(scored: PathBuf, output: PathBuf, config: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config.as_deref()).context("Failed to load configuration")?;

    let (headers, rows) = read_csv_strings(&scored)
        .with_context(|| format!("Failed to read scored CSV from {:?}", scored))?;

    let violated_col = headers.iter().position(|h| h == "Violated_Rule");
    let anomaly_col = headers.iter().position(|h| h == "Anomaly_Flag");
    if violated_col.is_none() || anomaly_col.is_none() {
        anyhow::bail!(
            "{} does not look like a scored CSV (missing Violated_Rule/Anomaly_Flag columns)",
            scored.display()
        );
    }

    let summary = ReportSummary {
        total_transactions: rows.len(),
        rule_violations: rows
            .iter()
            .filter(|r| violated_col.map(|c| !r[c].is_empty()).unwrap_or(false))
            .count(),
        anomalies: rows
            .iter()
            .filter(|r| anomaly_col.map(|c| r[c] == "True").unwrap_or(false))
            .count(),
    };

    println!(
        "📄 Rendering report: {} rows, {} violations, {} anomalies",
        summary.total_transactions, summary.rule_violations, summary.anomalies
    );

    let bytes = render_pdf_report(&summary, &headers, &rows, config.report.max_rows)
        .context("Failed to render the PDF report")?;
    atomic_write(&output, bytes).with_context(|| format!("Failed to write {:?}", output))?;

    println!("✨ Wrote {}", output.display());
    Ok(())
}
