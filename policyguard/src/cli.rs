// policyguard/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "policyguard")]
#[command(about = "AML policy-to-pipeline engine (rules, anomalies, risk scoring)", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🚀 Runs the full pipeline (policy/rules -> scored transactions)
    Analyze {
        /// Transactions CSV file
        #[arg(long, short)]
        transactions: PathBuf,

        /// Policy text file to extract rules from (needs an LLM API key)
        #[arg(long, conflicts_with = "rules")]
        policy: Option<PathBuf>,

        /// Pre-extracted rules JSON file (skips the LLM call)
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Output directory for the generated artifacts
        #[arg(long, short, default_value = "policyguard_output")]
        output_dir: PathBuf,

        /// Keep every row instead of only high-risk ones
        #[arg(long, default_value = "false")]
        all: bool,

        /// Also render the PDF report
        #[arg(long, default_value = "false")]
        pdf: bool,

        /// Configuration file (default: policyguard.yaml in the working dir)
        #[arg(long, short)]
        config: Option<PathBuf>,
    },

    /// 🧠 Extracts monitoring rules from a policy text file
    Extract {
        /// Policy text file
        #[arg(long)]
        policy: PathBuf,

        /// Where to write the rules JSON
        #[arg(long, short, default_value = "rules.json")]
        output: PathBuf,

        /// Configuration file
        #[arg(long, short)]
        config: Option<PathBuf>,
    },

    /// ⚡ Scores transactions with an existing rules file (no LLM call)
    Score {
        /// Transactions CSV file
        #[arg(long, short)]
        transactions: PathBuf,

        /// Rules JSON file
        #[arg(long)]
        rules: PathBuf,

        /// Where to write the scored CSV
        #[arg(long, short, default_value = "scored_transactions.csv")]
        output: PathBuf,

        /// Keep every row instead of only high-risk ones
        #[arg(long, default_value = "false")]
        all: bool,

        /// Configuration file
        #[arg(long, short)]
        config: Option<PathBuf>,
    },

    /// 📄 Renders a PDF report from a scored CSV
    Report {
        /// Scored transactions CSV (output of analyze/score)
        #[arg(long)]
        scored: PathBuf,

        /// Where to write the PDF
        #[arg(long, short, default_value = "report.pdf")]
        output: PathBuf,

        /// Configuration file
        #[arg(long, short)]
        config: Option<PathBuf>,
    },

    /// 🔍 Previews the first rows of a CSV as a terminal table
    Inspect {
        /// CSV file to preview
        #[arg(long, short)]
        transactions: PathBuf,

        /// Number of rows to display
        #[arg(long, default_value = "5")]
        limit: usize,
    },
}
