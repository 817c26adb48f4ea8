// policyguard/src/main.rs
//
// Thin entry point: logging setup, argument parsing, dispatch. All use
// case logic lives in the commands modules.

mod cli;
mod commands;

use clap::Parser;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug policyguard analyze ... for the details
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            transactions,
            policy,
            rules,
            output_dir,
            all,
            pdf,
            config,
        } => {
            commands::analyze::execute(transactions, policy, rules, output_dir, all, pdf, config)
                .await
        }
        Commands::Extract {
            policy,
            output,
            config,
        } => commands::extract::execute(policy, output, config).await,
        Commands::Score {
            transactions,
            rules,
            output,
            all,
            config,
        } => commands::score::execute(transactions, rules, output, all, config),
        Commands::Report {
            scored,
            output,
            config,
        } => commands::report::execute(scored, output, config),
        Commands::Inspect {
            transactions,
            limit,
        } => commands::inspect::execute(transactions, limit),
    }
}
