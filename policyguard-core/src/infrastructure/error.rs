// policyguard-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(policyguard::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- TABULAR INPUT ---
    #[error("CSV Error: {0}")]
    #[diagnostic(
        code(policyguard::infra::csv),
        help("The transactions file must be well-formed delimited text with a header row.")
    )]
    Csv(#[from] csv::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(policyguard::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON Error: {0}")]
    #[diagnostic(code(policyguard::infra::json))]
    Json(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Configuration file not found at '{0}'")]
    #[diagnostic(code(policyguard::infra::config_missing))]
    ConfigNotFound(String),

    // --- LLM TRANSPORT ---
    #[error("LLM API Error: {0}")]
    #[diagnostic(
        code(policyguard::infra::llm),
        help("Check the API key, model name and network connectivity.")
    )]
    Http(#[from] reqwest::Error),

    // --- REPORT RENDERING ---
    #[error("Report Rendering Error: {0}")]
    #[diagnostic(code(policyguard::infra::report))]
    Report(String),
}
