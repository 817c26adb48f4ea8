// policyguard-core/src/application/mod.rs

pub mod pipeline;

pub use pipeline::{
    analyze_file, extract_rules_lenient, load_rules_file, render_report, save_json,
    AnalysisResult, RunSummary,
};
