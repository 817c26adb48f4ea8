// policyguard-core/src/infrastructure/config/mod.rs
//
// Run configuration: operational knobs only. The weight table and risk
// level boundaries are fixed domain constants and deliberately not
// configurable here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::infrastructure::error::InfrastructureError;

fn default_chunk_size() -> usize {
    50_000
}

fn default_contamination() -> f64 {
    0.05
}

fn default_seed() -> u64 {
    42
}

fn default_trees() -> usize {
    100
}

fn default_max_samples() -> usize {
    256
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_policy_chars() -> usize {
    30_000
}

fn default_report_max_rows() -> usize {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalySettings {
    #[serde(default = "default_contamination")]
    pub contamination: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_trees")]
    pub trees: usize,
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
}

impl Default for AnomalySettings {
    fn default() -> Self {
        Self {
            contamination: default_contamination(),
            seed: default_seed(),
            trees: default_trees(),
            max_samples: default_max_samples(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key. The key itself
    /// never lives in the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_policy_chars")]
    pub max_policy_chars: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_policy_chars: default_max_policy_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSettings {
    #[serde(default = "default_report_max_rows")]
    pub max_rows: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            max_rows: default_report_max_rows(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub anomaly: AnomalySettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub report: ReportSettings,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            anomaly: AnomalySettings::default(),
            llm: LlmSettings::default(),
            report: ReportSettings::default(),
        }
    }
}

/// Load the run configuration.
///
/// An explicit path must exist; otherwise candidate files are searched in
/// the working directory and built-in defaults apply when none is found.
#[instrument(skip(explicit))]
pub fn load_config(explicit: Option<&Path>) -> Result<ProjectConfig, InfrastructureError> {
    let path = match explicit {
        Some(p) => {
            if !p.exists() {
                return Err(InfrastructureError::ConfigNotFound(
                    p.display().to_string(),
                ));
            }
            Some(p.to_path_buf())
        }
        None => find_candidate_config(Path::new(".")),
    };

    let mut config = match path {
        Some(path) => {
            info!(path = ?path, "Loading configuration");
            let content = fs::read_to_string(&path)?;
            serde_yaml::from_str(&content)?
        }
        None => {
            debug!("No configuration file found, using defaults");
            ProjectConfig::default()
        }
    };

    apply_env_overrides(&mut config);

    if config.chunk_size == 0 {
        return Err(InfrastructureError::ConfigError(
            "chunk_size must be at least 1".to_string(),
        ));
    }
    if !(0.0..=0.5).contains(&config.anomaly.contamination) {
        return Err(InfrastructureError::ConfigError(format!(
            "contamination must be in [0, 0.5], got {}",
            config.anomaly.contamination
        )));
    }

    Ok(config)
}

fn find_candidate_config(root: &Path) -> Option<PathBuf> {
    let candidates = ["policyguard.yaml", "policyguard.yml"];
    candidates
        .iter()
        .map(|name| root.join(name))
        .find(|p| p.exists())
}

fn apply_env_overrides(config: &mut ProjectConfig) {
    // Layering pattern: POLICYGUARD_CHUNK_SIZE=10000 policyguard analyze ...
    if let Ok(val) = std::env::var("POLICYGUARD_CHUNK_SIZE") {
        if let Ok(parsed) = val.parse::<usize>() {
            info!(old = config.chunk_size, new = parsed, "Overriding chunk size via ENV");
            config.chunk_size = parsed;
        }
    }
    if let Ok(val) = std::env::var("POLICYGUARD_MODEL") {
        info!(old = %config.llm.model, new = %val, "Overriding LLM model via ENV");
        config.llm.model = val;
    }
}
