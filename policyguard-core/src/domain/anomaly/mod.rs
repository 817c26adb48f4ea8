// policyguard-core/src/domain/anomaly/mod.rs

pub mod detector;
pub mod forest;

// Re-exports
pub use detector::{flag_anomalies, AnomalyConfig, REQUIRED_FEATURE_COLUMNS};
pub use forest::{IsolationForest, IsolationForestParams};
