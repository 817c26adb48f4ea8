// policyguard-core/src/domain/anomaly/detector.rs
//
// Batch-relative anomaly flagging. The forest is fit on the batch it
// scores, so a row's flag depends on the distribution of its own chunk,
// never on the rest of the dataset. Deliberate: chunked processing keeps
// memory bounded, and the chunk size knob lets a caller force a single
// whole-dataset batch if that is what they want.

use std::cmp::Ordering;

use tracing::debug;

use crate::domain::anomaly::forest::{IsolationForest, IsolationForestParams};
use crate::domain::table::TransactionTable;

/// Both must be present (after normalization) for the detector to run.
pub const REQUIRED_FEATURE_COLUMNS: [&str; 2] = ["Amount_Received", "Amount_Paid"];

#[derive(Debug, Clone)]
pub struct AnomalyConfig {
    /// Fraction of the batch to flag, e.g. 0.05 for the top 5%.
    pub contamination: f64,
    pub seed: u64,
    pub trees: usize,
    pub max_samples: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            contamination: 0.05,
            seed: 42,
            trees: 100,
            max_samples: 256,
        }
    }
}

/// Fit an isolation forest on the batch's two amount columns and flag the
/// `ceil(contamination * n)` most anomalous rows. If either feature column
/// is missing every flag stays false and the table is otherwise untouched.
pub fn flag_anomalies(table: &mut TransactionTable, config: &AnomalyConfig) {
    for analysis in table.analysis_mut() {
        analysis.anomaly = false;
    }

    let feature_cols: Vec<usize> = match REQUIRED_FEATURE_COLUMNS
        .iter()
        .map(|name| table.column_index(name))
        .collect()
    {
        Some(cols) => cols,
        None => {
            debug!(
                required = ?REQUIRED_FEATURE_COLUMNS,
                "Feature columns missing, anomaly detection skipped"
            );
            return;
        }
    };

    let n = table.len();
    if n < 2 {
        return;
    }
    let flagged = ((config.contamination * n as f64).ceil() as usize).min(n);
    if flagged == 0 {
        return;
    }

    // Missing or non-numeric amounts count as zero, like fillna(0).
    let features: Vec<Vec<f64>> = (0..n)
        .map(|row| {
            feature_cols
                .iter()
                .map(|&col| table.cell(row, col).as_f64().unwrap_or(0.0))
                .collect()
        })
        .collect();

    let params = IsolationForestParams {
        trees: config.trees,
        max_samples: config.max_samples,
        seed: config.seed,
    };
    let forest = IsolationForest::fit(&features, &params);
    let scores = forest.score_samples(&features);

    // Top scores win; ties break on row index so the result is deterministic.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.cmp(&b))
    });

    let analysis = table.analysis_mut();
    for &row in order.iter().take(flagged) {
        analysis[row].anomaly = true;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::table::Value;

    fn amounts_table(rows: Vec<(Value, Value)>) -> TransactionTable {
        TransactionTable::new(
            vec!["Amount_Received".into(), "Amount_Paid".into()],
            rows.into_iter().map(|(a, b)| vec![a, b]).collect(),
        )
        .unwrap()
    }

    fn cluster(n: usize) -> Vec<(Value, Value)> {
        (0..n)
            .map(|i| {
                let jitter = (i % 5) as i64 * 10;
                (Value::Int(10_000 + jitter), Value::Int(9_900 + jitter))
            })
            .collect()
    }

    #[test]
    fn test_extreme_row_gets_flagged() {
        let mut rows = cluster(60);
        rows.push((Value::Int(5_000_000), Value::Int(5_100_000)));
        let mut t = amounts_table(rows);
        flag_anomalies(&mut t, &AnomalyConfig::default());
        assert!(t.analysis()[60].anomaly);
        // 5% of 61 rows, rounded up.
        let count = t.analysis().iter().filter(|a| a.anomaly).count();
        assert_eq!(count, 4);
    }

    #[test]
    fn test_null_amounts_are_treated_as_zero() {
        let mut rows = cluster(40);
        rows.push((Value::Null, Value::Null));
        let mut t = amounts_table(rows);
        flag_anomalies(&mut t, &AnomalyConfig::default());
        // The (0, 0) point sits far from the cluster and must be flagged.
        assert!(t.analysis()[40].anomaly);
    }

    #[test]
    fn test_missing_feature_column_skips_detection() {
        let mut t = TransactionTable::new(
            vec!["Amount_Received".into()],
            (0..50).map(|i| vec![Value::Int(i)]).collect(),
        )
        .unwrap();
        flag_anomalies(&mut t, &AnomalyConfig::default());
        assert!(t.analysis().iter().all(|a| !a.anomaly));
    }

    #[test]
    fn test_tiny_batches_are_left_alone() {
        let mut t = amounts_table(cluster(1));
        flag_anomalies(&mut t, &AnomalyConfig::default());
        assert!(!t.analysis()[0].anomaly);
    }

    #[test]
    fn test_fixed_seed_is_deterministic_per_batch() {
        let mut rows = cluster(50);
        rows.push((Value::Int(900_000), Value::Int(880_000)));
        let config = AnomalyConfig::default();

        let mut a = amounts_table(rows.clone());
        flag_anomalies(&mut a, &config);
        let mut b = amounts_table(rows);
        flag_anomalies(&mut b, &config);

        let flags_a: Vec<bool> = a.analysis().iter().map(|x| x.anomaly).collect();
        let flags_b: Vec<bool> = b.analysis().iter().map(|x| x.anomaly).collect();
        assert_eq!(flags_a, flags_b);
    }

    #[test]
    fn test_rerun_clears_stale_flags() {
        let mut rows = cluster(50);
        rows.push((Value::Int(900_000), Value::Int(880_000)));
        let mut t = amounts_table(rows);
        flag_anomalies(&mut t, &AnomalyConfig::default());
        let first: Vec<bool> = t.analysis().iter().map(|x| x.anomaly).collect();
        flag_anomalies(&mut t, &AnomalyConfig::default());
        let second: Vec<bool> = t.analysis().iter().map(|x| x.anomaly).collect();
        assert_eq!(first, second);
    }
}
