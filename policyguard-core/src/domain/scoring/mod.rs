// policyguard-core/src/domain/scoring/mod.rs
//
// Per-row risk aggregation. Pure function of the row's current state:
// no cross-row dependency, idempotent, safe to re-run on a scored table.

use serde::{Deserialize, Serialize};

use crate::domain::table::{TransactionTable, Value};

/// Weight for any rule violation on the row (nonempty hit list).
pub const RULE_VIOLATION_WEIGHT: u32 = 50;
/// Weight when an `Is_Suspicious` column is present and true.
pub const SUSPICIOUS_FLAG_WEIGHT: u32 = 20;
/// Weight when an `Amount` column is present and above the threshold.
pub const HIGH_AMOUNT_WEIGHT: u32 = 10;
/// Weight for a statistical anomaly flag.
pub const ANOMALY_WEIGHT: u32 = 20;

/// Amounts strictly above this add `HIGH_AMOUNT_WEIGHT`.
pub const HIGH_AMOUNT_THRESHOLD: f64 = 100_000.0;

/// Coarse risk bucket derived from the numeric score, nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Boundaries: `>= 80` High, `>= 50` Medium, else Low.
    pub fn from_score(score: u32) -> Self {
        if score >= 80 {
            RiskLevel::High
        } else if score >= 50 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Score one row given its current state. Missing optional columns
/// (`Is_Suspicious`, `Amount`) simply contribute nothing.
fn score_row(
    table: &TransactionTable,
    row: usize,
    suspicious_col: Option<usize>,
    amount_col: Option<usize>,
) -> u32 {
    let a = &table.analysis()[row];
    let mut score = 0;

    if !a.hits.is_empty() {
        score += RULE_VIOLATION_WEIGHT;
    }

    if let Some(col) = suspicious_col {
        // Python equality: True, 1 and 1.0 all count, anything else not.
        let flagged = match table.cell(row, col) {
            Value::Bool(b) => *b,
            other => other.as_f64() == Some(1.0),
        };
        if flagged {
            score += SUSPICIOUS_FLAG_WEIGHT;
        }
    }

    if let Some(col) = amount_col {
        if let Some(amount) = table.cell(row, col).as_f64() {
            if amount > HIGH_AMOUNT_THRESHOLD {
                score += HIGH_AMOUNT_WEIGHT;
            }
        }
    }

    if a.anomaly {
        score += ANOMALY_WEIGHT;
    }

    score
}

/// Compute `Risk_Score` and `Risk_Level` for every row.
pub fn score_table(table: &mut TransactionTable) {
    let suspicious_col = table.column_index("Is_Suspicious");
    let amount_col = table.column_index("Amount");

    let scores: Vec<u32> = (0..table.len())
        .map(|row| score_row(table, row, suspicious_col, amount_col))
        .collect();

    for (a, score) in table.analysis_mut().iter_mut().zip(scores) {
        a.risk_score = score;
        a.risk_level = RiskLevel::from_score(score);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::table::RuleHit;

    fn table_with(columns: Vec<&str>, rows: Vec<Vec<Value>>) -> TransactionTable {
        TransactionTable::new(columns.into_iter().map(String::from).collect(), rows).unwrap()
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(49), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(50), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(79), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(80), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::High);
    }

    #[test]
    fn test_weight_table() {
        let mut t = table_with(
            vec!["Is_Suspicious", "Amount"],
            vec![vec![Value::Bool(true), Value::Int(150_000)]],
        );
        t.analysis_mut()[0].hits.push(RuleHit {
            name: "R1".into(),
            description: "d".into(),
        });
        t.analysis_mut()[0].anomaly = true;
        score_table(&mut t);
        // 50 + 20 + 10 + 20
        assert_eq!(t.analysis()[0].risk_score, 100);
        assert_eq!(t.analysis()[0].risk_level, RiskLevel::High);
    }

    #[test]
    fn test_missing_optional_columns_contribute_nothing() {
        let mut t = table_with(vec!["Amount_Received"], vec![vec![Value::Int(15_000)]]);
        t.analysis_mut()[0].hits.push(RuleHit {
            name: "R1".into(),
            description: "d".into(),
        });
        score_table(&mut t);
        assert_eq!(t.analysis()[0].risk_score, 50);
        assert_eq!(t.analysis()[0].risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_amount_threshold_is_strict() {
        let mut t = table_with(
            vec!["Amount"],
            vec![
                vec![Value::Int(100_000)],
                vec![Value::Float(100_000.01)],
            ],
        );
        score_table(&mut t);
        assert_eq!(t.analysis()[0].risk_score, 0);
        assert_eq!(t.analysis()[1].risk_score, 10);
    }

    #[test]
    fn test_suspicious_flag_accepts_bool_and_numeric_one() {
        let mut t = table_with(
            vec!["Is_Suspicious"],
            vec![
                vec![Value::Str("true-ish".into())],
                vec![Value::Bool(true)],
                vec![Value::Int(1)],
                vec![Value::Int(0)],
                vec![Value::Float(1.0)],
                vec![Value::Int(2)],
            ],
        );
        score_table(&mut t);
        assert_eq!(t.analysis()[0].risk_score, 0);
        assert_eq!(t.analysis()[1].risk_score, SUSPICIOUS_FLAG_WEIGHT);
        assert_eq!(t.analysis()[2].risk_score, SUSPICIOUS_FLAG_WEIGHT);
        assert_eq!(t.analysis()[3].risk_score, 0);
        assert_eq!(t.analysis()[4].risk_score, SUSPICIOUS_FLAG_WEIGHT);
        assert_eq!(t.analysis()[5].risk_score, 0);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let mut t = table_with(
            vec!["Amount"],
            vec![vec![Value::Int(250_000)]],
        );
        t.analysis_mut()[0].anomaly = true;
        score_table(&mut t);
        let first = t.analysis()[0].clone();
        score_table(&mut t);
        assert_eq!(t.analysis()[0].risk_score, first.risk_score);
        assert_eq!(t.analysis()[0].risk_level, first.risk_level);
    }
}
