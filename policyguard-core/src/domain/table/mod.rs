// policyguard-core/src/domain/table/mod.rs
//
// In-memory transaction table: ordered columns, dynamically typed cells,
// plus the per-row analysis state the pipeline accumulates (rule hits,
// anomaly flag, risk score). Analysis state is structured rather than a
// concatenated string; the legacy `Violated_Rule` / `Violation_Reason`
// columns are derived at the export boundary.

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::scoring::RiskLevel;

/// A single table cell. Missing values are `Null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Value {
    /// Infer a typed cell from a raw CSV field.
    /// Order matters: int before float, bool before string.
    pub fn infer(raw: &str) -> Value {
        if raw.is_empty() {
            return Value::Null;
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Value::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return Value::Float(f);
        }
        if raw.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        Value::Str(raw.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the cell, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Render the cell the way the exported CSV expects it.
    /// Booleans keep the `True`/`False` spelling of the upstream reports.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Str(s) => s.clone(),
        }
    }
}

/// One matched rule on one row, in rule-list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleHit {
    pub name: String,
    pub description: String,
}

/// Pipeline-accumulated state for a single row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowAnalysis {
    pub hits: Vec<RuleHit>,
    pub anomaly: bool,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
}

/// Columns appended to the exported table, in append order.
pub const DERIVED_COLUMNS: [&str; 5] = [
    "Violated_Rule",
    "Violation_Reason",
    "Anomaly_Flag",
    "Risk_Score",
    "Risk_Level",
];

#[derive(Debug, Clone)]
pub struct TransactionTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    analysis: Vec<RowAnalysis>,
}

impl TransactionTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, DomainError> {
        let width = columns.len();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(DomainError::MalformedTable(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    width
                )));
            }
        }
        let analysis = vec![RowAnalysis::default(); rows.len()];
        Ok(Self {
            columns,
            rows,
            analysis,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> &Value {
        &self.rows[row][col]
    }

    pub fn analysis(&self) -> &[RowAnalysis] {
        &self.analysis
    }

    pub fn analysis_mut(&mut self) -> &mut [RowAnalysis] {
        &mut self.analysis
    }

    /// Replace spaces with underscores in column names.
    /// Must run exactly once, before any rule condition is evaluated;
    /// normalized names are canonical from that point on.
    pub fn normalize_columns(&mut self) {
        for col in &mut self.columns {
            if col.contains(' ') {
                *col = col.replace(' ', "_");
            }
        }
    }

    /// Reset the per-row violation state. Called at rule-engine entry so a
    /// re-run never sees stale hits.
    pub fn reset_violations(&mut self) {
        for a in &mut self.analysis {
            a.hits.clear();
        }
    }

    /// Remove source columns that collide with the derived output columns.
    /// A re-ingested scored CSV would otherwise keep its stale violation
    /// text and grow duplicate headers on the next export.
    pub fn drop_derived_columns(&mut self) {
        let drop: Vec<bool> = self
            .columns
            .iter()
            .map(|c| DERIVED_COLUMNS.contains(&c.as_str()))
            .collect();
        if !drop.iter().any(|&d| d) {
            return;
        }
        self.columns = self
            .columns
            .iter()
            .zip(&drop)
            .filter(|(_, &d)| !d)
            .map(|(c, _)| c.clone())
            .collect();
        for row in &mut self.rows {
            let mut i = 0;
            row.retain(|_| {
                let d = drop[i];
                i += 1;
                !d
            });
        }
    }

    /// Concatenate chunk outputs in original order. All chunks must share
    /// the same schema.
    pub fn concat(chunks: Vec<TransactionTable>) -> Result<TransactionTable, DomainError> {
        let mut iter = chunks.into_iter();
        let mut merged = match iter.next() {
            Some(first) => first,
            None => {
                return Ok(TransactionTable {
                    columns: Vec::new(),
                    rows: Vec::new(),
                    analysis: Vec::new(),
                })
            }
        };
        for chunk in iter {
            if chunk.columns != merged.columns {
                return Err(DomainError::SchemaMismatch(format!(
                    "expected {:?}, found {:?}",
                    merged.columns, chunk.columns
                )));
            }
            merged.rows.extend(chunk.rows);
            merged.analysis.extend(chunk.analysis);
        }
        Ok(merged)
    }

    /// Keep only rows with at least one rule violation or an anomaly flag.
    pub fn filter_high_risk(&self) -> TransactionTable {
        let mut rows = Vec::new();
        let mut analysis = Vec::new();
        for (row, a) in self.rows.iter().zip(&self.analysis) {
            if !a.hits.is_empty() || a.anomaly {
                rows.push(row.clone());
                analysis.push(a.clone());
            }
        }
        TransactionTable {
            columns: self.columns.clone(),
            rows,
            analysis,
        }
    }

    /// `"<name>; "` per hit, accumulated in rule-list order. Empty iff the
    /// row matched no rule.
    pub fn violated_rule_field(&self, row: usize) -> String {
        self.analysis[row]
            .hits
            .iter()
            .map(|h| format!("{}; ", h.name))
            .collect()
    }

    /// Same accumulation with rule descriptions.
    pub fn violation_reason_field(&self, row: usize) -> String {
        self.analysis[row]
            .hits
            .iter()
            .map(|h| format!("{}; ", h.description))
            .collect()
    }

    /// Source columns followed by the five pipeline-added columns.
    pub fn export_header(&self) -> Vec<String> {
        let mut header = self.columns.clone();
        header.extend(DERIVED_COLUMNS.iter().map(|c| c.to_string()));
        header
    }

    /// One exported row: rendered source cells plus the derived columns.
    pub fn export_row(&self, row: usize) -> Vec<String> {
        let a = &self.analysis[row];
        let mut out: Vec<String> = self.rows[row].iter().map(Value::render).collect();
        out.push(self.violated_rule_field(row));
        out.push(self.violation_reason_field(row));
        out.push(if a.anomaly { "True" } else { "False" }.to_string());
        out.push(a.risk_score.to_string());
        out.push(a.risk_level.as_str().to_string());
        out
    }
}
