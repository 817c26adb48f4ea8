// policyguard-core/src/domain/rules/engine.rs
//
// Applies extracted rules to a transaction table. A failing rule (bad
// syntax, missing column, type mismatch) is logged and skipped as a whole;
// it never aborts the run and never leaves partial row mutations behind.

use tracing::{debug, warn};

use crate::domain::rules::expr::{ExprError, Predicate};
use crate::domain::rules::spec::RuleSpec;
use crate::domain::table::{RuleHit, TransactionTable};

/// Evaluate one rule against every row. All-or-nothing: the mask is only
/// returned if every row evaluated cleanly.
fn evaluate_mask(table: &TransactionTable, rule: &RuleSpec) -> Result<Vec<bool>, ExprError> {
    let predicate = Predicate::compile(&rule.condition)?;
    predicate.check_columns(table)?;
    (0..table.len())
        .map(|row| predicate.matches(table, row))
        .collect()
}

/// Apply each rule, in list order, to every row of the table. Matching rows
/// accumulate the rule's name and description in their hit list. Column
/// names must already be normalized (spaces replaced by underscores).
pub fn apply_rules(table: &mut TransactionTable, rules: &[RuleSpec]) {
    // Re-scored input may carry the derived columns of a previous run;
    // they are output state, never rule input.
    table.drop_derived_columns();
    table.reset_violations();

    for rule in rules {
        let mask = match evaluate_mask(table, rule) {
            Ok(mask) => mask,
            Err(e) => {
                warn!(rule = %rule.name, error = %e, "Skipping rule");
                continue;
            }
        };

        let matched = mask.iter().filter(|m| **m).count();
        debug!(rule = %rule.name, matched, "Rule evaluated");

        let hit = RuleHit {
            name: rule.name.clone(),
            description: rule.description.clone(),
        };
        for (analysis, matches) in table.analysis_mut().iter_mut().zip(mask) {
            if matches {
                analysis.hits.push(hit.clone());
            }
        }
    }
}
