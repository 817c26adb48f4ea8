// policyguard/src/commands/inspect.rs
//
// USE CASE: Preview the first rows of a CSV as a terminal table.

use std::path::PathBuf;

use anyhow::Context;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use policyguard_core::infrastructure::tabular::ChunkedCsvReader;

pub fn execute(transactions: PathBuf, limit: usize) -> anyhow::Result<()> {
    // A chunk of `limit` rows reads exactly the preview we need.
    let mut reader = ChunkedCsvReader::open(&transactions, limit.max(1))
        .with_context(|| format!("Failed to open {:?}", transactions))?;

    println!("\n🔍 Inspecting: '{}'", transactions.display());
    println!("   Columns: [{}]", reader.headers().join(", "));

    let chunk = reader
        .next_chunk()
        .with_context(|| format!("Failed to read {:?}", transactions))?;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(reader.headers());

    let shown = match &chunk {
        Some(chunk) => {
            for row in 0..chunk.len() {
                let cells: Vec<String> = (0..chunk.columns().len())
                    .map(|col| chunk.cell(row, col).render())
                    .collect();
                table.add_row(cells);
            }
            chunk.len()
        }
        None => 0,
    };

    println!("{table}");
    println!("   ➜ {} rows shown (limit {})", shown, limit);
    Ok(())
}
