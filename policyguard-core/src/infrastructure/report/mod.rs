// policyguard-core/src/infrastructure/report/mod.rs
//
// PDF rendering for the high-risk transactions report. Landscape A4 with
// a title, a summary block and a row table capped at `max_rows` for
// readability; wide tables get more pages, not smaller text.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};
use serde::Serialize;

use crate::infrastructure::error::InfrastructureError;

const PAGE_WIDTH_MM: f32 = 297.0;
const PAGE_HEIGHT_MM: f32 = 210.0;
const MARGIN_MM: f32 = 12.0;
const TITLE_SIZE_PT: f32 = 18.0;
const BODY_SIZE_PT: f32 = 10.0;
const TABLE_SIZE_PT: f32 = 6.0;
const LINE_STEP_MM: f32 = 4.0;
const CELL_CHARS: usize = 18;

/// Headline counts shown at the top of the report.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ReportSummary {
    pub total_transactions: usize,
    pub rule_violations: usize,
    pub anomalies: usize,
}

/// Render the report as PDF bytes.
///
/// `rows` are pre-rendered cell strings in export order; the first
/// `max_rows` of them are shown.
pub fn render_pdf_report(
    summary: &ReportSummary,
    headers: &[String],
    rows: &[Vec<String>],
    max_rows: usize,
) -> Result<Vec<u8>, InfrastructureError> {
    let (doc, page, layer) = PdfDocument::new(
        "PolicyGuard High Risk Transactions Report",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| InfrastructureError::Report(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| InfrastructureError::Report(e.to_string()))?;
    let mono = doc
        .add_builtin_font(BuiltinFont::Courier)
        .map_err(|e| InfrastructureError::Report(e.to_string()))?;

    let mut current = doc.get_page(page).get_layer(layer);
    let mut cursor_mm = PAGE_HEIGHT_MM - MARGIN_MM;

    current.use_text(
        "PolicyGuard - High Risk Transactions Report",
        TITLE_SIZE_PT,
        Mm(MARGIN_MM),
        Mm(cursor_mm),
        &bold,
    );
    cursor_mm -= 3.0 * LINE_STEP_MM;

    for line in [
        format!("Total Transactions: {}", summary.total_transactions),
        format!("Total Rule Violations: {}", summary.rule_violations),
        format!("Total Anomalies Detected: {}", summary.anomalies),
    ] {
        current.use_text(line, BODY_SIZE_PT, Mm(MARGIN_MM), Mm(cursor_mm), &regular);
        cursor_mm -= 1.5 * LINE_STEP_MM;
    }
    cursor_mm -= LINE_STEP_MM;

    write_table_line(&current, headers, cursor_mm, &bold);
    cursor_mm -= LINE_STEP_MM;

    for row in rows.iter().take(max_rows) {
        if cursor_mm < MARGIN_MM {
            let (next_page, next_layer) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            current = doc.get_page(next_page).get_layer(next_layer);
            cursor_mm = PAGE_HEIGHT_MM - MARGIN_MM;
            write_table_line(&current, headers, cursor_mm, &bold);
            cursor_mm -= LINE_STEP_MM;
        }
        write_table_line(&current, row, cursor_mm, &mono);
        cursor_mm -= LINE_STEP_MM;
    }

    doc.save_to_bytes()
        .map_err(|e| InfrastructureError::Report(e.to_string()))
}

fn write_table_line(
    layer: &PdfLayerReference,
    cells: &[String],
    y_mm: f32,
    font: &IndirectFontRef,
) {
    let usable_mm = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
    let column_mm = if cells.is_empty() {
        usable_mm
    } else {
        usable_mm / cells.len() as f32
    };
    for (i, cell) in cells.iter().enumerate() {
        let text: String = cell.chars().take(CELL_CHARS).collect();
        layer.use_text(
            text,
            TABLE_SIZE_PT,
            Mm(MARGIN_MM + i as f32 * column_mm),
            Mm(y_mm),
            font,
        );
    }
}
