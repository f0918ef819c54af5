//! High-level pipeline API: upload bytes in, preview and workbook out.
//!
//! ```text
//! bytes ─▶ parse ─▶ normalize ─▶ aggregate ─┬─▶ preview
//!                                           └─▶ export (.xlsx bytes)
//! ```
//!
//! Every call runs from scratch on its arguments; nothing is kept between
//! calls.
//!
//! # Example
//!
//! ```rust,ignore
//! use percepciones::process_bytes;
//!
//! let bytes = std::fs::read("retenciones.xlsx")?;
//! let output = process_bytes(&bytes, "Juan Pérez")?;
//! println!("{}", output.preview.render_text());
//! std::fs::write(output.filename, &output.workbook)?;
//! ```

use serde::Serialize;
use std::path::Path;

use super::aggregate::aggregate;
use super::normalizer::normalize;
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::error::{PipelineResult, TypeCoercionError};
use crate::export::{build_workbook, EXPORT_FILENAME};
use crate::models::{SummaryRow, Table};
use crate::parser::{parse_bytes, parse_file, RawSheet};
use crate::preview::Preview;

/// Warnings printed individually before summarizing.
const MAX_LOGGED_WARNINGS: usize = 5;

/// Source sheet information.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetInfo {
    pub format: String,
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Result of a complete pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: Table,
    pub summary: SummaryRow,
    pub preview: Preview,
    /// `.xlsx` bytes ready for download.
    pub workbook: Vec<u8>,
    /// Filename offered for download.
    pub filename: &'static str,
    /// Amounts that could not be read and were left empty.
    pub warnings: Vec<TypeCoercionError>,
    pub sheet_info: SheetInfo,
}

/// Run the full pipeline on an uploaded spreadsheet.
pub fn process_bytes(bytes: &[u8], taxpayer: &str) -> PipelineResult<PipelineOutput> {
    log_info(format!("📖 Reading spreadsheet ({} bytes)...", bytes.len()));
    let sheet = parse_bytes(bytes)?;
    process_sheet(sheet, taxpayer)
}

/// Run the full pipeline on a spreadsheet file.
pub fn process_file(path: &Path, taxpayer: &str) -> PipelineResult<PipelineOutput> {
    log_info(format!("📖 Reading spreadsheet: {}", path.display()));
    let sheet = parse_file(path)?;
    process_sheet(sheet, taxpayer)
}

/// Run the pipeline on an already-parsed sheet.
pub fn process_sheet(sheet: RawSheet, taxpayer: &str) -> PipelineResult<PipelineOutput> {
    log_success(format!(
        "Sheet \"{}\" ({}): {} rows, {} columns",
        sheet.sheet_name,
        sheet.format.extension(),
        sheet.row_count(),
        sheet.headers.len()
    ));

    let sheet_info = SheetInfo {
        format: sheet.format.extension().to_string(),
        sheet_name: sheet.sheet_name.clone(),
        headers: sheet.headers.clone(),
        row_count: sheet.row_count(),
    };

    // Normalize
    log_info("🧹 Normalizing columns...");
    let normalized = normalize(&sheet)?;
    if !normalized.dropped.is_empty() {
        log_info_indent(format!("Dropped: {}", normalized.dropped.join(", ")), 1);
    }
    for (source, canonical) in &normalized.renamed {
        log_info_indent(format!("{} → {}", source, canonical), 1);
    }
    if !normalized.ignored.is_empty() {
        log_warning(format!("Ignored columns: {}", normalized.ignored.join(", ")));
    }
    log_warnings(&normalized.warnings);
    log_success(format!("{} records normalized", normalized.records.len()));

    // Sort and total
    log_info("📅 Sorting by date...");
    let table = aggregate(normalized.records)?;
    let summary = table.summary();
    match table.period_label() {
        Some(period) => log_success(format!("Period: {}", period)),
        None => log_warning("No dated records: period label left empty"),
    }

    // Preview and export
    let preview = Preview::build(taxpayer, &table);
    log_success(format!("Total: {}", preview.total));

    log_info("📊 Building workbook...");
    let workbook = build_workbook(taxpayer, &table)?;
    log_success(format!("{} ready ({} bytes)", EXPORT_FILENAME, workbook.len()));

    Ok(PipelineOutput {
        table,
        summary,
        preview,
        workbook,
        filename: EXPORT_FILENAME,
        warnings: normalized.warnings,
        sheet_info,
    })
}

fn log_warnings(warnings: &[TypeCoercionError]) {
    if warnings.is_empty() {
        return;
    }
    log_warning(format!("{} cells could not be read and were left empty", warnings.len()));
    for warning in warnings.iter().take(MAX_LOGGED_WARNINGS) {
        log_info_indent(warning.to_string(), 1);
    }
    if warnings.len() > MAX_LOGGED_WARNINGS {
        log_info_indent(format!("... +{}", warnings.len() - MAX_LOGGED_WARNINGS), 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AggregateError, ExportError, NormalizeError, ParseError, PipelineError};
    use crate::export::SHEET_NAME;
    use crate::test_support::{
        sample_rows, source_workbook, source_workbook_with_headers, Cell, SourceRow,
    };
    use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
    use rust_decimal::Decimal;
    use std::io::{Cursor, Write};
    use std::str::FromStr;
    use tempfile::NamedTempFile;

    #[test]
    fn test_three_row_round_trip() {
        let bytes = source_workbook(&sample_rows());
        let output = process_bytes(&bytes, "Juan Pérez").unwrap();

        let dates: Vec<String> = output.table.records().iter().map(|r| r.date_text()).collect();
        assert_eq!(dates, vec!["28/02/2024", "01/03/2024", "15/03/2024"]);
        assert_eq!(output.table.period_label().unwrap().to_string(), "02-2024");
        assert_eq!(output.summary.amount, Decimal::from_str("425.75").unwrap());
        assert_eq!(output.preview.total, "425.75");
        assert_eq!(output.filename, "datos_procesados.xlsx");
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_row_count_preserved() {
        let rows: Vec<SourceRow> = (1..=25)
            .map(|d| {
                let date = if d % 2 == 0 { "02/01/2024" } else { "01/01/2024" };
                SourceRow::new(Cell::Text(date), Cell::Number(d as f64))
            })
            .collect();
        let output = process_bytes(&source_workbook(&rows), "x").unwrap();

        assert_eq!(output.sheet_info.row_count, 25);
        assert_eq!(output.table.len(), 25);
        assert_eq!(output.preview.record_count, 25);
        assert_eq!(output.preview.rows.len(), 26);
    }

    #[test]
    fn test_leading_zeros_in_preview_and_export() {
        let output = process_bytes(&source_workbook(&sample_rows()), "x").unwrap();

        let last = &output.preview.rows[2];
        assert_eq!(last.cells[0], "00123456");
        assert_eq!(last.cells[3], "00123456");

        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(output.workbook)).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(range.get_value((7, 0)), Some(&Data::String("00123456".into())));
        assert_eq!(range.get_value((7, 3)), Some(&Data::String("00123456".into())));
    }

    #[test]
    fn test_export_formula_matches_preview_total() {
        let output = process_bytes(&source_workbook(&sample_rows()), "x").unwrap();

        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(output.workbook)).unwrap();
        let formulas = workbook.worksheet_formula(SHEET_NAME).unwrap();
        assert_eq!(
            formulas.get_value((8, 5)).map(|f| f.trim_start_matches('=')),
            Some("SUM(F5:F8)")
        );
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(range.get_value((8, 5)), Some(&Data::Float(425.75)));
    }

    #[test]
    fn test_rounding_before_summing() {
        let rows = vec![
            SourceRow::new(Cell::Text("01/01/2024"), Cell::Number(100.005)),
            SourceRow::new(Cell::Text("02/01/2024"), Cell::Number(200.004)),
            SourceRow::new(Cell::Text("03/01/2024"), Cell::Number(50.001)),
        ];
        let output = process_bytes(&source_workbook(&rows), "x").unwrap();

        // Half-to-even: 100.005 → 100.00, so the total is 350.00, not 350.01.
        assert_eq!(output.summary.amount, Decimal::from_str("350.00").unwrap());
    }

    #[test]
    fn test_all_amounts_non_numeric() {
        let rows = vec![
            SourceRow::new(Cell::Text("01/01/2024"), Cell::Text("-")),
            SourceRow::new(Cell::Text("02/01/2024"), Cell::Text("s/d")),
        ];
        let output = process_bytes(&source_workbook(&rows), "x").unwrap();

        assert_eq!(output.table.len(), 2);
        assert_eq!(output.summary.amount, Decimal::ZERO);
        assert_eq!(output.preview.total, "0.00");
        assert_eq!(output.warnings.len(), 2);
    }

    #[test]
    fn test_empty_table() {
        let output = process_bytes(&source_workbook(&[]), "x").unwrap();

        assert!(output.table.is_empty());
        assert!(output.table.period_label().is_none());
        assert_eq!(output.preview.subtitle, "PERCEPCIONES IVA");
        assert!(!output.workbook.is_empty());
    }

    #[test]
    fn test_total_overflow_is_reported() {
        let max = "79228162514264337593543950335";
        let rows = vec![
            SourceRow::new(Cell::Text("01/01/2024"), Cell::Text(max)),
            SourceRow::new(Cell::Text("02/01/2024"), Cell::Text(max)),
        ];
        let result = process_bytes(&source_workbook(&rows), "x");

        match result {
            Err(err @ PipelineError::Aggregate(AggregateError::TotalOverflow { count: 2 })) => {
                assert!(err.user_message().starts_with("Error al leer el archivo: Total"));
            }
            other => panic!("expected overflow error, got {:?}", other.map(|o| o.table.len())),
        }
    }

    #[test]
    fn test_blank_date_row_kept_and_sorted_last() {
        let rows = vec![
            SourceRow::new(Cell::Empty, Cell::Number(5.0)),
            SourceRow::new(Cell::Text("01/01/2024"), Cell::Number(10.0)),
        ];
        let output = process_bytes(&source_workbook(&rows), "x").unwrap();

        assert_eq!(output.table.len(), 2);
        assert_eq!(output.preview.rows[0].cells[2], "01/01/2024");
        assert_eq!(output.preview.rows[1].cells[2], "");
        assert_eq!(output.summary.amount, Decimal::from_str("15").unwrap());
        assert_eq!(output.table.period_label().unwrap().to_string(), "01-2024");
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].row, 2);
    }

    #[test]
    fn test_date_before_1900_fails_export() {
        let rows = vec![SourceRow::new(Cell::Text("01/01/1899"), Cell::Number(1.0))];
        let result = process_bytes(&source_workbook(&rows), "x");

        match result {
            Err(err @ PipelineError::Export(ExportError::DateOutOfRange(_))) => {
                assert_eq!(
                    err.user_message(),
                    "Error al leer el archivo: Date out of range for Excel: 01/01/1899"
                );
            }
            other => panic!("expected export error, got {:?}", other.map(|o| o.table.len())),
        }
    }

    #[test]
    fn test_not_a_spreadsheet() {
        let result = process_bytes(b"hello", "x");
        assert!(matches!(result, Err(PipelineError::Parse(ParseError::UnsupportedFormat))));
    }

    #[test]
    fn test_missing_columns() {
        let bytes = source_workbook_with_headers(&["Impuesto", "Régimen"], &sample_rows());
        let result = process_bytes(&bytes, "x");
        assert!(matches!(result, Err(PipelineError::Normalize(NormalizeError::Schema(_)))));
    }

    #[test]
    fn test_process_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(&source_workbook(&sample_rows())).unwrap();

        let output = process_file(temp_file.path(), "x").unwrap();
        assert_eq!(output.sheet_info.format, "xlsx");
        assert_eq!(output.table.len(), 3);
    }
}
