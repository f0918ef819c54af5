//! Column normalizer.
//!
//! Turns the raw first sheet of an ARCA export into typed [`Record`]s:
//!
//! ```text
//! RawSheet ──drop──▶ ──rename──▶ ──coerce──▶ Vec<Record> (canonical order)
//! ```
//!
//! Dropping is lenient (absent columns are ignored). After renaming, every
//! canonical column must be present or the run fails with a [`SchemaError`].

use calamine::Data;
use std::collections::HashMap;

use super::coerce::{cell_text, parse_amount, parse_date};
use crate::error::{NormalizeResult, SchemaError, TypeCoercionError};
use crate::models::{Column, Record};
use crate::parser::{RawRow, RawSheet};

/// Source columns removed before renaming.
pub const DROPPED_COLUMNS: [&str; 8] = [
    "Impuesto",
    "Descripción Impuesto",
    "Régimen",
    "Número Certificado",
    "Descripción Régimen",
    "Descripción Operación",
    "Fecha Registración DJ Ag.Ret.",
    "Fecha Comprobante",
];

/// Source label → canonical column.
pub const RENAMED_COLUMNS: [(&str, Column); 6] = [
    ("Número Comprobante", Column::NroComprobante),
    ("Importe Ret./Perc.", Column::Importe),
    ("CUIT Agente Ret./Perc.", Column::Cuit),
    ("Fecha Ret./Perc.", Column::Fecha),
    ("Denominación o Razón Social", Column::RazonSocial),
    ("Descripción Comprobante", Column::Comprobante),
];

static EMPTY_CELL: Data = Data::Empty;

/// Output of [`normalize`].
#[derive(Debug, Clone)]
pub struct Normalized {
    /// Records in source order.
    pub records: Vec<Record>,
    /// Non-fatal coercion failures (amounts and dates that became missing).
    pub warnings: Vec<TypeCoercionError>,
    /// Dropped columns that were actually present.
    pub dropped: Vec<String>,
    /// Renames that were applied, `(source, canonical)`.
    pub renamed: Vec<(String, String)>,
    /// Source columns neither dropped nor mapped.
    pub ignored: Vec<String>,
}

/// Where each canonical column lives in the source sheet.
#[derive(Debug, Clone)]
struct ColumnPlan {
    positions: HashMap<Column, usize>,
    dropped: Vec<String>,
    renamed: Vec<(String, String)>,
    ignored: Vec<String>,
}

impl ColumnPlan {
    fn build(headers: &[String]) -> Result<Self, SchemaError> {
        let mut positions = HashMap::new();
        let mut dropped = Vec::new();
        let mut renamed = Vec::new();
        let mut ignored = Vec::new();

        for (idx, header) in headers.iter().enumerate() {
            if DROPPED_COLUMNS.contains(&header.as_str()) {
                dropped.push(header.clone());
                continue;
            }

            let column = match RENAMED_COLUMNS.iter().find(|(source, _)| source == header) {
                Some((source, column)) => {
                    renamed.push((source.to_string(), column.label().to_string()));
                    Some(*column)
                }
                None => Column::from_label(header),
            };

            match column {
                // First occurrence wins on duplicate headers.
                Some(column) => {
                    positions.entry(column).or_insert(idx);
                }
                None => ignored.push(header.clone()),
            }
        }

        let missing: Vec<String> = Column::ALL
            .iter()
            .filter(|c| !positions.contains_key(*c))
            .map(|c| c.label().to_string())
            .collect();

        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns(missing));
        }

        Ok(Self {
            positions,
            dropped,
            renamed,
            ignored,
        })
    }

    fn cell<'a>(&self, row: &'a RawRow, column: Column) -> &'a Data {
        self.positions
            .get(&column)
            .and_then(|&idx| row.cells.get(idx))
            .unwrap_or(&EMPTY_CELL)
    }
}

/// Drop, rename and coerce the raw sheet into typed records.
///
/// Row count is preserved. An unreadable amount or a blank date becomes
/// `None` and is reported in [`Normalized::warnings`]. A non-empty date that
/// cannot be read aborts with a [`TypeCoercionError`] since it is the sort
/// key.
pub fn normalize(sheet: &RawSheet) -> NormalizeResult<Normalized> {
    let plan = ColumnPlan::build(&sheet.headers)?;

    let mut records = Vec::with_capacity(sheet.rows.len());
    let mut warnings = Vec::new();

    for row in &sheet.rows {
        let date_cell = plan.cell(row, Column::Fecha);
        let date = if is_empty_cell(date_cell) {
            warnings.push(TypeCoercionError::new(
                row.line,
                Column::Fecha.label(),
                "",
                "empty date, sorted last",
            ));
            None
        } else {
            let date = parse_date(date_cell).ok_or_else(|| {
                TypeCoercionError::new(
                    row.line,
                    Column::Fecha.label(),
                    cell_text(date_cell),
                    "not a valid day-first date",
                )
            })?;
            Some(date)
        };

        let amount_cell = plan.cell(row, Column::Importe);
        let amount = parse_amount(amount_cell);
        if amount.is_none() {
            warnings.push(TypeCoercionError::new(
                row.line,
                Column::Importe.label(),
                cell_text(amount_cell),
                "not a number, left empty",
            ));
        }

        records.push(Record {
            tax_id: cell_text(plan.cell(row, Column::Cuit)),
            counterparty_name: cell_text(plan.cell(row, Column::RazonSocial)),
            date,
            voucher_number: cell_text(plan.cell(row, Column::NroComprobante)),
            voucher_description: cell_text(plan.cell(row, Column::Comprobante)),
            amount,
        });
    }

    Ok(Normalized {
        records,
        warnings,
        dropped: plan.dropped,
        renamed: plan.renamed,
        ignored: plan.ignored,
    })
}

fn is_empty_cell(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NormalizeError;
    use crate::parser::{parse_bytes, SpreadsheetFormat};
    use crate::test_support::{
        sample_rows, source_workbook, source_workbook_with_headers, Cell, SourceRow,
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn sheet(headers: &[&str], rows: Vec<Vec<Data>>) -> RawSheet {
        RawSheet {
            format: SpreadsheetFormat::Xlsx,
            sheet_name: "Sheet1".into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .into_iter()
                .enumerate()
                .map(|(i, cells)| RawRow { line: i + 2, cells })
                .collect(),
        }
    }

    fn text(s: &str) -> Data {
        Data::String(s.into())
    }

    #[test]
    fn test_full_export_normalizes() {
        let raw = parse_bytes(&source_workbook(&sample_rows())).unwrap();
        let result = normalize(&raw).unwrap();

        assert_eq!(result.records.len(), 3);
        assert_eq!(result.dropped.len(), DROPPED_COLUMNS.len());
        assert_eq!(result.renamed.len(), 6);
        assert!(result.ignored.is_empty());
        assert!(result.warnings.is_empty());

        let first = &result.records[0];
        assert_eq!(first.tax_id, "00123456");
        assert_eq!(first.voucher_number, "00123456");
        assert_eq!(first.counterparty_name, "DISTRIBUIDORA NORTE SRL");
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(first.amount, Some(Decimal::from_str("100.00").unwrap()));

        let second = &result.records[1];
        assert_eq!(second.tax_id, "30500010912");
        assert_eq!(second.voucher_number, "4512");
        assert_eq!(second.date, NaiveDate::from_ymd_opt(2024, 3, 1));

        let third = &result.records[2];
        assert_eq!(third.amount, Some(Decimal::from_str("75.25").unwrap()));
    }

    #[test]
    fn test_absent_drop_columns_are_not_errors() {
        let raw = sheet(
            &[
                "CUIT Agente Ret./Perc.",
                "Denominación o Razón Social",
                "Fecha Ret./Perc.",
                "Número Comprobante",
                "Descripción Comprobante",
                "Importe Ret./Perc.",
            ],
            vec![vec![
                text("20111111112"),
                text("ACME"),
                text("05/01/2024"),
                text("1"),
                text("Factura A"),
                Data::Float(10.0),
            ]],
        );

        let result = normalize(&raw).unwrap();
        assert!(result.dropped.is_empty());
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn test_canonical_headers_accepted_as_is() {
        let raw = sheet(
            &["Importe", "Fecha", "CUIT", "Razón Social", "Nro Comprobante", "Comprobante"],
            vec![vec![
                Data::Float(1.5),
                text("2024-01-05"),
                text("0020"),
                text("ACME"),
                text("007"),
                text("Factura C"),
            ]],
        );

        let result = normalize(&raw).unwrap();
        assert!(result.renamed.is_empty());
        assert_eq!(result.records[0].tax_id, "0020");
        assert_eq!(result.records[0].voucher_number, "007");
    }

    #[test]
    fn test_missing_columns_is_schema_error() {
        let bytes = source_workbook_with_headers(
            &["CUIT Agente Ret./Perc.", "Impuesto", "Importe Ret./Perc."],
            &sample_rows(),
        );
        let raw = parse_bytes(&bytes).unwrap();

        match normalize(&raw) {
            Err(NormalizeError::Schema(SchemaError::MissingColumns(missing))) => {
                assert_eq!(
                    missing,
                    vec!["Razón Social", "Fecha", "Nro Comprobante", "Comprobante"]
                );
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_amount_degrades_to_missing() {
        let rows = vec![
            SourceRow::new(Cell::Text("01/03/2024"), Cell::Text("sin dato")),
            SourceRow::new(Cell::Text("02/03/2024"), Cell::Empty),
            SourceRow::new(Cell::Text("03/03/2024"), Cell::Number(12.345)),
        ];
        let raw = parse_bytes(&source_workbook(&rows)).unwrap();
        let result = normalize(&raw).unwrap();

        assert_eq!(result.records.len(), 3);
        assert_eq!(result.records[0].amount, None);
        assert_eq!(result.records[1].amount, None);
        assert_eq!(result.records[2].amount, Some(Decimal::from_str("12.34").unwrap()));

        assert_eq!(result.warnings.len(), 2);
        assert_eq!(result.warnings[0].row, 2);
        assert_eq!(result.warnings[0].value, "sin dato");
    }

    #[test]
    fn test_bad_date_is_coercion_error() {
        let rows = vec![
            SourceRow::new(Cell::Text("01/03/2024"), Cell::Number(1.0)),
            SourceRow::new(Cell::Text("no es fecha"), Cell::Number(2.0)),
        ];
        let raw = parse_bytes(&source_workbook(&rows)).unwrap();

        match normalize(&raw) {
            Err(NormalizeError::Coercion(err)) => {
                assert_eq!(err.row, 3);
                assert_eq!(err.column, "Fecha");
                assert_eq!(err.value, "no es fecha");
            }
            other => panic!("expected coercion error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_date_keeps_row() {
        let rows = vec![
            SourceRow::new(Cell::Text("01/01/2024"), Cell::Number(10.0)),
            SourceRow::new(Cell::Empty, Cell::Number(5.0)),
            SourceRow::new(Cell::Text("  "), Cell::Number(1.0)),
        ];
        let raw = parse_bytes(&source_workbook(&rows)).unwrap();
        let result = normalize(&raw).unwrap();

        assert_eq!(result.records.len(), 3);
        assert_eq!(result.records[1].date, None);
        assert_eq!(result.records[2].date, None);
        assert_eq!(result.records[1].amount, Some(Decimal::from_str("5").unwrap()));

        assert_eq!(result.warnings.len(), 2);
        assert_eq!(result.warnings[0].row, 3);
        assert_eq!(result.warnings[0].column, "Fecha");
    }

    #[test]
    fn test_extra_columns_ignored() {
        let mut headers: Vec<&str> = crate::test_support::SOURCE_HEADERS.to_vec();
        headers.push("Observaciones");
        let bytes = source_workbook_with_headers(&headers, &sample_rows());
        let raw = parse_bytes(&bytes).unwrap();

        let result = normalize(&raw).unwrap();
        assert_eq!(result.ignored, vec!["Observaciones"]);
        assert_eq!(result.records.len(), 3);
    }

    #[test]
    fn test_header_only_sheet_yields_no_records() {
        let raw = parse_bytes(&source_workbook(&[])).unwrap();
        let result = normalize(&raw).unwrap();
        assert!(result.records.is_empty());
    }
}
