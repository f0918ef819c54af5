//! Presenter: read-only preview of the normalized table.
//!
//! Builds a display-ready [`Preview`] (strings only) with the `TOTAL` row
//! appended, plus the diagnostics shown under the grid. The same view model
//! is serialized to JSON by the form host and rendered as a text grid by
//! the CLI.

use num_format::{Locale, ToFormattedString};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Column, Record, SummaryRow, Table};
use crate::transform::coerce::round_amount;

/// One grid row, cells in canonical column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRow {
    pub cells: Vec<String>,
    pub is_total: bool,
}

/// Everything the preview page shows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    /// Taxpayer name as entered.
    pub taxpayer: String,
    /// `PERCEPCIONES IVA - MM-YYYY`
    pub subtitle: String,
    pub record_count: usize,
    pub column_count: usize,
    pub columns: Vec<String>,
    /// Records followed by the total row.
    pub rows: Vec<PreviewRow>,
    /// Formatted total, also present in the last row.
    pub total: String,
}

impl Preview {
    pub fn build(taxpayer: &str, table: &Table) -> Self {
        let summary = table.summary();
        let mut rows: Vec<PreviewRow> = table.records().iter().map(record_row).collect();
        rows.push(summary_row(&summary));

        Self {
            taxpayer: taxpayer.to_string(),
            subtitle: table.subtitle(),
            record_count: table.len(),
            column_count: Column::ALL.len(),
            columns: Column::ALL.iter().map(|c| c.label().to_string()).collect(),
            rows,
            total: format_amount(summary.amount),
        }
    }

    /// Fixed-width text grid with headers, records and total row.
    pub fn render_text(&self) -> String {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.cells.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let separator = widths
            .iter()
            .map(|w| "-".repeat(*w + 2))
            .collect::<Vec<_>>()
            .join("+");

        let mut out = String::new();
        out.push_str(&render_line(&self.columns, &widths));
        out.push('\n');
        out.push_str(&separator);
        out.push('\n');
        for row in &self.rows {
            if row.is_total {
                out.push_str(&separator);
                out.push('\n');
            }
            out.push_str(&render_line(&row.cells, &widths));
            out.push('\n');
        }
        out
    }

    /// Lines shown under the grid.
    pub fn diagnostics(&self) -> Vec<String> {
        vec![
            format!("Número de filas: {}", self.record_count),
            format!("Número de columnas: {}", self.column_count),
            format!("Columnas disponibles: {}", self.columns.join(", ")),
        ]
    }
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, width))| {
            let pad = width.saturating_sub(cell.chars().count());
            if i == Column::Importe.index() {
                format!(" {}{} ", " ".repeat(pad), cell)
            } else {
                format!(" {}{} ", cell, " ".repeat(pad))
            }
        })
        .collect::<Vec<_>>()
        .join("|")
        .trim_end()
        .to_string()
}

fn record_row(record: &Record) -> PreviewRow {
    PreviewRow {
        cells: vec![
            record.tax_id.clone(),
            record.counterparty_name.clone(),
            record.date_text(),
            record.voucher_number.clone(),
            record.voucher_description.clone(),
            record.amount.map(format_amount).unwrap_or_default(),
        ],
        is_total: false,
    }
}

fn summary_row(summary: &SummaryRow) -> PreviewRow {
    PreviewRow {
        cells: vec![
            String::new(),
            summary.label().to_string(),
            String::new(),
            String::new(),
            String::new(),
            format_amount(summary.amount),
        ],
        is_total: true,
    }
}

/// Two decimals with `,` thousands separators: `1,234.56`.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = round_amount(amount).abs();
    let integer = rounded.trunc();
    let cents = ((rounded - integer) * Decimal::ONE_HUNDRED)
        .to_u32()
        .unwrap_or(0);
    let integer = integer.to_u128().unwrap_or(0);
    let sign = if amount.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}.{:02}", sign, integer.to_formatted_string(&Locale::en), cents)
}
