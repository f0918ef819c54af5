//! Domain models for the perception report pipeline.
//!
//! - [`Column`] - Canonical output columns, in canonical order
//! - [`Record`] - One withholding/perception entry
//! - [`Table`] - Records sorted by date, with total and period label
//! - [`SummaryRow`] - Synthetic `TOTAL` row appended to preview and export
//! - [`PeriodLabel`] - `MM-YYYY` of the earliest record

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AggregateError, AggregateResult};

/// Display format for record dates.
pub const DATE_DISPLAY_FORMAT: &str = "%d/%m/%Y";

/// Label placed under `Razón Social` in the summary row.
pub const TOTAL_LABEL: &str = "TOTAL";

// =============================================================================
// Canonical Columns
// =============================================================================

/// Canonical column set produced by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    Cuit,
    RazonSocial,
    Fecha,
    NroComprobante,
    Comprobante,
    Importe,
}

impl Column {
    /// All columns in canonical output order.
    pub const ALL: [Column; 6] = [
        Column::Cuit,
        Column::RazonSocial,
        Column::Fecha,
        Column::NroComprobante,
        Column::Comprobante,
        Column::Importe,
    ];

    /// Header label as shown in preview and export.
    pub fn label(self) -> &'static str {
        match self {
            Column::Cuit => "CUIT",
            Column::RazonSocial => "Razón Social",
            Column::Fecha => "Fecha",
            Column::NroComprobante => "Nro Comprobante",
            Column::Comprobante => "Comprobante",
            Column::Importe => "Importe",
        }
    }

    /// Resolve a canonical label back to its column.
    pub fn from_label(label: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|c| c.label() == label)
    }

    /// Zero-based position in the canonical order.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Record
// =============================================================================

/// One withholding/perception entry, validated at the normalizer boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Agent CUIT, verbatim (may carry leading zeros).
    pub tax_id: String,
    pub counterparty_name: String,
    /// `None` when the source cell was blank.
    pub date: Option<NaiveDate>,
    /// Voucher number, verbatim.
    pub voucher_number: String,
    pub voucher_description: String,
    /// Rounded to 2 places; `None` when the source value was not numeric.
    pub amount: Option<Decimal>,
}

impl Record {
    /// Date rendered as `DD/MM/YYYY`, empty when missing.
    pub fn date_text(&self) -> String {
        self.date
            .map(|date| date.format(DATE_DISPLAY_FORMAT).to_string())
            .unwrap_or_default()
    }
}

// =============================================================================
// Period Label
// =============================================================================

/// Month and year of the earliest record, rendered `MM-YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodLabel {
    pub month: u32,
    pub year: i32,
}

impl PeriodLabel {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
        }
    }
}

impl fmt::Display for PeriodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month, self.year)
    }
}

// =============================================================================
// Summary Row
// =============================================================================

/// Synthetic total row. Never part of the sortable [`Table`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub amount: Decimal,
}

impl SummaryRow {
    pub fn label(&self) -> &'static str {
        TOTAL_LABEL
    }
}

// =============================================================================
// Table
// =============================================================================

/// Records sorted ascending by date, undated records last.
///
/// Constructed only through [`crate::transform::aggregate`], which guarantees
/// the ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    records: Vec<Record>,
    total: Decimal,
}

impl Table {
    /// Wrap already-sorted records, computing the total.
    pub(crate) fn from_sorted(records: Vec<Record>) -> AggregateResult<Self> {
        let total = records
            .iter()
            .filter_map(|r| r.amount)
            .try_fold(Decimal::ZERO, |sum, amount| sum.checked_add(amount))
            .ok_or_else(|| AggregateError::TotalOverflow {
                count: records.iter().filter(|r| r.amount.is_some()).count(),
            })?;

        Ok(Self { records, total })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of all present amounts. Missing amounts contribute nothing.
    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn summary(&self) -> SummaryRow {
        SummaryRow {
            amount: self.total(),
        }
    }

    /// Period of the earliest dated record, `None` when no record has a date.
    pub fn period_label(&self) -> Option<PeriodLabel> {
        self.records
            .iter()
            .find_map(|r| r.date)
            .map(PeriodLabel::from_date)
    }

    /// Report subtitle, `PERCEPCIONES IVA - MM-YYYY`.
    pub fn subtitle(&self) -> String {
        match self.period_label() {
            Some(period) => format!("PERCEPCIONES IVA - {}", period),
            None => "PERCEPCIONES IVA".to_string(),
        }
    }
}
