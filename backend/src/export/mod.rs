//! Styled workbook exporter.
//!
//! Layout of the single `Percepciones ARCA` sheet (Excel rows):
//!
//! ```text
//! 1-2  A:F merged   TAXPAYER NAME (bold, centered, medium border)
//! 4    A:F merged   PERCEPCIONES IVA - MM-YYYY
//! 5    header       CUIT | Razón Social | Fecha | Nro Comprobante | Comprobante | Importe
//! 6..  one row per record, sorted by date
//! last A:E merged   TOTAL            F: =SUM(F5:F{last-1})
//! ```
//!
//! The workbook is built entirely in memory.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{
    ExcelDateTime, Format, FormatAlign, FormatBorder, Formula, Workbook, Worksheet,
};

use crate::error::{ExportError, ExportResult};
use crate::models::{Column, Record, Table, DATE_DISPLAY_FORMAT, TOTAL_LABEL};
use crate::preview::format_amount;

pub const SHEET_NAME: &str = "Percepciones ARCA";

/// Filename offered for download.
pub const EXPORT_FILENAME: &str = "datos_procesados.xlsx";

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const CURRENCY_FORMAT: &str = r##""$ "#,##0.00;[Red]"$ "#,##0.00"##;
const DATE_FORMAT: &str = "dd/mm/yyyy";

const TITLE_ROW_HEIGHT: f64 = 30.0;
const SUBTITLE_ROW_HEIGHT: f64 = 25.0;
const SUBTITLE_FONT_SIZE: f64 = 12.0;
const WIDTH_MARGIN: usize = 2;

/// 0-based row of the column headers (Excel row 5).
pub const HEADER_ROW: u32 = 4;
const SUBTITLE_ROW: u32 = 3;
const LAST_COL: u16 = (Column::ALL.len() - 1) as u16;

struct Styles {
    title: Format,
    subtitle: Format,
    header: Format,
    currency: Format,
    date: Format,
    total: Format,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_border(FormatBorder::Medium)
                .set_text_wrap(),
            subtitle: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter)
                .set_font_size(SUBTITLE_FONT_SIZE),
            header: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_border(FormatBorder::Thin),
            currency: Format::new()
                .set_num_format(CURRENCY_FORMAT)
                .set_align(FormatAlign::Right),
            date: Format::new()
                .set_num_format(DATE_FORMAT)
                .set_align(FormatAlign::Center),
            total: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_align(FormatAlign::VerticalCenter),
        }
    }
}

/// 0-based row of the `TOTAL` line for a table of `record_count` rows.
pub fn total_row(record_count: usize) -> u32 {
    HEADER_ROW + 1 + record_count as u32
}

/// `SUM` over the `Importe` column, from the header row to the last record.
/// The header text is ignored by `SUM`, and the range never reaches the
/// total row even when the table is empty.
pub fn total_formula(record_count: usize) -> String {
    format!("=SUM(F{}:F{})", HEADER_ROW + 1, total_row(record_count))
}

/// Build the styled report and return the `.xlsx` bytes.
pub fn build_workbook(taxpayer: &str, table: &Table) -> ExportResult<Vec<u8>> {
    let styles = Styles::new();
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    sheet.merge_range(0, 0, 1, LAST_COL, &taxpayer.to_uppercase(), &styles.title)?;
    sheet.merge_range(
        SUBTITLE_ROW,
        0,
        SUBTITLE_ROW,
        LAST_COL,
        &table.subtitle(),
        &styles.subtitle,
    )?;

    for column in Column::ALL {
        sheet.write_string_with_format(
            HEADER_ROW,
            column.index() as u16,
            column.label(),
            &styles.header,
        )?;
    }

    for (i, record) in table.records().iter().enumerate() {
        write_record(sheet, HEADER_ROW + 1 + i as u32, record, &styles)?;
    }

    write_total(sheet, table, &styles)?;

    set_column_widths(sheet, table)?;
    sheet.set_column_format(Column::Fecha.index() as u16, &styles.date)?;
    sheet.set_column_format(Column::Importe.index() as u16, &styles.currency)?;

    sheet.set_row_height(0, TITLE_ROW_HEIGHT)?;
    sheet.set_row_height(1, TITLE_ROW_HEIGHT)?;
    sheet.set_row_height(SUBTITLE_ROW, SUBTITLE_ROW_HEIGHT)?;

    Ok(workbook.save_to_buffer()?)
}

fn write_record(sheet: &mut Worksheet, row: u32, record: &Record, styles: &Styles) -> ExportResult<()> {
    sheet.write_string(row, Column::Cuit.index() as u16, &record.tax_id)?;
    sheet.write_string(row, Column::RazonSocial.index() as u16, &record.counterparty_name)?;
    if let Some(date) = record.date {
        sheet.write_datetime_with_format(
            row,
            Column::Fecha.index() as u16,
            &excel_date(date)?,
            &styles.date,
        )?;
    }
    sheet.write_string(row, Column::NroComprobante.index() as u16, &record.voucher_number)?;
    sheet.write_string(row, Column::Comprobante.index() as u16, &record.voucher_description)?;

    if let Some(amount) = record.amount.and_then(|a| a.to_f64()) {
        sheet.write_number_with_format(row, Column::Importe.index() as u16, amount, &styles.currency)?;
    }

    Ok(())
}

fn write_total(sheet: &mut Worksheet, table: &Table, styles: &Styles) -> ExportResult<()> {
    let row = total_row(table.len());
    let importe = Column::Importe.index() as u16;

    sheet.merge_range(row, 0, row, importe - 1, TOTAL_LABEL, &styles.total)?;

    let formula = Formula::new(total_formula(table.len())).set_result(table.total().to_string());
    sheet.write_formula_with_format(row, importe, formula, &styles.currency)?;

    Ok(())
}

fn excel_date(date: NaiveDate) -> ExportResult<ExcelDateTime> {
    if !(1900..=9999).contains(&date.year()) {
        return Err(ExportError::DateOutOfRange(
            date.format(DATE_DISPLAY_FORMAT).to_string(),
        ));
    }
    Ok(ExcelDateTime::from_ymd(
        date.year() as u16,
        date.month() as u8,
        date.day() as u8,
    )?)
}

/// Width per column: longest of header label and cell texts, plus a margin.
fn set_column_widths(sheet: &mut Worksheet, table: &Table) -> ExportResult<()> {
    for column in Column::ALL {
        let longest_cell = table
            .records()
            .iter()
            .map(|r| cell_display_len(r, column))
            .max()
            .unwrap_or(0);
        let width = longest_cell.max(column.label().chars().count()) + WIDTH_MARGIN;
        sheet.set_column_width(column.index() as u16, width as f64)?;
    }
    Ok(())
}

fn cell_display_len(record: &Record, column: Column) -> usize {
    match column {
        Column::Cuit => record.tax_id.chars().count(),
        Column::RazonSocial => record.counterparty_name.chars().count(),
        Column::Fecha => record.date_text().chars().count(),
        Column::NroComprobante => record.voucher_number.chars().count(),
        Column::Comprobante => record.voucher_description.chars().count(),
        // Rendered with the "$ " currency prefix.
        Column::Importe => record
            .amount
            .map(|a| format_amount(a).chars().count() + 2)
            .unwrap_or(0),
    }
}
