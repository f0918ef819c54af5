//! Spreadsheet input adapter.
//!
//! Reads the first worksheet of an `.xlsx`/`.xls` upload into a table of
//! named columns. No domain logic here: cells are kept as `calamine` values
//! and interpreted later by the normalizer.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use std::path::Path;

use crate::error::{ParseError, ParseResult};

const XLSX_MAGIC: &[u8] = b"PK\x03\x04";
const XLS_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Container format detected from the first bytes of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    /// Office Open XML (zip container).
    Xlsx,
    /// Legacy BIFF (OLE2 compound file).
    Xls,
}

impl SpreadsheetFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SpreadsheetFormat::Xlsx => "xlsx",
            SpreadsheetFormat::Xls => "xls",
        }
    }
}

/// Detect the spreadsheet container from its magic bytes.
pub fn detect_format(bytes: &[u8]) -> Option<SpreadsheetFormat> {
    if bytes.starts_with(XLSX_MAGIC) {
        Some(SpreadsheetFormat::Xlsx)
    } else if bytes.starts_with(XLS_MAGIC) {
        Some(SpreadsheetFormat::Xls)
    } else {
        None
    }
}

/// A data row with its position in the source sheet.
#[derive(Debug, Clone)]
pub struct RawRow {
    /// 1-based sheet row number, for error messages.
    pub line: usize,
    /// One cell per header, padded with [`Data::Empty`].
    pub cells: Vec<Data>,
}

/// First worksheet of an upload, header row plus data rows.
#[derive(Debug, Clone)]
pub struct RawSheet {
    pub format: SpreadsheetFormat,
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawSheet {
    /// Position of a header, matched exactly.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Parse an uploaded spreadsheet held in memory.
pub fn parse_bytes(bytes: &[u8]) -> ParseResult<RawSheet> {
    let format = detect_format(bytes).ok_or(ParseError::UnsupportedFormat)?;

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ParseError::InvalidWorkbook(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ParseError::EmptyWorkbook)?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ParseError::EmptyWorkbook)?
        .map_err(|e| ParseError::InvalidWorkbook(e.to_string()))?;

    // Row numbers are reported relative to the sheet, not the used range.
    let first_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

    let mut rows = range
        .rows()
        .enumerate()
        .map(|(i, cells)| (first_line + i, cells))
        .skip_while(|(_, cells)| is_blank(cells));

    let (_, header_cells) = rows.next().ok_or(ParseError::NoHeaders)?;
    let headers: Vec<String> = header_cells.iter().map(header_text).collect();

    let records = rows
        .filter(|(_, cells)| !is_blank(cells))
        .map(|(line, cells)| {
            let mut cells = cells.to_vec();
            cells.resize(headers.len(), Data::Empty);
            RawRow { line, cells }
        })
        .collect();

    Ok(RawSheet {
        format,
        sheet_name,
        headers,
        rows: records,
    })
}

/// Parse a spreadsheet from disk.
pub fn parse_file<P: AsRef<Path>>(path: P) -> ParseResult<RawSheet> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes(&bytes)
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn is_blank(cells: &[Data]) -> bool {
    cells.iter().all(|cell| match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    })
}
