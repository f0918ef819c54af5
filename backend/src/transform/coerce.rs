//! Cell coercions used by the normalizer.
//!
//! Each function takes a raw `calamine` cell and returns the typed value, or
//! `None` when the cell cannot be read as that type. Callers decide whether a
//! failed coercion degrades to a missing value or aborts the run.

use calamine::Data;
use chrono::{Datelike, Duration, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Fractional digits kept on amounts.
pub const AMOUNT_SCALE: u32 = 2;

/// `D/M/YYYY`, `D-M-YY`, `D.M.YYYY`, optionally followed by a time.
/// Two-digit years resolve to within 50 years of the current year.
static DAY_FIRST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4}|\d{2})(?:[ T]\S.*)?$")
        .expect("valid day-first date pattern")
});

/// `YYYY-MM-DD` or `YYYY/MM/DD`, optionally followed by a time.
static ISO_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})[/\-](\d{1,2})[/\-](\d{1,2})(?:[ T]\S.*)?$")
        .expect("valid ISO date pattern")
});

/// Last serial number Excel can represent (9999-12-31).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

// =============================================================================
// Text
// =============================================================================

/// Render a cell as text without numeric reinterpretation.
///
/// Strings are returned verbatim, so identifiers keep their leading zeros.
/// Integer-valued numbers lose the trailing `.0` a float cell would carry.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_text(*f),
        Data::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::Error(e) => e.to_string(),
    }
}

fn float_text(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

// =============================================================================
// Amount
// =============================================================================

/// Parse a numeric cell or numeric string, rounded to [`AMOUNT_SCALE`] places.
///
/// Rounding is half-to-even. Returns `None` for anything non-numeric.
pub fn parse_amount(cell: &Data) -> Option<Decimal> {
    let value = match cell {
        Data::Int(i) => Some(Decimal::from(*i)),
        Data::Float(f) if f.is_finite() => Decimal::from_str(&f.to_string()).ok(),
        Data::String(s) => parse_decimal_text(s),
        _ => None,
    }?;

    Some(round_amount(value))
}

/// Round to [`AMOUNT_SCALE`] places, half-to-even.
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointNearestEven)
}

fn parse_decimal_text(text: &str) -> Option<Decimal> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
}

// =============================================================================
// Date
// =============================================================================

/// Read a cell as a calendar date, day-first for ambiguous text.
///
/// Accepts native date cells, ISO strings, day-first strings and Excel serial
/// numbers. When a day-first reading is impossible (`03/15/2024`) the
/// month-first reading is tried.
pub fn parse_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime().map(|value| value.date()),
        Data::DateTimeIso(s) | Data::String(s) => parse_date_text(s),
        Data::Float(f) => excel_serial_to_date(*f),
        Data::Int(i) => excel_serial_to_date(*i as f64),
        _ => None,
    }
}

/// Parse date text, day-first.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();

    if let Some(caps) = ISO_RE.captures(text) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let caps = DAY_FIRST_RE.captures(text)?;
    let first: u32 = caps[1].parse().ok()?;
    let second: u32 = caps[2].parse().ok()?;
    let year = expand_year(&caps[3])?;

    NaiveDate::from_ymd_opt(year, second, first)
        .or_else(|| NaiveDate::from_ymd_opt(year, first, second))
}

fn expand_year(text: &str) -> Option<i32> {
    let year: i32 = text.parse().ok()?;
    if text.len() == 2 {
        Some(pivot_two_digit_year(year, Local::now().year()))
    } else {
        Some(year)
    }
}

/// Resolve `YY` to the year closest to `current_year`, in the window
/// `[current_year - 50, current_year + 50)`.
fn pivot_two_digit_year(year: i32, current_year: i32) -> i32 {
    let candidate = current_year - current_year.rem_euclid(100) + year;
    if candidate >= current_year + 50 {
        candidate - 100
    } else if candidate < current_year - 50 {
        candidate + 100
    } else {
        candidate
    }
}

/// Convert an Excel 1900-system serial number to a date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    let days = serial.floor() as i64;
    // Serials below 60 precede Excel's phantom 1900-02-29.
    let epoch = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    epoch.checked_add_signed(Duration::days(days))
}
