//! # Percepciones - ARCA withholding/perception report processing
//!
//! Turns the spreadsheet downloaded from ARCA's "mis retenciones" service
//! into a normalized, date-sorted and totaled report, rendered as a preview
//! and exported as a formatted `.xlsx`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  .xlsx/.xls │────▶│   Parser    │────▶│  Transform  │────▶│   Preview   │
//! │   upload    │     │ (calamine)  │     │ (normalize, │     │   Export    │
//! │             │     │             │     │  aggregate) │     │   (.xlsx)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use percepciones::process_file;
//!
//! let output = process_file("retenciones.xlsx".as_ref(), "Juan Pérez").unwrap();
//! println!("{}", output.preview.render_text());
//! std::fs::write(output.filename, &output.workbook).unwrap();
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (Record, Table, PeriodLabel)
//! - [`parser`] - Spreadsheet reading with format detection
//! - [`transform`] - Coercion, normalization, aggregation and pipeline
//! - [`preview`] - Read-only view model with the total row
//! - [`export`] - Formatted `.xlsx` workbook
//! - [`config`] - Form host configuration
//! - [`api`] - HTTP form host

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod export;
pub mod preview;

// HTTP API
pub mod api;
pub mod config;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AggregateError, ExportError, NormalizeError, ParseError, PipelineError, SchemaError, ServerError,
    TypeCoercionError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Column, PeriodLabel, Record, SummaryRow, Table};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{detect_format, parse_bytes, parse_file, RawRow, RawSheet, SpreadsheetFormat};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    process_bytes, process_file, process_sheet, PipelineOutput, SheetInfo,
};
pub use transform::{aggregate, normalize, Normalized};

// =============================================================================
// Re-exports - Output
// =============================================================================

pub use export::{build_workbook, EXPORT_FILENAME, SHEET_NAME};
pub use preview::Preview;

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::form::FormState;
pub use api::types::{error_response, prompt_response, PreviewResponse};
pub use config::ServerConfig;

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
