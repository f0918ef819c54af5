//! Error types for the perception report pipeline.
//!
//! One error type per pipeline stage:
//!
//! - [`ParseError`] - the upload is not a readable spreadsheet
//! - [`SchemaError`] - expected columns are missing after normalization
//! - [`TypeCoercionError`] - a single cell could not be coerced
//! - [`NormalizeError`] - normalizer failure (schema or sort-key coercion)
//! - [`AggregateError`] - the table total could not be computed
//! - [`ExportError`] - the output workbook could not be built
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - form host errors
//!
//! Conversions are provided via `From`, so `?` works across stage boundaries.

use thiserror::Error;

// =============================================================================
// Input Adapter Errors
// =============================================================================

/// Errors while reading the uploaded spreadsheet.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read file from disk.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes are neither an `.xlsx` nor an `.xls` workbook.
    #[error("Unsupported file format: expected .xlsx or .xls")]
    UnsupportedFormat,

    /// The workbook container is corrupt or unreadable.
    #[error("Invalid spreadsheet: {0}")]
    InvalidWorkbook(String),

    /// The workbook has no worksheets.
    #[error("Spreadsheet has no worksheets")]
    EmptyWorkbook,

    /// The first worksheet has no header row.
    #[error("No headers found in the first worksheet")]
    NoHeaders,
}

// =============================================================================
// Normalizer Errors
// =============================================================================

/// Expected columns are absent after dropping and renaming.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// One or more canonical columns could not be mapped from the source.
    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// A single cell failed numeric/date coercion.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Row {row}, column '{column}' (value '{value}'): {message}")]
pub struct TypeCoercionError {
    /// 1-based row number in the source sheet (header is row 1).
    pub row: usize,
    pub column: String,
    pub value: String,
    pub message: String,
}

impl TypeCoercionError {
    pub fn new(
        row: usize,
        column: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row,
            column: column.into(),
            value: value.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by the column normalizer.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A sort key (date) could not be parsed.
    #[error("Type coercion error: {0}")]
    Coercion(#[from] TypeCoercionError),
}

// =============================================================================
// Aggregator Errors
// =============================================================================

/// Errors while totaling the sorted table.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// The sum of the amounts does not fit in a decimal.
    #[error("Total of column 'Importe' is too large ({count} amounts)")]
    TotalOverflow { count: usize },
}

// =============================================================================
// Exporter Errors
// =============================================================================

/// Errors while building the output workbook.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// A record date outside the range Excel can represent.
    #[error("Date out of range for Excel: {0}")]
    DateOutOfRange(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::process_bytes`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Normalize(#[from] NormalizeError),

    #[error("{0}")]
    Aggregate(#[from] AggregateError),

    #[error("{0}")]
    Export(#[from] ExportError),
}

impl From<SchemaError> for PipelineError {
    fn from(err: SchemaError) -> Self {
        PipelineError::Normalize(err.into())
    }
}

impl From<TypeCoercionError> for PipelineError {
    fn from(err: TypeCoercionError) -> Self {
        PipelineError::Normalize(err.into())
    }
}

impl PipelineError {
    /// Single user-facing message, as shown by the form host.
    pub fn user_message(&self) -> String {
        format!("Error al leer el archivo: {}", self)
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// Form host errors. Request-level variants are mapped to HTTP responses in
/// [`crate::api::server`].
#[derive(Debug, Error)]
pub enum ServerError {
    /// Inputs are incomplete; carries the prompt shown to the user.
    #[error("{0}")]
    Prompt(&'static str),

    /// The multipart body could not be read.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// The blocking pipeline task panicked or was cancelled.
    #[error("Processing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

pub type ParseResult<T> = Result<T, ParseError>;

pub type NormalizeResult<T> = Result<T, NormalizeError>;

pub type AggregateResult<T> = Result<T, AggregateError>;

pub type ExportResult<T> = Result<T, ExportError>;

pub type PipelineResult<T> = Result<T, PipelineError>;

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let parse_err = ParseError::EmptyWorkbook;
        let pipeline_err: PipelineError = parse_err.into();
        assert!(pipeline_err.to_string().contains("no worksheets"));

        let schema_err = SchemaError::MissingColumns(vec!["CUIT".into(), "Fecha".into()]);
        let pipeline_err: PipelineError = schema_err.into();
        assert!(matches!(pipeline_err, PipelineError::Normalize(NormalizeError::Schema(_))));
        assert!(pipeline_err.to_string().contains("CUIT, Fecha"));
    }

    #[test]
    fn test_coercion_error_format() {
        let err = TypeCoercionError::new(7, "Fecha", "31/02/2024", "not a valid date");
        let msg = err.to_string();
        assert!(msg.contains("Row 7"));
        assert!(msg.contains("column 'Fecha'"));
        assert!(msg.contains("value '31/02/2024'"));
    }

    #[test]
    fn test_overflow_is_pipeline_error() {
        let err: PipelineError = AggregateError::TotalOverflow { count: 2 }.into();
        assert!(matches!(err, PipelineError::Aggregate(_)));
        assert_eq!(
            err.user_message(),
            "Error al leer el archivo: Total of column 'Importe' is too large (2 amounts)"
        );
    }

    #[test]
    fn test_server_error_from_pipeline() {
        let err: ServerError = PipelineError::from(ParseError::NoHeaders).into();
        assert!(matches!(err, ServerError::Pipeline(_)));
        assert!(err.to_string().contains("No headers"));
    }

    #[test]
    fn test_user_message_prefix() {
        let err: PipelineError = ParseError::UnsupportedFormat.into();
        assert!(err.user_message().starts_with("Error al leer el archivo: "));
        assert!(err.user_message().contains(".xlsx"));
    }
}
