//! JSON payloads returned by the form host.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::preview::Preview;
use crate::transform::pipeline::{PipelineOutput, SheetInfo};

/// Response sent after a successful preview run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    /// Identifier of this run, for correlating with the log stream
    pub job_id: String,

    /// "ready", or "warning" when some amounts or dates were left empty
    pub status: String,

    pub preview: Preview,

    /// Human-readable coercion warnings
    pub warnings: Vec<String>,

    /// Source sheet metadata
    pub sheet: SheetInfo,

    /// Filename the export endpoint will use
    pub filename: String,
}

impl From<PipelineOutput> for PreviewResponse {
    fn from(output: PipelineOutput) -> Self {
        PreviewResponse {
            job_id: Uuid::new_v4().to_string(),
            status: if output.warnings.is_empty() { "ready" } else { "warning" }.to_string(),
            warnings: output.warnings.iter().map(|w| w.to_string()).collect(),
            preview: output.preview,
            sheet: output.sheet_info,
            filename: output.filename.to_string(),
        }
    }
}

/// Status of a non-success response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// Inputs are incomplete; informational.
    Prompt,
    /// The pipeline failed.
    Error,
}

/// Informational prompt for incomplete inputs.
pub fn prompt_response(message: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": ResponseStatus::Prompt,
        "message": message,
    })
}

/// Single user-facing error message.
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": ResponseStatus::Error,
        "error": error,
    })
}
