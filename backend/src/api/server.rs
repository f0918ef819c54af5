//! HTTP form host.
//!
//! Stateless: each request carries both inputs and runs the pipeline from
//! scratch. Nothing is stored between requests.
//!
//! # Endpoints
//!
//! | Method | Path              | Description                              |
//! |--------|-------------------|------------------------------------------|
//! | GET    | `/`               | Form page                                |
//! | GET    | `/health`         | Health check                             |
//! | POST   | `/api/preview`    | Multipart upload → JSON preview          |
//! | POST   | `/api/export`     | Multipart upload → `.xlsx` download      |
//! | GET    | `/api/logs`       | SSE stream of pipeline logs              |

use axum::{
    extract::{DefaultBodyLimit, Multipart},
    http::{header, Method, StatusCode},
    response::{sse::Event, Html, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::form::FormState;
use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::page::INDEX_HTML;
use super::types::{error_response, prompt_response, PreviewResponse};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::export::XLSX_MIME;
use crate::transform::pipeline::{process_bytes, PipelineOutput};

/// Build the router. Separate from [`start_server`] so it can be driven
/// in-process.
pub fn router(config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/preview", post(preview))
        .route("/api/export", post(export))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
}

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> ServerResult<()> {
    let addr = config.socket_addr();
    let app = router(&config);

    eprintln!("🚀 Percepciones server running on http://localhost:{}", addr.port());
    eprintln!("   GET  /             - Form page");
    eprintln!("   POST /api/preview  - Upload and preview");
    eprintln!("   POST /api/export   - Upload and download .xlsx");
    eprintln!("   GET  /api/logs     - SSE log stream");
    eprintln!("   GET  /health       - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "percepciones",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "preview": "POST /api/preview",
            "export": "POST /api/export",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn preview(multipart: Multipart) -> ServerResult<Json<PreviewResponse>> {
    let output = run_pipeline(multipart).await?;
    Ok(Json(PreviewResponse::from(output)))
}

async fn export(multipart: Multipart) -> ServerResult<Response> {
    let output = run_pipeline(multipart).await?;
    let disposition = format!("attachment; filename=\"{}\"", output.filename);

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        output.workbook,
    )
        .into_response())
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ServerError::Prompt(message) => (StatusCode::BAD_REQUEST, prompt_response(message)),
            ServerError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, error_response(&self.to_string()))
            }
            ServerError::Pipeline(e) => {
                (StatusCode::UNPROCESSABLE_ENTITY, error_response(&e.user_message()))
            }
            ServerError::Task(_) | ServerError::Io(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, error_response(&self.to_string()))
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Fields posted by the form.
#[derive(Debug, Default)]
struct UploadForm {
    taxpayer: Option<String>,
    file_name: Option<String>,
    file: Option<Vec<u8>>,
}

async fn read_form(mut multipart: Multipart) -> ServerResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "contribuyente" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                form.taxpayer = Some(text);
            }
            "file" => {
                form.file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                form.file = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn run_pipeline(multipart: Multipart) -> ServerResult<PipelineOutput> {
    let form = read_form(multipart).await?;

    let taxpayer = match FormState::from_inputs(form.taxpayer.as_deref(), form.file.as_deref()) {
        FormState::Ready { taxpayer, .. } => taxpayer.to_string(),
        other => return Err(ServerError::Prompt(other.prompt().unwrap_or_default())),
    };
    let bytes = form.file.unwrap_or_default();

    log_info(format!(
        "📄 New upload: {} ({} bytes) for {}",
        form.file_name.as_deref().unwrap_or("unknown"),
        bytes.len(),
        taxpayer
    ));

    // Parsing and workbook generation are CPU-bound.
    let result = tokio::task::spawn_blocking(move || process_bytes(&bytes, &taxpayer)).await?;

    result.map_err(|e| {
        log_error(format!("Pipeline error: {}", e));
        ServerError::from(e)
    })
}
