use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use tillscan_core::ReceiptItem;
use tillscan_ocr::{OcrBackend, ReceiptPipeline, ReceiptSummary, TotalCheck};

pub type Pipeline = ReceiptPipeline<Box<dyn OcrBackend>>;

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline: Arc::new(pipeline) }
    }
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/upload", post(upload))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> &'static str {
    "Receipt Scanner API"
}

/// `success` is false when recognition failed; `items` is then empty.
#[derive(Debug, Serialize)]
struct UploadResponse {
    success: bool,
    filename: Option<String>,
    items: Vec<ReceiptItem>,
    #[serde(flatten)]
    summary: ReceiptSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    check: Option<TotalCheck>,
    raw_text: String,
}

struct Upload {
    filename: Option<String>,
    bytes: Bytes,
}

async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let upload = match first_file(&mut multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => return error_response(StatusCode::BAD_REQUEST, "No file uploaded", None),
        Err(e) => return error_response(e.status(), "Malformed upload", Some(e.body_text())),
    };
    info!(filename = ?upload.filename, bytes = upload.bytes.len(), "receipt uploaded");

    let pipeline = Arc::clone(&state.pipeline);
    let bytes = upload.bytes;
    let outcome = tokio::task::spawn_blocking(move || pipeline.process_bytes(&bytes)).await;

    let mut response = UploadResponse {
        success: false,
        filename: upload.filename,
        items: Vec::new(),
        summary: ReceiptSummary::default(),
        check: None,
        raw_text: String::new(),
    };
    match outcome {
        Ok(Ok(result)) => {
            response.success = true;
            response.items = result.items();
            response.summary = result.summary;
            response.check = result.check;
            response.raw_text = result.ocr_text;
        }
        Ok(Err(e)) => warn!(error = %e, "receipt extraction failed"),
        Err(e) => error!(error = %e, "receipt extraction task failed"),
    }
    Json(response).into_response()
}

/// The first part that carries a file name. Plain form fields are skipped.
async fn first_file(multipart: &mut Multipart) -> Result<Option<Upload>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await?;
        return Ok(Some(Upload { filename: Some(filename), bytes }));
    }
    Ok(None)
}

fn error_response(status: StatusCode, error: &str, details: Option<String>) -> Response {
    let body = match details {
        Some(details) => json!({ "error": error, "details": details }),
        None => json!({ "error": error }),
    };
    (status, Json(body)).into_response()
}
