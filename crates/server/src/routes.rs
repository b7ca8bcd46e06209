use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use imei_core::ImeiReport;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

pub const EXTRACT_PATH: &str = "/extract-imei/";

/// Multipart form field carrying the document.
const FILE_FIELD: &str = "file";
/// Reported when the client omits a filename.
const FALLBACK_FILENAME: &str = "upload";

struct Upload {
    filename: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

pub async fn extract_imei(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImeiReport>, ApiError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("extract_imei", %request_id, filename = tracing::field::Empty);

    handle(state, multipart).instrument(span).await
}

async fn handle(
    state: AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImeiReport>, ApiError> {
    let upload = read_upload(multipart?).await?;
    tracing::Span::current().record("filename", upload.filename.as_str());
    info!(
        content_type = upload.content_type.as_deref().unwrap_or(""),
        size_bytes = upload.bytes.len(),
        "Received upload"
    );

    let result = run_pipeline(&state, upload).await;
    if let Err(e) = &result {
        warn!(status = %e.status(), error = %e, "Extraction request failed");
    }
    result.map(Json)
}

/// First `file` field wins; other fields are skipped.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field
            .file_name()
            .filter(|n| !n.is_empty())
            .unwrap_or(FALLBACK_FILENAME)
            .to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?.to_vec();
        return Ok(Upload { filename, content_type, bytes });
    }
    Err(ApiError::BadRequest(format!("No file uploaded: expected multipart field '{FILE_FIELD}'")))
}

/// Runs the blocking pipeline off the async workers, inside the request span,
/// bounded by the configured timeout.
async fn run_pipeline(state: &AppState, upload: Upload) -> Result<ImeiReport, ApiError> {
    let pipeline = state.pipeline.clone();
    let span = tracing::Span::current();
    let task = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        pipeline.process_upload(&upload.filename, upload.content_type.as_deref(), upload.bytes)
    });

    match tokio::time::timeout(state.request_timeout, task).await {
        Err(_) => Err(ApiError::Timeout(state.request_timeout.as_secs())),
        Ok(Err(join_err)) => Err(ApiError::Internal(format!("extraction task failed: {join_err}"))),
        Ok(Ok(result)) => Ok(result?),
    }
}
