//! Upload processing endpoint.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{multipart::Field, multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use reelpush_core::{ProcessingError, ProcessingForm, ScratchDir, TempArtifact};

use crate::state::AppState;

/// Multipart field carrying the clip.
pub const VIDEO_FIELD: &str = "video";

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: String,
    pub asset_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn multipart_error(e: MultipartError) -> ApiError {
    warn!(error = %e, "Malformed multipart body");
    error_response(e.status(), e.body_text())
}

fn storage_error(e: std::io::Error) -> ApiError {
    warn!(error = %e, "Failed to store upload");
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("failed to store upload: {}", e),
    )
}

impl From<ProcessingError> for ErrorResponse {
    fn from(e: ProcessingError) -> Self {
        Self {
            error: e.to_string(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Accept a clip plus form fields, transform it and publish the result.
pub async fn process_upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let processor = state.processor();
    let (upload, form) = read_upload(processor.scratch(), multipart).await?;

    match processor.process(upload, form).await {
        Ok(published) => Ok(Json(UploadResponse {
            status: "success".to_string(),
            asset_id: published.correlation_id,
        })),
        Err(e) => {
            let status = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            Err((status, Json(e.into())))
        }
    }
}

/// Drain the multipart body: the clip goes to scratch storage, known text
/// fields go into the form.
async fn read_upload(
    scratch: &ScratchDir,
    mut multipart: Multipart,
) -> Result<(Option<TempArtifact>, ProcessingForm), ApiError> {
    let mut upload: Option<TempArtifact> = None;
    let mut form = ProcessingForm::default();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();

        if name == VIDEO_FIELD {
            let extension = ScratchDir::upload_extension(field.file_name());
            let artifact = scratch.allocate("upload", &extension);
            let written = stream_field(&mut field, artifact.path()).await?;
            debug!(bytes = written, path = %artifact.path().display(), "Upload stored");
            // A repeated video part replaces (and deletes) the earlier one
            upload = Some(artifact);
            continue;
        }

        let value = field.text().await.map_err(multipart_error)?;
        if !form.set_field(&name, value) {
            debug!(field = %name, "Ignoring unknown form field");
        }
    }

    Ok((upload, form))
}

/// Write a file part to `dest` chunk by chunk.
async fn stream_field(field: &mut Field<'_>, dest: &Path) -> Result<u64, ApiError> {
    let mut file = tokio::fs::File::create(dest).await.map_err(storage_error)?;
    let mut written: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        file.write_all(&chunk).await.map_err(storage_error)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(storage_error)?;

    Ok(written)
}
