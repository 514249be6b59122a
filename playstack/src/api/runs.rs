//! Pipeline endpoints
//!
//! Both endpoints answer with a JSON [`RunReport`]: 200 when the run
//! completed, 422 when it stopped on a fatal error.

use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, info};

use crate::pipeline::{RunReport, TranscriptionRequest};
use crate::{ApiError, ApiResult, AppState};

/// POST /api/instrumental request
#[derive(Debug, Deserialize)]
pub struct InstrumentalRequest {
    pub url: Option<String>,
}

fn report_response(report: RunReport) -> Response {
    let status = if report.is_completed() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, Json(report)).into_response()
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// Collect the `url` and `file` form fields
///
/// A file input left empty still arrives as a part with an empty name and
/// no bytes; that counts as "no upload".
pub async fn read_transcription_form(mut multipart: Multipart) -> ApiResult<TranscriptionRequest> {
    let mut request = TranscriptionRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("url") => {
                request.url = Some(field.text().await.map_err(multipart_error)?);
            }
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|n| !n.is_empty());
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if filename.is_some() || !bytes.is_empty() {
                    request.upload = Some((filename, bytes.to_vec()));
                }
            }
            other => debug!(field = ?other, "Ignoring unknown form field"),
        }
    }

    Ok(request)
}

/// POST /api/transcribe
pub async fn start_transcription(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Response> {
    let request = read_transcription_form(multipart).await?;
    info!(
        url = request.url.as_deref().unwrap_or(""),
        upload = request.upload.is_some(),
        "Transcription requested"
    );

    let report = state
        .execute_run(|pipeline| async move { pipeline.run_transcription(request).await })
        .await?;
    Ok(report_response(report))
}

/// POST /api/instrumental
pub async fn start_instrumental(
    State(state): State<AppState>,
    payload: Result<Json<InstrumentalRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    info!(url = request.url.as_deref().unwrap_or(""), "Instrumental requested");

    let report = state
        .execute_run(|pipeline| async move { pipeline.run_instrumental(request.url).await })
        .await?;
    Ok(report_response(report))
}

/// Build pipeline routes
pub fn run_routes() -> Router<AppState> {
    Router::new()
        .route("/api/transcribe", post(start_transcription))
        .route("/api/instrumental", post(start_instrumental))
}
