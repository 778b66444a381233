use crate::AppState;
use crate::api::error::AppError;
use crate::api::session::Session;
use crate::utils::paths;
use axum::{
    Extension,
    body::Body,
    extract::{Query, State},
    http::{StatusCode, header},
    response::Response,
};
use axum_extra::extract::WithRejection;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct DownloadQuery {
    pub file: String,
}

pub async fn download_file(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    WithRejection(Query(query), _): WithRejection<Query<DownloadQuery>, AppError>,
) -> Result<Response, AppError> {
    let path = paths::normalize(&query.file);
    if path.is_empty() {
        return Err(AppError::BadRequest("No file given".to_string()));
    }

    tracing::info!("📥 Download path: {}", path);
    let download = state
        .storage
        .download(&session.access_token, &path)
        .await?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime::APPLICATION_OCTET_STREAM.as_ref())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&download.name),
        );
    if let Some(size) = download.size {
        builder = builder.header(header::CONTENT_LENGTH, size);
    }

    builder
        .body(Body::from_stream(download.stream))
        .map_err(|e| AppError::Internal(format!("Failed to build download response: {}", e)))
}

/// `attachment` disposition with an ASCII fallback name and the exact
/// UTF-8 name in `filename*`
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        utf8_percent_encode(filename, NON_ALPHANUMERIC)
    )
}
