use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::audio::ArtifactStore,
    error::{AppError, AppResult},
};

pub struct ArtifactController {
    artifacts: ArtifactStore,
}

impl ArtifactController {
    pub fn new(artifacts: ArtifactStore) -> Self {
        Self { artifacts }
    }

    /// GET /api/artifacts/:id - Download finished audio
    pub async fn download(
        State(controller): State<Arc<ArtifactController>>,
        Path(artifact_id): Path<Uuid>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        let artifact = controller
            .artifacts
            .get(artifact_id)
            .ok_or_else(|| AppError::NotFound(format!("artifact {}", artifact_id)))?;

        let headers = audio_headers(artifact.content_type, &artifact.filename)?;
        Ok((StatusCode::OK, headers, Body::from(artifact.bytes.clone())))
    }
}

/// `Content-Type` and an attachment `Content-Disposition` for an audio body
pub(crate) fn audio_headers(content_type: &str, filename: &str) -> AppResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, header_value(content_type)?);
    headers.insert(
        header::CONTENT_DISPOSITION,
        header_value(&format!(
            "attachment; filename=\"{}\"",
            sanitize_filename(filename)
        ))?,
    );
    Ok(headers)
}

pub(crate) fn header_value(value: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::Internal(format!("invalid header value: {}", e)))
}

/// Printable ASCII only, no quotes or backslashes
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}
