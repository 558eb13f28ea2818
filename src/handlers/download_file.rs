use super::success;
use crate::{
    app_state::AppState,
    browser::{DownloadOutcome, FixedDestination},
    types::{BrowserResult, Credentials},
};
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct DownloadFileRequest {
    pub credentials: Credentials,
    pub bucket: String,
    pub key: String,
    /// Absent means the user declined the save dialog
    #[serde(default)]
    pub destination: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct DownloadPayload {
    path: PathBuf,
    bytes: u64,
}

/// POST /api/download-file
pub async fn download_file(
    State(app_state): State<AppState>,
    Json(request): Json<DownloadFileRequest>,
) -> BrowserResult<Response> {
    let dialog = FixedDestination(request.destination);

    let outcome = app_state
        .transfers
        .download(&request.credentials.trimmed(), &request.bucket, &request.key, &dialog)
        .await?;

    Ok(match outcome {
        DownloadOutcome::Completed { path, bytes } => {
            success(DownloadPayload { path, bytes }).into_response()
        }
        DownloadOutcome::Canceled => Json(json!({ "success": false, "canceled": true })).into_response(),
    })
}
