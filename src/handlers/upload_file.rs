use super::{Success, success};
use crate::{
    app_state::AppState,
    types::{BrowserResult, Credentials, Prefix},
};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileRequest {
    pub credentials: Credentials,
    pub bucket: String,
    pub file_path: PathBuf,
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Serialize)]
pub struct UploadPayload {
    key: String,
}

/// POST /api/upload-file - streams a local file to `prefix` + its file name
pub async fn upload_file(
    State(app_state): State<AppState>,
    Json(request): Json<UploadFileRequest>,
) -> BrowserResult<Json<Success<UploadPayload>>> {
    let prefix = Prefix::parse(request.prefix)?;

    let key = app_state
        .transfers
        .upload(
            &request.credentials.trimmed(),
            &request.bucket,
            &prefix,
            &request.file_path,
        )
        .await?;

    Ok(success(UploadPayload { key }))
}
