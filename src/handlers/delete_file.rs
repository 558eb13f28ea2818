use super::{Empty, Success, success};
use crate::{
    app_state::AppState,
    types::{BrowserResult, Credentials},
};
use axum::{Json, extract::State};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct DeleteFileRequest {
    pub credentials: Credentials,
    pub bucket: String,
    pub key: String,
}

/// POST /api/delete-file
pub async fn delete_file(
    State(app_state): State<AppState>,
    Json(request): Json<DeleteFileRequest>,
) -> BrowserResult<Json<Success<Empty>>> {
    app_state
        .transfers
        .delete(&request.credentials.trimmed(), &request.bucket, &request.key)
        .await?;

    Ok(success(Empty {}))
}
