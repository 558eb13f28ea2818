use super::{Success, success};
use crate::{
    app_state::AppState,
    types::{BrowserResult, Credentials, FolderPrefix, ObjectEntry, Prefix},
};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ListFilesRequest {
    pub credentials: Credentials,
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Serialize)]
pub struct ListingPayload {
    files: Vec<ObjectEntry>,
    folders: Vec<FolderPrefix>,
}

/// POST /api/list-files - one delimited level under `prefix`
pub async fn list_files(
    State(app_state): State<AppState>,
    Json(request): Json<ListFilesRequest>,
) -> BrowserResult<Json<Success<ListingPayload>>> {
    let prefix = Prefix::parse(request.prefix)?;
    tracing::info!("LIST files: bucket={}, prefix={}", request.bucket, prefix);

    let listing = app_state
        .gateway
        .list_objects(&request.credentials.trimmed(), &request.bucket, &prefix)
        .await?;

    Ok(success(ListingPayload {
        files: listing.files,
        folders: listing.folders,
    }))
}
