use super::{Success, success};
use crate::{
    app_state::AppState,
    types::{BrowserResult, BucketInfo, Credentials},
};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ListBucketsRequest {
    pub credentials: Credentials,
}

#[derive(Debug, Serialize)]
pub struct BucketsPayload {
    buckets: Vec<BucketInfo>,
}

/// POST /api/list-buckets
pub async fn list_buckets(
    State(app_state): State<AppState>,
    Json(request): Json<ListBucketsRequest>,
) -> BrowserResult<Json<Success<BucketsPayload>>> {
    let credentials = request.credentials.trimmed();
    tracing::info!("LIST buckets: endpoint={}", credentials.endpoint);

    let buckets = app_state.gateway.list_buckets(&credentials).await?;
    Ok(success(BucketsPayload { buckets }))
}
