use super::{Empty, Success, success};
use crate::{
    app_state::AppState,
    types::{BrowserResult, Credentials},
};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SaveCredentialsRequest {
    pub credentials: Credentials,
}

#[derive(Debug, Serialize)]
pub struct SavedCredentials {
    credentials: Option<Credentials>,
}

/// POST /api/credentials
pub async fn save_credentials(
    State(app_state): State<AppState>,
    Json(request): Json<SaveCredentialsRequest>,
) -> BrowserResult<Json<Success<Empty>>> {
    app_state.credentials.save(&request.credentials.trimmed())?;
    tracing::info!("Saved credentials to {}", app_state.credentials.path().display());
    Ok(success(Empty {}))
}

/// GET /api/credentials - `credentials` is null when nothing is saved
pub async fn get_credentials(
    State(app_state): State<AppState>,
) -> BrowserResult<Json<Success<SavedCredentials>>> {
    let credentials = app_state.credentials.get()?;
    Ok(success(SavedCredentials { credentials }))
}

/// DELETE /api/credentials
pub async fn delete_credentials(
    State(app_state): State<AppState>,
) -> BrowserResult<Json<Success<Empty>>> {
    app_state.credentials.delete()?;
    tracing::info!("Deleted saved credentials");
    Ok(success(Empty {}))
}
