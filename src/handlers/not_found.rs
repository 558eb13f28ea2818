use crate::types::BrowserError;
use axum::{
    http::Uri,
    response::{IntoResponse, Response},
};

/// Fallback for anything outside the host API routes
pub async fn not_found(uri: Uri) -> Response {
    BrowserError::NotFound(format!("No host API route for {}", uri.path())).into_response()
}
