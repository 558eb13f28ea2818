use crate::types::BrowserError;
use axum::{
    extract::Request,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

/// Bearer token guard for the host API
///
/// With no token configured every request passes. Otherwise the request must
/// carry `Authorization: Bearer <token>` exactly.
///
/// Note: the token must be captured in a closure when creating the middleware layer
pub async fn token_middleware(expected: Option<String>, request: Request, next: Next) -> Response {
    let Some(expected) = expected else {
        return next.run(request).await;
    };

    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    match presented {
        Some(token) if bool::from(token.as_bytes().ct_eq(expected.as_bytes())) => {
            next.run(request).await
        }
        Some(_) => {
            tracing::warn!("Rejected host API request with a wrong token");
            BrowserError::Auth("Invalid API token".to_string()).into_response()
        }
        None => BrowserError::Auth("Missing API token".to_string()).into_response(),
    }
}
