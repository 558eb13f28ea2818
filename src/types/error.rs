use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

pub type BrowserResult<T> = Result<T, BrowserError>;

/// Failure taxonomy shared by the gateway, the transfers and the host API.
///
/// A declined file chooser is not represented here; see `DownloadOutcome`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrowserError {
    /// Malformed input caught before any network call
    #[error("{0}")]
    Validation(String),
    /// Provider rejected the credentials
    #[error("{0}")]
    Auth(String),
    /// Connectivity, DNS or timeout
    #[error("{0}")]
    Network(String),
    /// Bucket or key does not exist
    #[error("{0}")]
    NotFound(String),
    /// Any other rejection reported by the provider
    #[error("{0}")]
    Provider(String),
    /// Local file failure during a transfer
    #[error("{0}")]
    Io(String),
}

impl BrowserError {
    pub fn kind(&self) -> &'static str {
        match self {
            BrowserError::Validation(_) => "validation",
            BrowserError::Auth(_) => "auth",
            BrowserError::Network(_) => "network",
            BrowserError::NotFound(_) => "not_found",
            BrowserError::Provider(_) => "provider",
            BrowserError::Io(_) => "io",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            BrowserError::Validation(_) => StatusCode::BAD_REQUEST,
            BrowserError::Auth(_) => StatusCode::UNAUTHORIZED,
            BrowserError::NotFound(_) => StatusCode::NOT_FOUND,
            BrowserError::Network(_) | BrowserError::Provider(_) => StatusCode::BAD_GATEWAY,
            BrowserError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for BrowserError {
    fn from(err: std::io::Error) -> Self {
        BrowserError::Io(err.to_string())
    }
}

impl From<super::InvalidPrefix> for BrowserError {
    fn from(err: super::InvalidPrefix) -> Self {
        BrowserError::Validation(err.to_string())
    }
}

/// Tagged failure body: `{success: false, error, kind, requestId}`
impl IntoResponse for BrowserError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
            "kind": self.kind(),
            "requestId": uuid::Uuid::new_v4().to_string(),
        }));

        (self.status_code(), body).into_response()
    }
}
