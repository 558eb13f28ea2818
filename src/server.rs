use crate::{app_state::AppState, auth, handlers};
use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    routing::post,
};
use tower_http::trace::TraceLayer;

/// Create the host API router
///
/// Shared by `serve` and the integration tests so both run the same stack.
/// `api_token` of `None` leaves the API open; bind it to loopback in that case.
pub fn create_app(app_state: AppState, api_token: Option<String>) -> Router {
    use handlers::{
        delete_credentials, delete_file, download_file, get_credentials, list_buckets, list_files,
        not_found, save_credentials, upload_file,
    };

    Router::new()
        .route("/api/list-buckets", post(list_buckets))
        .route("/api/list-files", post(list_files))
        .route("/api/upload-file", post(upload_file))
        .route("/api/delete-file", post(delete_file))
        .route("/api/download-file", post(download_file))
        .route(
            "/api/credentials",
            post(save_credentials)
                .get(get_credentials)
                .delete(delete_credentials),
        )
        .fallback(not_found)
        .with_state(app_state)
        .layer(middleware::from_fn(move |request: Request, next: Next| {
            let token = api_token.clone();
            async move { auth::token_middleware(token, request, next).await }
        }))
        .layer(TraceLayer::new_for_http())
}
