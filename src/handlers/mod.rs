mod credentials;
mod delete_file;
mod download_file;
mod list_buckets;
mod list_files;
mod not_found;
mod upload_file;

pub use credentials::{delete_credentials, get_credentials, save_credentials};
pub use delete_file::delete_file;
pub use download_file::download_file;
pub use list_buckets::list_buckets;
pub use list_files::list_files;
pub use not_found::not_found;
pub use upload_file::upload_file;

use axum::Json;
use serde::Serialize;

/// `{"success": true, ...payload}`
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    success: bool,
    #[serde(flatten)]
    payload: T,
}

pub(crate) fn success<T: Serialize>(payload: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        payload,
    })
}

#[derive(Debug, Serialize)]
pub struct Empty {}
