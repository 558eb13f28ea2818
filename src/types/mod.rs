pub mod error;
mod models;
mod prefix;

pub use error::{BrowserError, BrowserResult};
pub use models::{BucketInfo, Credentials, Listing, ObjectEntry};
pub use prefix::{FolderPrefix, InvalidPrefix, Prefix};
