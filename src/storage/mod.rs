pub mod endpoint;
mod gateway;
mod in_memory;
mod s3;

pub use endpoint::normalize_endpoint;
pub use gateway::{ObjectStream, ObjectUpload, StorageGateway};
pub use in_memory::{CallCounts, InMemoryGateway, ListingGate};
pub use s3::{DEFAULT_REGION, S3Gateway};
