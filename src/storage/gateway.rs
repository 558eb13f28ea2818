use crate::types::{BrowserResult, BucketInfo, Credentials, Listing, Prefix};
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

/// Streaming object body
pub type ObjectStream = Pin<Box<dyn Stream<Item = BrowserResult<Bytes>> + Send>>;

/// A single object to store
pub struct ObjectUpload {
    pub key: String,
    pub body: ObjectStream,
    pub content_length: Option<u64>,
    pub content_type: String,
}

/// Storage gateway trait - one implementation per kind of object store.
///
/// Every call is independent: the credentials travel with the request and
/// nothing is cached between calls. Failures come back as `Err`, never as panics.
#[async_trait::async_trait]
pub trait StorageGateway: Send + Sync {
    async fn list_buckets(&self, credentials: &Credentials) -> BrowserResult<Vec<BucketInfo>>;

    /// Delimited (`/`) listing of `prefix`, with the directory marker for
    /// `prefix` itself removed
    async fn list_objects(
        &self,
        credentials: &Credentials,
        bucket: &str,
        prefix: &Prefix,
    ) -> BrowserResult<Listing>;

    async fn put_object(
        &self,
        credentials: &Credentials,
        bucket: &str,
        upload: ObjectUpload,
    ) -> BrowserResult<()>;

    async fn get_object(
        &self,
        credentials: &Credentials,
        bucket: &str,
        key: &str,
    ) -> BrowserResult<ObjectStream>;

    async fn delete_object(
        &self,
        credentials: &Credentials,
        bucket: &str,
        key: &str,
    ) -> BrowserResult<()>;
}
