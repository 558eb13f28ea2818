use bucket_browser::{
    BrowserError, BrowserResult, Credentials, InMemoryGateway, StorageGateway,
    storage::{ObjectStream, ObjectUpload},
    types::{BucketInfo, Listing, Prefix},
};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Delegates to an in-memory gateway, failing or stalling calls on demand
#[derive(Default)]
pub struct FlakyGateway {
    pub inner: InMemoryGateway,
    refuse_deletes: AtomicBool,
    fail_listings: AtomicBool,
    hold_uploads: AtomicBool,
    upload_parked: Notify,
    upload_released: Notify,
}

impl FlakyGateway {
    pub fn new(inner: InMemoryGateway) -> Self {
        FlakyGateway {
            inner,
            ..Default::default()
        }
    }

    /// Every delete answers Access Denied
    pub fn refuse_deletes(&self) {
        self.refuse_deletes.store(true, Ordering::SeqCst);
    }

    /// Every object listing from now on times out
    pub fn fail_listings(&self) {
        self.fail_listings.store(true, Ordering::SeqCst);
    }

    /// Park the next upload until `release_upload`
    pub fn hold_uploads(&self) {
        self.hold_uploads.store(true, Ordering::SeqCst);
    }

    /// Resolves once an upload is parked
    pub async fn upload_parked(&self) {
        self.upload_parked.notified().await;
    }

    pub fn release_upload(&self) {
        self.upload_released.notify_one();
    }
}

#[async_trait::async_trait]
impl StorageGateway for FlakyGateway {
    async fn list_buckets(&self, credentials: &Credentials) -> BrowserResult<Vec<BucketInfo>> {
        self.inner.list_buckets(credentials).await
    }

    async fn list_objects(
        &self,
        credentials: &Credentials,
        bucket: &str,
        prefix: &Prefix,
    ) -> BrowserResult<Listing> {
        if self.fail_listings.load(Ordering::SeqCst) {
            return Err(BrowserError::Network("listing timed out".to_string()));
        }
        self.inner.list_objects(credentials, bucket, prefix).await
    }

    async fn put_object(
        &self,
        credentials: &Credentials,
        bucket: &str,
        upload: ObjectUpload,
    ) -> BrowserResult<()> {
        if self.hold_uploads.swap(false, Ordering::SeqCst) {
            self.upload_parked.notify_one();
            self.upload_released.notified().await;
        }
        self.inner.put_object(credentials, bucket, upload).await
    }

    async fn get_object(
        &self,
        credentials: &Credentials,
        bucket: &str,
        key: &str,
    ) -> BrowserResult<ObjectStream> {
        self.inner.get_object(credentials, bucket, key).await
    }

    async fn delete_object(&self, credentials: &Credentials, bucket: &str, key: &str) -> BrowserResult<()> {
        if self.refuse_deletes.load(Ordering::SeqCst) {
            return Err(BrowserError::Auth("Access Denied".to_string()));
        }
        self.inner.delete_object(credentials, bucket, key).await
    }
}
