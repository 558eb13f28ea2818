use super::gateway::{ObjectStream, ObjectUpload, StorageGateway};
use crate::browser::navigator;
use crate::types::{BrowserError, BrowserResult, BucketInfo, Credentials, Listing, ObjectEntry, Prefix};
use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Notify, RwLock};

const CHUNK_SIZE: usize = 64 * 1024;

/// In-memory object store for offline use and tests.
///
/// Emulates delimited listings and directory markers, and counts every call
/// so callers can assert that nothing reached the "network".
#[derive(Clone, Default)]
pub struct InMemoryGateway {
    buckets: Arc<RwLock<BTreeMap<String, Bucket>>>,
    calls: Arc<CallCounters>,
    gates: Arc<Mutex<HashMap<String, Arc<Notify>>>>,
    access_key_id: Option<String>,
}

#[derive(Clone)]
struct Bucket {
    created: DateTime<Utc>,
    objects: BTreeMap<String, StoredObject>,
}

#[derive(Clone)]
struct StoredObject {
    data: Bytes,
    last_modified: DateTime<Utc>,
}

#[derive(Default)]
struct CallCounters {
    list_buckets: AtomicUsize,
    list_objects: AtomicUsize,
    put_object: AtomicUsize,
    get_object: AtomicUsize,
    delete_object: AtomicUsize,
}

/// Snapshot of how many times each operation was invoked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list_buckets: usize,
    pub list_objects: usize,
    pub put_object: usize,
    pub get_object: usize,
    pub delete_object: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.list_buckets + self.list_objects + self.put_object + self.get_object + self.delete_object
    }
}

/// Holds the next listing of one prefix until released
pub struct ListingGate {
    notify: Arc<Notify>,
}

impl ListingGate {
    pub fn release(&self) {
        self.notify.notify_one();
    }
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given (empty) buckets
    pub fn with_buckets<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let buckets = names
            .into_iter()
            .map(|name| {
                let bucket = Bucket {
                    created: Utc::now(),
                    objects: BTreeMap::new(),
                };
                (name.into(), bucket)
            })
            .collect();

        Self {
            buckets: Arc::new(RwLock::new(buckets)),
            ..Self::default()
        }
    }

    /// Reject every call whose access key id differs from `access_key_id`
    pub fn with_access_key(mut self, access_key_id: impl Into<String>) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self
    }

    /// Store an object directly, without counting a call
    pub async fn seed(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        self.seed_at(bucket, key, data, Utc::now()).await;
    }

    pub async fn seed_at(
        &self,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
        last_modified: DateTime<Utc>,
    ) {
        let mut buckets = self.buckets.write().await;
        let bucket = buckets.entry(bucket.to_string()).or_insert_with(|| Bucket {
            created: Utc::now(),
            objects: BTreeMap::new(),
        });

        bucket.objects.insert(
            key.to_string(),
            StoredObject {
                data: data.into(),
                last_modified,
            },
        );
    }

    /// Raw object contents, for assertions
    pub async fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        let buckets = self.buckets.read().await;
        buckets
            .get(bucket)
            .and_then(|b| b.objects.get(key))
            .map(|obj| obj.data.clone())
    }

    pub fn calls(&self) -> CallCounts {
        let c = &self.calls;
        CallCounts {
            list_buckets: c.list_buckets.load(Ordering::SeqCst),
            list_objects: c.list_objects.load(Ordering::SeqCst),
            put_object: c.put_object.load(Ordering::SeqCst),
            get_object: c.get_object.load(Ordering::SeqCst),
            delete_object: c.delete_object.load(Ordering::SeqCst),
        }
    }

    /// Make the next listing of `prefix` wait until the gate is released.
    /// Releasing before the listing starts lets it through immediately.
    pub fn hold_listing(&self, prefix: &str) -> ListingGate {
        let notify = Arc::new(Notify::new());
        self.lock_gates().insert(prefix.to_string(), notify.clone());
        ListingGate { notify }
    }

    fn lock_gates(&self) -> MutexGuard<'_, HashMap<String, Arc<Notify>>> {
        match self.gates.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn authorize(&self, credentials: &Credentials) -> BrowserResult<()> {
        match &self.access_key_id {
            Some(expected) if expected != credentials.access_key_id.trim() => Err(BrowserError::Auth(
                "The AWS Access Key Id you provided does not exist in our records.".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn no_such_bucket() -> BrowserError {
        BrowserError::NotFound("The specified bucket does not exist.".to_string())
    }
}

#[async_trait::async_trait]
impl StorageGateway for InMemoryGateway {
    async fn list_buckets(&self, credentials: &Credentials) -> BrowserResult<Vec<BucketInfo>> {
        self.calls.list_buckets.fetch_add(1, Ordering::SeqCst);
        self.authorize(credentials)?;

        let buckets = self.buckets.read().await;
        Ok(buckets
            .iter()
            .map(|(name, bucket)| BucketInfo {
                name: name.clone(),
                creation_date: Some(bucket.created),
            })
            .collect())
    }

    async fn list_objects(
        &self,
        credentials: &Credentials,
        bucket: &str,
        prefix: &Prefix,
    ) -> BrowserResult<Listing> {
        self.calls.list_objects.fetch_add(1, Ordering::SeqCst);

        let gate = self.lock_gates().remove(prefix.as_str());
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.authorize(credentials)?;

        let buckets = self.buckets.read().await;
        let bucket = buckets.get(bucket).ok_or_else(Self::no_such_bucket)?;

        let mut contents = Vec::new();
        let mut common_prefixes = BTreeSet::new();

        for (key, obj) in bucket.objects.range(prefix.as_str().to_string()..) {
            let Some(rest) = key.strip_prefix(prefix.as_str()) else {
                break;
            };

            match rest.find('/') {
                Some(end) => {
                    common_prefixes.insert(format!("{}{}", prefix, &rest[..=end]));
                }
                None => contents.push(ObjectEntry {
                    key: key.clone(),
                    size: obj.data.len() as u64,
                    last_modified: obj.last_modified,
                }),
            }
        }

        Ok(navigator::partition_listing(
            prefix,
            contents,
            common_prefixes.into_iter().collect(),
        ))
    }

    async fn put_object(
        &self,
        credentials: &Credentials,
        bucket: &str,
        mut upload: ObjectUpload,
    ) -> BrowserResult<()> {
        self.calls.put_object.fetch_add(1, Ordering::SeqCst);
        self.authorize(credentials)?;

        if !self.buckets.read().await.contains_key(bucket) {
            return Err(Self::no_such_bucket());
        }

        // Collect the streaming body into Bytes
        let mut data = BytesMut::new();
        while let Some(chunk) = upload.body.next().await {
            data.extend_from_slice(&chunk?);
        }

        let mut buckets = self.buckets.write().await;
        let bucket = buckets.get_mut(bucket).ok_or_else(Self::no_such_bucket)?;
        bucket.objects.insert(
            upload.key,
            StoredObject {
                data: data.freeze(),
                last_modified: Utc::now(),
            },
        );

        Ok(())
    }

    async fn get_object(
        &self,
        credentials: &Credentials,
        bucket: &str,
        key: &str,
    ) -> BrowserResult<ObjectStream> {
        self.calls.get_object.fetch_add(1, Ordering::SeqCst);
        self.authorize(credentials)?;

        let buckets = self.buckets.read().await;
        let bucket = buckets.get(bucket).ok_or_else(Self::no_such_bucket)?;
        let obj = bucket
            .objects
            .get(key)
            .ok_or_else(|| BrowserError::NotFound("The specified key does not exist.".to_string()))?;

        let data = obj.data.clone();
        let chunks: Vec<BrowserResult<Bytes>> = (0..data.len())
            .step_by(CHUNK_SIZE)
            .map(|start| Ok(data.slice(start..(start + CHUNK_SIZE).min(data.len()))))
            .collect();

        Ok(Box::pin(stream::iter(chunks)))
    }

    async fn delete_object(
        &self,
        credentials: &Credentials,
        bucket: &str,
        key: &str,
    ) -> BrowserResult<()> {
        self.calls.delete_object.fetch_add(1, Ordering::SeqCst);
        self.authorize(credentials)?;

        let mut buckets = self.buckets.write().await;
        let bucket = buckets.get_mut(bucket).ok_or_else(Self::no_such_bucket)?;

        // Deleting a missing key succeeds, as on S3
        bucket.objects.remove(key);
        Ok(())
    }
}
