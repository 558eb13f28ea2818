#![allow(dead_code)]

mod fake_s3;
mod flaky;

pub use fake_s3::FakeS3;
pub use flaky::FlakyGateway;

use bucket_browser::{BrowserController, CredentialStore, Credentials, InMemoryGateway, StorageGateway};
use std::sync::Arc;
use tempfile::TempDir;

// Well-formed key pair (32 and 64 hex characters)
pub const TEST_ACCESS_KEY_ID: &str = "0123456789abcdef0123456789abcdef";
pub const TEST_SECRET_ACCESS_KEY: &str =
    "fedcba9876543210fedcba9876543210fedcba9876543210fedcba9876543210";
pub const TEST_BUCKET: &str = "media";

pub fn test_credentials(endpoint: &str) -> Credentials {
    Credentials::new(endpoint, TEST_ACCESS_KEY_ID, TEST_SECRET_ACCESS_KEY)
}

/// Controller over an in-memory gateway with a throwaway credential store
pub struct TestBrowser {
    pub controller: BrowserController,
    pub gateway: InMemoryGateway,
    pub store: CredentialStore,
    _dir: TempDir,
}

impl TestBrowser {
    pub fn new(gateway: InMemoryGateway) -> Self {
        Self::over(gateway.clone(), Arc::new(gateway))
    }

    /// The controller talks to `backend`; `gateway` is the store behind it
    pub fn over(gateway: InMemoryGateway, backend: Arc<dyn StorageGateway>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));
        let controller = BrowserController::new(backend, store.clone());

        TestBrowser {
            controller,
            gateway,
            store,
            _dir: dir,
        }
    }

    /// `media` holding a small tree with a directory marker
    pub async fn seeded() -> Self {
        Self::new(seeded_gateway().await)
    }

    /// The seeded tree behind a gateway whose failures the test controls
    pub async fn flaky() -> (Self, Arc<FlakyGateway>) {
        let gateway = seeded_gateway().await;
        let flaky = Arc::new(FlakyGateway::new(gateway.clone()));
        (Self::over(gateway, flaky.clone()), flaky)
    }
}

async fn seeded_gateway() -> InMemoryGateway {
    let gateway = InMemoryGateway::with_buckets([TEST_BUCKET, "backups"]);
    for (key, data) in [
        ("readme.txt", "hello"),
        ("docs/", ""),
        ("docs/guide.pdf", "pdf"),
        ("docs/2024/report.csv", "a,b"),
        ("photos/cat.jpg", "meow"),
    ] {
        gateway.seed(TEST_BUCKET, key, data).await;
    }
    gateway
}
