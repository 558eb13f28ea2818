use super::prefix::FolderPrefix;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Connection parameters for an S3-compatible endpoint
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,
}

impl Credentials {
    pub fn new(
        endpoint: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            bucket_name: None,
        }
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket_name = Some(bucket.into());
        self
    }

    /// Copy with surrounding whitespace removed from every field.
    /// A blank bucket name collapses to `None`.
    pub fn trimmed(&self) -> Self {
        Self {
            endpoint: self.endpoint.trim().to_string(),
            access_key_id: self.access_key_id.trim().to_string(),
            secret_access_key: self.secret_access_key.trim().to_string(),
            bucket_name: self
                .bucket_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        }
    }

    /// Access key id shortened for logs and status lines
    pub fn key_hint(&self) -> String {
        let visible: String = self.access_key_id.chars().take(8).collect();
        format!("{}...", visible)
    }
}

// Keeps the secret out of debug output and logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.key_hint())
            .field("secret_access_key", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .finish()
    }
}

/// One remote object as returned by a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectEntry {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketInfo {
    pub name: String,
    pub creation_date: Option<DateTime<Utc>>,
}

/// Result of a single delimited listing, already split into files and folders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub files: Vec<ObjectEntry>,
    pub folders: Vec<FolderPrefix>,
}
