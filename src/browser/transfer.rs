use crate::storage::{ObjectStream, ObjectUpload, StorageGateway};
use crate::types::{BrowserError, BrowserResult, Credentials, Prefix};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::io::ReaderStream;

/// Where a download should land. `None` means the user declined.
#[async_trait::async_trait]
pub trait SaveDialog: Send + Sync {
    async fn choose_destination(&self, key: &str) -> Option<PathBuf>;
}

/// A destination decided up front (CLI flag, host API request field)
#[derive(Debug, Clone)]
pub struct FixedDestination(pub Option<PathBuf>);

#[async_trait::async_trait]
impl SaveDialog for FixedDestination {
    async fn choose_destination(&self, _key: &str) -> Option<PathBuf> {
        self.0.clone()
    }
}

/// Saves into a directory under the object's own file name
#[derive(Debug, Clone)]
pub struct DirectoryDestination(pub PathBuf);

#[async_trait::async_trait]
impl SaveDialog for DirectoryDestination {
    async fn choose_destination(&self, key: &str) -> Option<PathBuf> {
        let name = key.rsplit('/').next().filter(|name| !name.is_empty())?;
        Some(self.0.join(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Completed { path: PathBuf, bytes: u64 },
    /// The user declined the destination chooser. Not an error.
    Canceled,
}

/// Key an upload of `file_path` gets under `prefix`
pub fn destination_key(prefix: &Prefix, file_path: &Path) -> BrowserResult<String> {
    let name = file_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            BrowserError::Validation(format!("{} has no usable file name", file_path.display()))
        })?;

    Ok(prefix.join_key(name))
}

pub fn content_type_for(file_path: &Path) -> String {
    mime_guess::from_path(file_path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Streams single objects between local files and the gateway.
/// Refreshing listings afterwards is the controller's job.
#[derive(Clone)]
pub struct TransferOrchestrator {
    gateway: Arc<dyn StorageGateway>,
}

impl TransferOrchestrator {
    pub fn new(gateway: Arc<dyn StorageGateway>) -> Self {
        Self { gateway }
    }

    /// Upload `file_path` to `prefix` + its file name; returns the key
    pub async fn upload(
        &self,
        credentials: &Credentials,
        bucket: &str,
        prefix: &Prefix,
        file_path: &Path,
    ) -> BrowserResult<String> {
        let key = destination_key(prefix, file_path)?;
        let content_type = content_type_for(file_path);

        let file = tokio::fs::File::open(file_path).await.map_err(|e| {
            BrowserError::Io(format!("Failed to open {}: {}", file_path.display(), e))
        })?;
        let content_length = file.metadata().await?.len();

        tracing::info!(
            "Uploading {} to {}/{} ({} bytes, {})",
            file_path.display(),
            bucket,
            key,
            content_length,
            content_type
        );

        let source = file_path.display().to_string();
        let body = ReaderStream::new(file).map(move |chunk| {
            chunk.map_err(|e| BrowserError::Io(format!("Failed reading {}: {}", source, e)))
        });

        let upload = ObjectUpload {
            key: key.clone(),
            body: Box::pin(body),
            content_length: Some(content_length),
            content_type,
        };

        self.gateway.put_object(credentials, bucket, upload).await?;
        Ok(key)
    }

    /// Ask for a destination, then stream the object into it.
    /// A declined chooser never reaches the gateway.
    pub async fn download(
        &self,
        credentials: &Credentials,
        bucket: &str,
        key: &str,
        dialog: &dyn SaveDialog,
    ) -> BrowserResult<DownloadOutcome> {
        let Some(path) = dialog.choose_destination(key).await else {
            tracing::info!("Download of {}/{} canceled", bucket, key);
            return Ok(DownloadOutcome::Canceled);
        };

        let stream = self.gateway.get_object(credentials, bucket, key).await?;

        match write_stream(&path, stream).await {
            Ok(bytes) => {
                tracing::info!("Downloaded {}/{} to {} ({} bytes)", bucket, key, path.display(), bytes);
                Ok(DownloadOutcome::Completed { path, bytes })
            }
            Err(err) => {
                tracing::error!("Download of {}/{} failed: {}", bucket, key, err);
                // Leave no partial file behind
                let _ = tokio::fs::remove_file(&path).await;
                Err(err)
            }
        }
    }

    pub async fn delete(&self, credentials: &Credentials, bucket: &str, key: &str) -> BrowserResult<()> {
        tracing::info!("Deleting {}/{}", bucket, key);
        self.gateway.delete_object(credentials, bucket, key).await
    }
}

/// Complete once every chunk is written and flushed
async fn write_stream(path: &Path, mut stream: ObjectStream) -> BrowserResult<u64> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let file = tokio::fs::File::create(path)
        .await
        .map_err(|e| BrowserError::Io(format!("Failed to create {}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    writer.flush().await?;
    Ok(written)
}
