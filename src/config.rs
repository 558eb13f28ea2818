use crate::auth::CredentialStore;
use crate::storage::{InMemoryGateway, S3Gateway, StorageGateway};
use crate::types::{BrowserError, BrowserResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Overrides the per-user credential file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_path: Option<PathBuf>,
    /// Bearer token the host API requires when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GatewayConfig {
    S3(S3GatewayConfig),
    Memory(MemoryGatewayConfig),
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig::S3(S3GatewayConfig::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3GatewayConfig {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_force_path_style")]
    pub force_path_style: bool,
}

impl Default for S3GatewayConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            force_path_style: default_force_path_style(),
        }
    }
}

fn default_region() -> String {
    crate::storage::DEFAULT_REGION.to_string()
}

fn default_force_path_style() -> bool {
    true
}

/// Offline backend, useful for demos
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryGatewayConfig {
    #[serde(default)]
    pub buckets: Vec<String>,
}

impl Config {
    /// Parse JSON, or YAML for a `.yaml`/`.yml` path
    pub fn from_file<P: AsRef<Path>>(path: P) -> BrowserResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| BrowserError::Io(format!("Failed to read {}: {}", path.display(), e)))?;

        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml" | "yml")
        );

        let parsed = if is_yaml {
            serde_yml::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|e| BrowserError::Validation(format!("Invalid config {}: {}", path.display(), e)))
    }

    pub fn gateway(&self) -> Arc<dyn StorageGateway> {
        match &self.gateway {
            GatewayConfig::S3(s3) => Arc::new(S3Gateway::new(s3.region.clone(), s3.force_path_style)),
            GatewayConfig::Memory(memory) => {
                Arc::new(InMemoryGateway::with_buckets(memory.buckets.iter().cloned()))
            }
        }
    }

    pub fn credential_store(&self) -> BrowserResult<CredentialStore> {
        match &self.credentials_path {
            Some(path) => Ok(CredentialStore::new(path.clone())),
            None => CredentialStore::open_default(),
        }
    }
}
