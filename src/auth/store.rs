use crate::types::{BrowserError, BrowserResult, Credentials};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "bucket-browser";
const FILE_NAME: &str = "credentials.json";

#[derive(Serialize, Deserialize)]
struct StoredRecord {
    credentials: Credentials,
}

/// Local persistence of one credential record ("remember me").
///
/// Synchronous and only touched at login/logout boundaries. Every file handle
/// is scoped to the call that opened it.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the per-user config directory
    pub fn open_default() -> BrowserResult<Self> {
        Ok(Self::new(config_dir()?.join(FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, credentials: &Credentials) -> BrowserResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                BrowserError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let record = StoredRecord {
            credentials: credentials.clone(),
        };
        let json = serde_json::to_vec_pretty(&record)
            .map_err(|e| BrowserError::Io(format!("Failed to encode credentials: {}", e)))?;

        // Write beside the target and rename so a crash never leaves half a record
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)
                .map_err(|e| BrowserError::Io(format!("Failed to create {}: {}", tmp.display(), e)))?;
            restrict_permissions(&file);
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;

        tracing::info!("Saved credentials for {} to {}", credentials.key_hint(), self.path.display());
        Ok(())
    }

    /// `None` when nothing has been saved
    pub fn get(&self) -> BrowserResult<Option<Credentials>> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BrowserError::Io(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let record: StoredRecord = serde_json::from_slice(&content).map_err(|e| {
            BrowserError::Io(format!("Corrupt credential file {}: {}", self.path.display(), e))
        })?;

        Ok(Some(record.credentials))
    }

    /// Removing a record that does not exist succeeds
    pub fn delete(&self) -> BrowserResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("Removed saved credentials at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BrowserError::Io(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(file: &fs::File) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(e) = file.set_permissions(fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Could not restrict credential file permissions: {}", e);
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &fs::File) {}

fn config_dir() -> BrowserResult<PathBuf> {
    let home = if cfg!(target_os = "windows") {
        std::env::var("USERPROFILE").or_else(|_| std::env::var("HOME"))
    } else {
        std::env::var("HOME")
    }
    .map_err(|_| BrowserError::Io("Unable to resolve the home directory".to_string()))?;

    let mut path = PathBuf::from(home);
    if cfg!(target_os = "macos") {
        path.push("Library");
        path.push("Application Support");
    } else {
        path.push(".config");
    }
    path.push(APP_DIR);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Credentials {
        Credentials::new("https://s3.example.com", "a".repeat(32), "b".repeat(64)).with_bucket("media")
    }

    #[test]
    fn test_save_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("nested").join(FILE_NAME));

        assert_eq!(store.get().unwrap(), None);

        store.save(&sample()).unwrap();
        assert_eq!(store.get().unwrap(), Some(sample()));

        store.delete().unwrap();
        assert_eq!(store.get().unwrap(), None);
        // second delete is a no-op
        store.delete().unwrap();
    }

    #[test]
    fn test_save_overwrites_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join(FILE_NAME));

        store.save(&sample()).unwrap();
        let replacement = Credentials::new("other", "c".repeat(32), "d".repeat(64));
        store.save(&replacement).unwrap();

        assert_eq!(store.get().unwrap(), Some(replacement));
        assert!(!dir.path().join("credentials.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FILE_NAME);
        fs::write(&path, "{not json").unwrap();

        let store = CredentialStore::new(path);
        assert!(matches!(store.get(), Err(BrowserError::Io(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join(FILE_NAME));
        store.save(&sample()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
