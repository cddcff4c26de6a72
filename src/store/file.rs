//! JSON file configuration store.
//!
//! Persists the target document to a single file on disk. Replacement
//! writes a sibling temp file and renames it over the target, so a reader
//! never observes a torn document. A read-only permission bit on the file
//! is cleared for the duration of the replace and restored afterwards,
//! letting the document stay write-protected between maintenance passes.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::error::{ReconcilerError, ReconcilerResult};
use crate::core::types::AddressSet;
use crate::store::{ConfigurationStore, TargetDocument};

/// File-backed store holding one JSON target document
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    async fn is_write_protected(&self) -> ReconcilerResult<bool> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => Ok(meta.permissions().readonly()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ReconcilerError::config_write(format!(
                "Failed to stat {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    #[allow(clippy::permissions_set_readonly_false)]
    async fn set_write_protected(&self, protected: bool) -> ReconcilerResult<()> {
        let meta = tokio::fs::metadata(&self.path).await.map_err(|e| {
            ReconcilerError::config_write(format!("Failed to stat {}: {}", self.path.display(), e))
        })?;

        let mut perms = meta.permissions();
        perms.set_readonly(protected);
        tokio::fs::set_permissions(&self.path, perms).await.map_err(|e| {
            ReconcilerError::config_write(format!(
                "Failed to change permissions on {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl ConfigurationStore for JsonFileStore {
    async fn read_configured(&self) -> ReconcilerResult<AddressSet> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            // No document yet means nothing is configured
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(AddressSet::new()),
            Err(e) => {
                return Err(ReconcilerError::config_read(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let document: TargetDocument = serde_json::from_str(&content).map_err(|e| {
            ReconcilerError::config_read(format!(
                "Malformed target document {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(document.targets)
    }

    async fn replace_configured(&self, addresses: &AddressSet) -> ReconcilerResult<()> {
        let document = TargetDocument {
            targets: addresses.clone(),
        };
        let payload = serde_json::to_vec_pretty(&document).map_err(|e| {
            ReconcilerError::config_write(format!("Failed to serialize target document: {}", e))
        })?;

        let was_protected = self.is_write_protected().await?;
        if was_protected {
            self.set_write_protected(false).await?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, &payload).await.map_err(|e| {
            ReconcilerError::config_write(format!("Failed to write {}: {}", temp.display(), e))
        })?;

        tokio::fs::rename(&temp, &self.path).await.map_err(|e| {
            ReconcilerError::config_write(format!(
                "Failed to move {} into place: {}",
                temp.display(),
                e
            ))
        })?;

        if was_protected {
            self.set_write_protected(true).await?;
        }

        debug!(
            path = %self.path.display(),
            targets = addresses.len(),
            "Replaced target document"
        );
        Ok(())
    }
}
