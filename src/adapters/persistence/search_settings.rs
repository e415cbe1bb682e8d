//! Implements SettingsPort using a JSON file (`search.json`).
//!
//! Holds the scraping filters and the scheduler keyword list. Export and import copy the same
//! document to and from a user-chosen path.

use crate::domain::{DomainError, SearchSettings};
use crate::ports::SettingsPort;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::info;

/// JSON file-based settings storage with an in-memory cache.
pub struct SearchSettingsFile {
    path: PathBuf,
    cache: RwLock<Option<SearchSettings>>,
}

impl SearchSettingsFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cache: RwLock::new(None),
        }
    }

    async fn read_file(path: &Path) -> Result<Option<SearchSettings>, DomainError> {
        let raw = match fs::read_to_string(path).await {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DomainError::Config(format!("read {}: {}", path.display(), e))),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| DomainError::Config(format!("invalid settings in {}: {}", path.display(), e)))
    }

    /// Atomic save: write temp file, sync, rename over the target.
    async fn write_file(path: &Path, settings: &SearchSettings) -> Result<(), DomainError> {
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| DomainError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Config(format!("create dir: {}", e)))?;
        }
        let temp_path = path.with_extension("json.tmp");
        let mut f = fs::File::create(&temp_path)
            .await
            .map_err(|e| DomainError::Config(format!("create temp file: {}", e)))?;
        f.write_all(json.as_bytes())
            .await
            .map_err(|e| DomainError::Config(format!("write temp file: {}", e)))?;
        f.sync_all()
            .await
            .map_err(|e| DomainError::Config(format!("sync temp file: {}", e)))?;
        drop(f);
        fs::rename(&temp_path, path)
            .await
            .map_err(|e| DomainError::Config(format!("atomic rename failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl SettingsPort for SearchSettingsFile {
    async fn load(&self) -> Result<SearchSettings, DomainError> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            return Ok(cached.clone());
        }
        let settings = Self::read_file(&self.path).await?.unwrap_or_default();
        *self.cache.write().await = Some(settings.clone());
        Ok(settings)
    }

    async fn save(&self, settings: &SearchSettings) -> Result<(), DomainError> {
        Self::write_file(&self.path, settings).await?;
        *self.cache.write().await = Some(settings.clone());
        Ok(())
    }

    async fn export_to(&self, path: &Path) -> Result<(), DomainError> {
        let settings = self.load().await?;
        Self::write_file(path, &settings).await?;
        info!(path = %path.display(), keywords = settings.keywords.len(), "search settings exported");
        Ok(())
    }

    async fn import_from(&self, path: &Path) -> Result<SearchSettings, DomainError> {
        let settings = Self::read_file(path)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("settings file {}", path.display())))?;
        self.save(&settings).await?;
        info!(path = %path.display(), keywords = settings.keywords.len(), "search settings imported");
        Ok(settings)
    }
}
