

use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::pipeline::models::PipelineConfig;


#[derive(Debug, Error)]
pub enum ConfigStoreError {
    #[error("Configuration record has not been seeded at {0}")]
    NotSeeded(String),
    #[error("IO error on configuration record: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}


#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn load(&self) -> Result<PipelineConfig, ConfigStoreError>;

    /// Replaces the whole record. No field-level merge.
    async fn save(&self, config: &PipelineConfig) -> Result<(), ConfigStoreError>;
}


pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("FileConfigStore using {}", path.display());
        Self { path }
    }

    /// Unique per call; concurrent saves never share a staging file.
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn load(&self) -> Result<PipelineConfig, ConfigStoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigStoreError::NotSeeded(self.path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let config = serde_json::from_str(&raw)?;
        debug!("Loaded configuration record from {}", self.path.display());
        Ok(config)
    }

    async fn save(&self, config: &PipelineConfig) -> Result<(), ConfigStoreError> {
        let staging = self.staging_path();
        let raw = serde_json::to_vec_pretty(config)?;
        tokio::fs::write(&staging, raw).await?;
        if let Err(e) = tokio::fs::rename(&staging, &self.path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        info!("Configuration record written to {}", self.path.display());
        Ok(())
    }
}


#[derive(Default)]
pub struct MemoryConfigStore {
    record: RwLock<Option<PipelineConfig>>,
}

impl MemoryConfigStore {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            record: RwLock::new(Some(config)),
        }
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> Result<PipelineConfig, ConfigStoreError> {
        self.record
            .read()
            .clone()
            .ok_or_else(|| ConfigStoreError::NotSeeded("memory".to_string()))
    }

    async fn save(&self, config: &PipelineConfig) -> Result<(), ConfigStoreError> {
        *self.record.write() = Some(config.clone());
        Ok(())
    }
}
