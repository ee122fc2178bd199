

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use super::error::{PipelineError, Result};
use crate::pipeline::models::{OntologyContext, PipelineConfig};
use crate::pipeline::template::TemplateSet;


#[derive(Debug, Clone)]
pub struct PipelineSnapshot {
    pub config: PipelineConfig,
    pub templates: TemplateSet,
    pub ontology: OntologyContext,
    pub fingerprint: String,
    pub loaded_at: DateTime<Utc>,
}

impl PipelineSnapshot {
    pub fn new(config: PipelineConfig, templates: TemplateSet, ontology: OntologyContext) -> Result<Self> {
        let fingerprint = fingerprint(&config)?;
        Ok(Self {
            config,
            templates,
            ontology,
            fingerprint,
            loaded_at: Utc::now(),
        })
    }
}

pub fn fingerprint(config: &PipelineConfig) -> Result<String> {
    let bytes = serde_json::to_vec(config)
        .map_err(|e| PipelineError::Config(format!("cannot serialize configuration: {e}")))?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}


#[derive(Default)]
pub struct SnapshotCell {
    current: RwLock<Option<Arc<PipelineSnapshot>>>,
    reload_lock: Mutex<()>,
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<PipelineSnapshot>> {
        self.current.read().clone()
    }

    pub fn install(&self, snapshot: PipelineSnapshot) -> Arc<PipelineSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write() = Some(Arc::clone(&snapshot));
        snapshot
    }

    /// Runs `build` under the reload lock and installs its snapshot on success.
    /// On failure the previously installed snapshot stays in place.
    pub async fn reload<F, Fut>(&self, build: F) -> Result<Arc<PipelineSnapshot>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<PipelineSnapshot>>,
    {
        let _guard = self.reload_lock.lock().await;
        let snapshot = build().await?;
        Ok(self.install(snapshot))
    }

    /// Returns the installed snapshot, building one if the cell is still empty.
    pub async fn get_or_load<F, Fut>(&self, build: F) -> Result<Arc<PipelineSnapshot>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<PipelineSnapshot>>,
    {
        if let Some(snapshot) = self.current() {
            return Ok(snapshot);
        }
        let _guard = self.reload_lock.lock().await;
        if let Some(snapshot) = self.current() {
            return Ok(snapshot);
        }
        let snapshot = build().await?;
        Ok(self.install(snapshot))
    }
}
