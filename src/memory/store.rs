//! Storage port for conversation memory.
//!
//! The whole record is rewritten on every save; there is no incremental
//! patching. `JsonFileStore` writes to a sibling temp file and renames it over
//! the target, so readers see either the old record or the new one.

use super::conversation::{Interaction, UserContext};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// The durable record: `{memory: [...], userContext: {...}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySnapshot {
    #[serde(default)]
    pub memory: Vec<Interaction>,

    #[serde(default, alias = "user_context")]
    pub user_context: UserContext,
}

/// Where conversation memory lives between runs
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet
    async fn load(&self) -> Result<Option<MemorySnapshot>>;

    async fn save(&self, snapshot: &MemorySnapshot) -> Result<()>;
}

/// Pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl MemoryStore for JsonFileStore {
    async fn load(&self) -> Result<Option<MemorySnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).await?;
        let snapshot: MemorySnapshot = serde_json::from_str(&content)?;
        debug!(
            "Loaded {} interactions from {:?}",
            snapshot.memory.len(),
            self.path
        );
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &MemorySnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.temp_path();
        if let Err(e) = write_and_replace(&tmp, &self.path, content.as_bytes()).await {
            if let Err(cleanup) = fs::remove_file(&tmp).await {
                debug!("Could not remove {:?}: {}", tmp, cleanup);
            }
            return Err(e.into());
        }
        Ok(())
    }
}

async fn write_and_replace(tmp: &Path, path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(tmp)
        .await?;
    file.write_all(content).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(tmp, path).await
}

/// Keeps the record in process memory. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<InMemoryInner>>,
}

#[derive(Debug, Default)]
struct InMemoryInner {
    snapshot: Option<MemorySnapshot>,
    saves: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing record
    pub fn with_snapshot(snapshot: MemorySnapshot) -> Self {
        Self {
            inner: Arc::new(Mutex::new(InMemoryInner {
                snapshot: Some(snapshot),
                saves: 0,
            })),
        }
    }

    pub async fn snapshot(&self) -> Option<MemorySnapshot> {
        self.inner.lock().await.snapshot.clone()
    }

    /// Number of completed saves
    pub async fn save_count(&self) -> usize {
        self.inner.lock().await.saves
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn load(&self) -> Result<Option<MemorySnapshot>> {
        Ok(self.inner.lock().await.snapshot.clone())
    }

    async fn save(&self, snapshot: &MemorySnapshot) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.snapshot = Some(snapshot.clone());
        inner.saves += 1;
        Ok(())
    }
}
