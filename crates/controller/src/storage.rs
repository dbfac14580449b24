//! Persistent topology storage
//!
//! The durable source of truth for the topology. The in-memory view in
//! [`crate::local`] is rebuilt from here on startup.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::metadata::{Cluster, Topology};

/// Persistence commit primitive
///
/// Writes must be idempotent when retried with an equal payload.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Load the full persisted topology
    async fn load(&self) -> Result<Topology, StorageError>;

    /// Insert or replace one cluster
    async fn put_cluster(&self, namespace: &str, cluster: &Cluster) -> Result<(), StorageError>;

    /// Delete one cluster; deleting a missing cluster succeeds
    async fn delete_cluster(&self, namespace: &str, cluster: &str) -> Result<(), StorageError>;
}

/// File storage
///
/// Keeps the whole topology in a single JSON document.
pub struct FileStorage {
    /// Data directory
    data_dir: PathBuf,
    /// Topology file path
    topology_path: PathBuf,
    /// Last written document; serializes writers
    current: Mutex<Option<Topology>>,
}

impl FileStorage {
    /// Create file storage
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        let topology_path = data_dir.join("topology.json");
        Self {
            data_dir,
            topology_path,
            current: Mutex::new(None),
        }
    }

    /// Ensure data directory exists
    async fn ensure_dir(&self) -> Result<(), StorageError> {
        if !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir).await?;
            info!("Created data directory: {:?}", self.data_dir);
        }
        Ok(())
    }

    async fn read_file(&self) -> Result<Topology, StorageError> {
        if !self.topology_path.exists() {
            return Ok(Topology::new());
        }
        let content = fs::read_to_string(&self.topology_path).await?;
        serde_json::from_str(&content).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn write_file(&self, topology: &Topology) -> Result<(), StorageError> {
        self.ensure_dir().await?;

        // Write to temp file first, then atomically rename
        let temp_path = self.topology_path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(topology)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        fs::write(&temp_path, &content).await?;
        fs::rename(&temp_path, &self.topology_path).await?;
        Ok(())
    }

    /// Apply `f` to the persisted document and write it back
    async fn modify<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut Topology) + Send,
    {
        let mut current = self.current.lock().await;
        let mut topology = match current.as_ref() {
            Some(topology) => topology.clone(),
            None => self.read_file().await?,
        };
        f(&mut topology);
        self.write_file(&topology).await?;
        *current = Some(topology);
        Ok(())
    }

    /// Backup current topology file
    pub async fn backup(&self) -> Result<PathBuf, StorageError> {
        if !self.topology_path.exists() {
            return Err(StorageError::NotFound(self.topology_path.clone()));
        }

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let backup_path = self
            .data_dir
            .join(format!("topology_{}.json.bak", timestamp));

        fs::copy(&self.topology_path, &backup_path).await?;
        info!("Backed up topology to {:?}", backup_path);

        Ok(backup_path)
    }
}

#[async_trait]
impl Persistence for FileStorage {
    async fn load(&self) -> Result<Topology, StorageError> {
        let mut current = self.current.lock().await;
        let topology = self.read_file().await?;
        info!(
            "Loaded topology from {:?}: {} namespaces, {} clusters",
            self.topology_path,
            topology.namespaces.len(),
            topology.cluster_count()
        );
        *current = Some(topology.clone());
        Ok(topology)
    }

    async fn put_cluster(&self, namespace: &str, cluster: &Cluster) -> Result<(), StorageError> {
        self.modify(|topology| topology.put_cluster(namespace, cluster.clone()))
            .await?;
        debug!(
            "Persisted cluster {}/{} at version {}",
            namespace, cluster.name, cluster.version
        );
        Ok(())
    }

    async fn delete_cluster(&self, namespace: &str, cluster: &str) -> Result<(), StorageError> {
        self.modify(|topology| {
            topology.remove_cluster(namespace, cluster);
        })
        .await?;
        debug!("Deleted persisted cluster {}/{}", namespace, cluster);
        Ok(())
    }
}

/// In-memory storage with failure and latency injection
#[derive(Default)]
pub struct MemoryStorage {
    topology: Mutex<Topology>,
    fail_writes: AtomicBool,
    write_delay: parking_lot::Mutex<Option<Duration>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing topology
    pub fn with_topology(topology: Topology) -> Self {
        Self {
            topology: Mutex::new(topology),
            ..Self::default()
        }
    }

    /// Make subsequent writes fail with `StorageError::Unavailable`
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Delay subsequent writes
    pub fn set_write_delay(&self, delay: Option<Duration>) {
        *self.write_delay.lock() = delay;
    }

    /// Copy of what is currently persisted
    pub async fn snapshot(&self) -> Topology {
        self.topology.lock().await.clone()
    }

    async fn before_write(&self) -> Result<(), StorageError> {
        let delay = *self.write_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("write rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Persistence for MemoryStorage {
    async fn load(&self) -> Result<Topology, StorageError> {
        Ok(self.topology.lock().await.clone())
    }

    async fn put_cluster(&self, namespace: &str, cluster: &Cluster) -> Result<(), StorageError> {
        self.before_write().await?;
        self.topology
            .lock()
            .await
            .put_cluster(namespace, cluster.clone());
        Ok(())
    }

    async fn delete_cluster(&self, namespace: &str, cluster: &str) -> Result<(), StorageError> {
        self.before_write().await?;
        self.topology.lock().await.remove_cluster(namespace, cluster);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{NodeInfo, Shard, SlotRange};

    fn sample_cluster() -> Cluster {
        let mut shard = Shard::with_nodes(vec![
            NodeInfo::master("n1", "127.0.0.1:6379"),
            NodeInfo::replica("n2", "127.0.0.1:6380"),
        ]);
        shard.slot_ranges.push(SlotRange::new(0, 8191));
        let mut cluster = Cluster::with_shards("c1", vec![shard]);
        cluster.version = 3;
        cluster
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        assert_eq!(storage.load().await.unwrap(), Topology::new());

        storage.put_cluster("ns", &sample_cluster()).await.unwrap();
        storage.put_cluster("ns", &Cluster::new("c2")).await.unwrap();

        // A fresh instance reads the same document back
        let reopened = FileStorage::new(dir.path());
        let loaded = reopened.load().await.unwrap();
        assert_eq!(loaded.cluster("ns", "c1"), Some(&sample_cluster()));
        assert_eq!(loaded.cluster_count(), 2);

        reopened.delete_cluster("ns", "c1").await.unwrap();
        reopened.delete_cluster("ns", "missing").await.unwrap();
        let loaded = FileStorage::new(dir.path()).load().await.unwrap();
        assert!(loaded.cluster("ns", "c1").is_none());
        assert!(loaded.cluster("ns", "c2").is_some());
    }

    #[tokio::test]
    async fn test_backup() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(matches!(
            storage.backup().await,
            Err(StorageError::NotFound(_))
        ));

        storage.put_cluster("ns", &sample_cluster()).await.unwrap();
        let backup = storage.backup().await.unwrap();
        assert!(backup.exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("topology.json"), "{not json").unwrap();

        let storage = FileStorage::new(dir.path());
        assert!(matches!(
            storage.load().await,
            Err(StorageError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_storage_failure_injection() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        assert!(storage.put_cluster("ns", &sample_cluster()).await.is_err());
        assert_eq!(storage.snapshot().await, Topology::new());

        storage.set_fail_writes(false);
        storage.put_cluster("ns", &sample_cluster()).await.unwrap();
        assert!(storage.snapshot().await.cluster("ns", "c1").is_some());
    }
}
