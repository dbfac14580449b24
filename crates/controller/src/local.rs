//! Local topology view
//!
//! In-memory cache of the persisted topology. Every write goes to the
//! persistence backend first; memory is only replaced once that succeeded.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use crate::error::{Result, StorageError, TopologyError};
use crate::metadata::{Cluster, Topology};
use crate::storage::Persistence;

/// In-memory topology backed by a persistence primitive
pub struct LocalTopology {
    topology: Topology,
    persistence: Arc<dyn Persistence>,
    /// Deadline for a single persistence write
    commit_timeout: Duration,
}

impl LocalTopology {
    /// Rebuild the view from what is persisted
    pub async fn load(
        persistence: Arc<dyn Persistence>,
        commit_timeout: Duration,
    ) -> std::result::Result<Self, StorageError> {
        let topology = persistence.load().await?;
        Ok(Self {
            topology,
            persistence,
            commit_timeout,
        })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn contains(&self, namespace: &str, cluster: &str) -> bool {
        self.topology.cluster(namespace, cluster).is_some()
    }

    /// Deep, owned copy of one cluster
    pub fn cluster_copy(&self, namespace: &str, cluster: &str) -> Result<Cluster> {
        self.topology
            .cluster(namespace, cluster)
            .cloned()
            .ok_or_else(|| TopologyError::cluster_not_found(namespace, cluster))
    }

    /// Persist `cluster`, then replace the in-memory copy
    pub async fn update_cluster(
        &mut self,
        namespace: &str,
        cluster: Cluster,
    ) -> std::result::Result<(), StorageError> {
        let persistence = self.persistence.clone();
        let owned_namespace = namespace.to_string();
        let payload = cluster.clone();
        self.write(namespace, &cluster.name, async move {
            persistence.put_cluster(&owned_namespace, &payload).await
        })
        .await?;
        self.topology.put_cluster(namespace, cluster);
        Ok(())
    }

    /// Delete persisted cluster, then drop the in-memory copy
    pub async fn remove_cluster(
        &mut self,
        namespace: &str,
        cluster: &str,
    ) -> std::result::Result<Option<Cluster>, StorageError> {
        let persistence = self.persistence.clone();
        let owned_namespace = namespace.to_string();
        let owned_cluster = cluster.to_string();
        self.write(namespace, cluster, async move {
            persistence
                .delete_cluster(&owned_namespace, &owned_cluster)
                .await
        })
        .await?;
        Ok(self.topology.remove_cluster(namespace, cluster))
    }

    /// Run one persistence write under the commit deadline
    ///
    /// The write runs on its own task so it cannot be abandoned halfway. On
    /// timeout it is awaited to completion and the in-memory copy of the
    /// cluster is written back, so disk never holds a rejected mutation.
    async fn write<F>(
        &self,
        namespace: &str,
        cluster: &str,
        write: F,
    ) -> std::result::Result<(), StorageError>
    where
        F: Future<Output = std::result::Result<(), StorageError>> + Send + 'static,
    {
        let mut task = tokio::spawn(write);
        match tokio::time::timeout(self.commit_timeout, &mut task).await {
            Ok(joined) => joined.map_err(|e| StorageError::Unavailable(e.to_string()))?,
            Err(_) => {
                warn!(
                    "Write of {}/{} exceeded {:?}, rolling back",
                    namespace, cluster, self.commit_timeout
                );
                if let Err(e) = task.await {
                    warn!("Timed out write of {}/{} aborted: {}", namespace, cluster, e);
                }
                if let Err(e) = self.restore(namespace, cluster).await {
                    error!("Rollback of {}/{} failed: {}", namespace, cluster, e);
                }
                Err(StorageError::Timeout(self.commit_timeout))
            }
        }
    }

    /// Write the in-memory state of one cluster back to persistence
    async fn restore(&self, namespace: &str, cluster: &str) -> std::result::Result<(), StorageError> {
        match self.topology.cluster(namespace, cluster) {
            Some(current) => self.persistence.put_cluster(namespace, current).await,
            None => self.persistence.delete_cluster(namespace, cluster).await,
        }
    }
}
