//! Topology store
//!
//! Leader-gated, event-emitting mutation engine over the local topology.
//!
//! Every public operation takes the single store-wide lock (read for
//! queries, write for mutations), then checks leadership under that lock.
//! Mutations edit a deep copy of the target cluster, bump its version by
//! exactly one, commit it through the persistence primitive, and only after
//! a successful commit publish an [`Event`].
//!
//! Operations are grouped by entity:
//! - `cluster`: namespaces and clusters
//! - `shard`: shards and their slot ranges
//! - `node`: nodes within a shard

mod cluster;
mod node;
mod shard;

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::emitter::{EventEmitter, EventStream};
use crate::error::{Result, StorageError, TopologyError};
use crate::event::Event;
use crate::leader::Leadership;
use crate::local::LocalTopology;
use crate::metadata::Cluster;
use crate::storage::Persistence;

/// Topology store
pub struct TopologyStore {
    /// Guards the whole topology of all namespaces
    local: RwLock<LocalTopology>,
    leadership: Arc<dyn Leadership>,
    emitter: EventEmitter,
}

impl TopologyStore {
    /// Open the store, rebuilding the in-memory view from persistence
    pub async fn open(
        persistence: Arc<dyn Persistence>,
        leadership: Arc<dyn Leadership>,
        config: &StoreConfig,
    ) -> std::result::Result<Self, StorageError> {
        let local = LocalTopology::load(persistence, config.commit_timeout()).await?;
        info!(
            "Topology store opened: {} namespaces, {} clusters",
            local.topology().namespaces.len(),
            local.topology().cluster_count()
        );
        Ok(Self {
            local: RwLock::new(local),
            leadership,
            emitter: EventEmitter::new(config.event_channel_capacity),
        })
    }

    /// Take the change event stream (single subscriber)
    pub fn subscribe(&self) -> Option<EventStream> {
        self.emitter.subscribe()
    }

    /// Events dropped because the channel was full
    pub fn dropped_events(&self) -> u64 {
        self.emitter.dropped()
    }

    pub fn is_leader(&self) -> bool {
        self.leadership.is_leader()
    }

    /// Read lock, then leadership check
    async fn read_gate(&self) -> Result<RwLockReadGuard<'_, LocalTopology>> {
        let guard = self.local.read().await;
        if !self.leadership.is_leader() {
            return Err(TopologyError::NotLeader);
        }
        Ok(guard)
    }

    /// Write lock, then leadership check
    async fn write_gate(&self) -> Result<RwLockWriteGuard<'_, LocalTopology>> {
        let guard = self.local.write().await;
        if !self.leadership.is_leader() {
            return Err(TopologyError::NotLeader);
        }
        Ok(guard)
    }

    /// Await a local write; a storage error is a failed commit
    ///
    /// The deadline is enforced by [`LocalTopology`], which leaves disk and
    /// memory equal on every outcome.
    async fn persist<T, F>(&self, write: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, StorageError>>,
    {
        write.await.map_err(|e| {
            warn!("Commit failed: {}", e);
            TopologyError::CommitFailed(e)
        })
    }

    /// Bump the copy's version and write it back
    ///
    /// Returns the committed version. On failure the local view is unchanged.
    async fn commit(
        &self,
        local: &mut LocalTopology,
        namespace: &str,
        mut cluster: Cluster,
    ) -> Result<u64> {
        cluster.version += 1;
        let version = cluster.version;
        self.persist(local.update_cluster(namespace, cluster)).await?;
        Ok(version)
    }

    /// Publish after a successful commit
    fn publish(&self, event: Event) {
        info!("Topology changed: {}", event);
        self.emitter.emit(event);
    }
}
