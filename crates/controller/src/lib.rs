//! Controller - cluster topology metadata store
//!
//! Holds the authoritative topology of a sharded key-value database:
//! namespaces contain clusters, clusters are sequences of shards, shards own
//! hash-slot ranges and a node group (one master, zero or more replicas).
//!
//! # Features
//! - Leader-gated reads and mutations under a single reader-writer lock
//! - Shard and node invariants (single master, unique addresses, slot safety)
//! - Per-cluster version bumped once per accepted mutation
//! - Write-through persistence with a commit deadline
//! - Ordered, non-blocking change event stream for reconcilers
//!
//! # Usage Example
//! ```ignore
//! use controller::{Controller, ControllerConfig};
//!
//! let controller = Controller::new(ControllerConfig::default()).await?;
//! let mut events = controller.store().subscribe().unwrap();
//! controller.store().create_cluster("ns", Cluster::new("c")).await?;
//! ```

pub mod config;
pub mod emitter;
pub mod error;
pub mod event;
pub mod leader;
pub mod local;
pub mod metadata;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use config::ControllerConfig;
pub use emitter::{EventEmitter, EventStream};
pub use error::{Result, StorageError, TopologyError};
pub use event::{Command, Event, EventType};
pub use leader::{LeaderFlag, Leadership};
pub use metadata::{Cluster, NodeInfo, NodeRole, Shard, SlotRange, Topology};
pub use store::TopologyStore;

use std::sync::Arc;
use tracing::{info, warn};

use crate::storage::FileStorage;

/// Controller process state
pub struct Controller {
    config: ControllerConfig,
    storage: Arc<FileStorage>,
    leader: LeaderFlag,
    store: Arc<TopologyStore>,
}

impl Controller {
    /// Create controller instance backed by file storage
    pub async fn new(config: ControllerConfig) -> std::result::Result<Self, StorageError> {
        let storage = Arc::new(FileStorage::new(&config.storage.data_dir));
        let leader = LeaderFlag::new(config.leader.standalone);
        let store = TopologyStore::open(
            storage.clone(),
            Arc::new(leader.clone()),
            &config.store,
        )
        .await?;

        info!(
            "Controller initialized: data_dir={:?}, leader={}",
            config.storage.data_dir,
            leader.is_leader()
        );

        Ok(Self {
            config,
            storage,
            leader,
            store: Arc::new(store),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Get the topology store
    pub fn store(&self) -> &Arc<TopologyStore> {
        &self.store
    }

    /// Leadership flag, for an external election loop to flip
    pub fn leader(&self) -> &LeaderFlag {
        &self.leader
    }

    /// Backup the persisted topology
    pub async fn backup(&self) -> std::result::Result<std::path::PathBuf, StorageError> {
        self.storage.backup().await
    }

    /// Start the reconciler feed: logs every event until the store goes away
    ///
    /// Returns `None` if the event stream was already taken.
    pub fn start_event_logger(&self) -> Option<tokio::task::JoinHandle<()>> {
        let mut events = self.store.subscribe()?;

        Some(tokio::spawn(async move {
            let mut seen_dropped = 0;
            while let Some(event) = events.recv().await {
                let dropped = events.dropped();
                if dropped > seen_dropped {
                    warn!(
                        "{} events lost, reconciler must resync from a snapshot",
                        dropped - seen_dropped
                    );
                    seen_dropped = dropped;
                }
                info!("Reconcile: {}", event);
            }
        }))
    }
}
