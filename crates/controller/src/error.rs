//! Error types
//!
//! Every rejection the topology store can produce is a distinct variant so
//! callers can match on the kind instead of parsing messages.

use std::path::PathBuf;
use std::time::Duration;

use crate::metadata::SlotRange;

/// Result type alias for topology operations
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Persistence layer error
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Commit timed out after {0:?}")]
    Timeout(Duration),
}

/// Topology store error
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("not the leader, mutations and reads must go to the leader controller")]
    NotLeader,
    #[error("cluster {namespace}/{cluster} not found")]
    ClusterNotFound { namespace: String, cluster: String },
    #[error("cluster {namespace}/{cluster} already exists")]
    ClusterAlreadyExists { namespace: String, cluster: String },
    #[error("shard index {index} out of range (shard count {len})")]
    ShardIndexOutOfRange { index: usize, len: usize },
    #[error("node {0} not found")]
    NodeNotFound(String),
    #[error("node with address {0} already exists in the shard")]
    NodeAlreadyExists(String),
    #[error("the master node must be added first")]
    MasterRequiredFirst,
    #[error("the shard already has a master node")]
    MasterAlreadyPresent,
    #[error("the shard still owns slots, migrate them first")]
    SlotsPresentMigrateFirst,
    #[error("remove the replica nodes before removing the master")]
    RemoveReplicasFirst,
    #[error("the shard still owns slots, remove them before removing the shard")]
    ShardHasSlots,
    #[error("the shard has no nodes, add a master first")]
    EmptyShard,
    #[error("invalid slot range {0}")]
    InvalidSlotRange(SlotRange),
    #[error("node {0} is not a replica")]
    NotReplica(String),
    #[error("the shard has no master node")]
    NoMaster,
    #[error("commit failed: {0}")]
    CommitFailed(#[source] StorageError),
}

impl TopologyError {
    pub(crate) fn cluster_not_found(namespace: &str, cluster: &str) -> Self {
        Self::ClusterNotFound {
            namespace: namespace.to_string(),
            cluster: cluster.to_string(),
        }
    }
}
