//! Node membership definitions

use serde::{Deserialize, Serialize};

/// Node ID
pub type NodeId = String;

/// Node role within a shard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Serves writes for the shard's slots
    Master,
    /// Replicates from the master
    Replica,
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeRole::Master => write!(f, "master"),
            NodeRole::Replica => write!(f, "replica"),
        }
    }
}

/// Database server membership record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Stable unique identifier
    pub id: NodeId,
    /// Address (host:port), unique within a shard
    pub address: String,
    /// Role within the shard
    pub role: NodeRole,
}

impl NodeInfo {
    pub fn new(id: impl Into<NodeId>, address: impl Into<String>, role: NodeRole) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            role,
        }
    }

    pub fn master(id: impl Into<NodeId>, address: impl Into<String>) -> Self {
        Self::new(id, address, NodeRole::Master)
    }

    pub fn replica(id: impl Into<NodeId>, address: impl Into<String>) -> Self {
        Self::new(id, address, NodeRole::Replica)
    }

    pub fn is_master(&self) -> bool {
        self.role == NodeRole::Master
    }
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{} ({})", self.id, self.address, self.role)
    }
}
