//! Cluster and namespace topology

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Shard;
use crate::error::{Result, TopologyError};

/// Cluster: a versioned, ordered sequence of shards
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster name, unique within its namespace
    pub name: String,
    /// Incremented once by every accepted mutation
    pub version: u64,
    /// Shards, addressed by position
    #[serde(default)]
    pub shards: Vec<Shard>,
}

impl Cluster {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 0,
            shards: Vec::new(),
        }
    }

    pub fn with_shards(name: impl Into<String>, shards: Vec<Shard>) -> Self {
        Self {
            name: name.into(),
            version: 0,
            shards,
        }
    }

    pub fn shard(&self, index: usize) -> Result<&Shard> {
        let len = self.shards.len();
        self.shards
            .get(index)
            .ok_or(TopologyError::ShardIndexOutOfRange { index, len })
    }

    pub fn shard_mut(&mut self, index: usize) -> Result<&mut Shard> {
        let len = self.shards.len();
        self.shards
            .get_mut(index)
            .ok_or(TopologyError::ShardIndexOutOfRange { index, len })
    }

    pub fn node_count(&self) -> usize {
        self.shards.iter().map(|s| s.nodes.len()).sum()
    }
}

/// Namespace name -> cluster name -> cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub namespaces: BTreeMap<String, BTreeMap<String, Cluster>>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cluster(&self, namespace: &str, cluster: &str) -> Option<&Cluster> {
        self.namespaces.get(namespace)?.get(cluster)
    }

    /// Insert or replace a cluster, creating its namespace if needed
    pub fn put_cluster(&mut self, namespace: &str, cluster: Cluster) {
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(cluster.name.clone(), cluster);
    }

    /// Remove a cluster; the namespace goes with its last cluster
    pub fn remove_cluster(&mut self, namespace: &str, cluster: &str) -> Option<Cluster> {
        let clusters = self.namespaces.get_mut(namespace)?;
        let removed = clusters.remove(cluster);
        if clusters.is_empty() {
            self.namespaces.remove(namespace);
        }
        removed
    }

    pub fn cluster_count(&self) -> usize {
        self.namespaces.values().map(|c| c.len()).sum()
    }
}
