//! Topology metadata definitions
//!
//! Namespaces contain clusters, clusters are sequences of shards, shards own
//! slot ranges and a node group with exactly one master.

mod node;
mod shard;
mod cluster;

pub use node::{NodeId, NodeInfo, NodeRole};
pub use shard::{
    merge_slot_ranges, remove_slot_ranges, validate_slot_ranges, Shard, ShardState, SlotRange,
};
pub use cluster::{Cluster, Topology};
