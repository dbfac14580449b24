//! Shard definitions and slot range arithmetic

use serde::{Deserialize, Serialize};

use super::NodeInfo;
use crate::error::{Result, TopologyError};

/// Closed interval of hash slots `[start, stop]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotRange {
    /// First slot (inclusive)
    pub start: u32,
    /// Last slot (inclusive)
    pub stop: u32,
}

impl SlotRange {
    pub fn new(start: u32, stop: u32) -> Self {
        Self { start, stop }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.stop
    }

    /// Number of slots
    pub fn slot_count(&self) -> u64 {
        u64::from(self.stop) - u64::from(self.start) + 1
    }

    /// Overlapping or directly adjacent
    fn touches(&self, other: &SlotRange) -> bool {
        u64::from(self.start) <= u64::from(other.stop) + 1
            && u64::from(other.start) <= u64::from(self.stop) + 1
    }
}

impl std::fmt::Display for SlotRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.stop {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.stop)
        }
    }
}

/// Reject any range with `start > stop`
pub fn validate_slot_ranges(ranges: &[SlotRange]) -> Result<()> {
    match ranges.iter().find(|r| !r.is_valid()) {
        Some(range) => Err(TopologyError::InvalidSlotRange(*range)),
        None => Ok(()),
    }
}

/// Union of `existing` and `added` in canonical form (sorted, coalesced)
pub fn merge_slot_ranges(existing: &[SlotRange], added: &[SlotRange]) -> Vec<SlotRange> {
    let mut all: Vec<SlotRange> = existing.iter().chain(added).copied().collect();
    all.sort();

    let mut merged: Vec<SlotRange> = Vec::with_capacity(all.len());
    for range in all {
        match merged.last_mut() {
            Some(last) if last.touches(&range) => {
                last.stop = last.stop.max(range.stop);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// `existing` minus every range in `removed`, in canonical form
pub fn remove_slot_ranges(existing: &[SlotRange], removed: &[SlotRange]) -> Vec<SlotRange> {
    let mut remaining = merge_slot_ranges(existing, &[]);
    for cut in removed {
        let mut next = Vec::with_capacity(remaining.len() + 1);
        for range in remaining {
            if cut.stop < range.start || cut.start > range.stop {
                next.push(range);
                continue;
            }
            if cut.start > range.start {
                next.push(SlotRange::new(range.start, cut.start - 1));
            }
            if cut.stop < range.stop {
                next.push(SlotRange::new(cut.stop + 1, range.stop));
            }
        }
        remaining = next;
    }
    remaining
}

/// Lifecycle state derived from a shard's nodes and slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShardState {
    /// No nodes
    Empty,
    /// Master only
    Primary,
    /// Master plus replicas
    Replicated,
    /// Owns slots
    Serving,
}

impl std::fmt::Display for ShardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShardState::Empty => write!(f, "empty"),
            ShardState::Primary => write!(f, "primary"),
            ShardState::Replicated => write!(f, "replicated"),
            ShardState::Serving => write!(f, "serving"),
        }
    }
}

/// Shard: a node group owning a set of slot ranges
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    /// Owned slot ranges, canonical form
    #[serde(default)]
    pub slot_ranges: Vec<SlotRange>,
    /// Member nodes, master and replicas
    #[serde(default)]
    pub nodes: Vec<NodeInfo>,
}

impl Shard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nodes(nodes: Vec<NodeInfo>) -> Self {
        Self {
            slot_ranges: Vec::new(),
            nodes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn has_slots(&self) -> bool {
        !self.slot_ranges.is_empty()
    }

    pub fn master(&self) -> Option<&NodeInfo> {
        self.nodes.iter().find(|n| n.is_master())
    }

    pub fn master_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_master()).count()
    }

    pub fn replicas(&self) -> impl Iterator<Item = &NodeInfo> {
        self.nodes.iter().filter(|n| !n.is_master())
    }

    /// Position of the node with the given ID
    pub fn position(&self, node_id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == node_id)
    }

    pub fn has_address(&self, address: &str) -> bool {
        self.nodes.iter().any(|n| n.address == address)
    }

    pub fn slot_count(&self) -> u64 {
        self.slot_ranges.iter().map(SlotRange::slot_count).sum()
    }

    pub fn state(&self) -> ShardState {
        if self.nodes.is_empty() {
            ShardState::Empty
        } else if self.has_slots() {
            ShardState::Serving
        } else if self.nodes.len() == 1 {
            ShardState::Primary
        } else {
            ShardState::Replicated
        }
    }

    /// Check the shard-local invariants of a shard supplied from outside
    pub fn validate(&self) -> Result<()> {
        validate_slot_ranges(&self.slot_ranges)?;
        for (i, node) in self.nodes.iter().enumerate() {
            if self.nodes[..i].iter().any(|n| n.address == node.address) {
                return Err(TopologyError::NodeAlreadyExists(node.address.clone()));
            }
        }
        if self.nodes.is_empty() {
            if self.has_slots() {
                return Err(TopologyError::EmptyShard);
            }
            return Ok(());
        }
        match self.master_count() {
            0 => Err(TopologyError::MasterRequiredFirst),
            1 => Ok(()),
            _ => Err(TopologyError::MasterAlreadyPresent),
        }
    }

    /// Bring slot ranges into canonical form
    pub(crate) fn normalize(&mut self) {
        self.slot_ranges = merge_slot_ranges(&self.slot_ranges, &[]);
    }
}
