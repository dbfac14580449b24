//! Shard operations

use tracing::debug;

use super::TopologyStore;
use crate::error::{Result, TopologyError};
use crate::event::{Command, Event};
use crate::metadata::{
    merge_slot_ranges, remove_slot_ranges, validate_slot_ranges, Shard, SlotRange,
};

impl TopologyStore {
    /// Copy of every shard of a cluster, in index order
    pub async fn list_shards(&self, namespace: &str, cluster: &str) -> Result<Vec<Shard>> {
        let local = self.read_gate().await?;
        Ok(local.cluster_copy(namespace, cluster)?.shards)
    }

    /// Copy of one shard
    pub async fn get_shard(&self, namespace: &str, cluster: &str, index: usize) -> Result<Shard> {
        let local = self.read_gate().await?;
        let topo = local.cluster_copy(namespace, cluster)?;
        topo.shard(index).cloned()
    }

    /// Append a shard; returns its index
    pub async fn create_shard(
        &self,
        namespace: &str,
        cluster: &str,
        mut shard: Shard,
    ) -> Result<usize> {
        let mut local = self.write_gate().await?;
        let mut topo = local.cluster_copy(namespace, cluster)?;

        shard.validate()?;
        shard.normalize();
        topo.shards.push(shard);
        let index = topo.shards.len() - 1;

        let version = self.commit(&mut local, namespace, topo).await?;
        self.publish(Event::shard(namespace, cluster, index, Command::Create, version));
        Ok(index)
    }

    /// Remove a shard that owns no slots
    ///
    /// Shards after it shift down by one index.
    pub async fn remove_shard(&self, namespace: &str, cluster: &str, index: usize) -> Result<()> {
        let mut local = self.write_gate().await?;
        let mut topo = local.cluster_copy(namespace, cluster)?;

        if topo.shard(index)?.has_slots() {
            debug!("Rejected removal of shard {} in {}/{}: owns slots", index, namespace, cluster);
            return Err(TopologyError::ShardHasSlots);
        }
        topo.shards.remove(index);

        let version = self.commit(&mut local, namespace, topo).await?;
        self.publish(Event::shard(namespace, cluster, index, Command::Remove, version));
        Ok(())
    }

    /// Merge slot ranges into a shard that has at least one node
    pub async fn add_shard_slots(
        &self,
        namespace: &str,
        cluster: &str,
        index: usize,
        ranges: &[SlotRange],
    ) -> Result<()> {
        let mut local = self.write_gate().await?;
        validate_slot_ranges(ranges)?;
        let mut topo = local.cluster_copy(namespace, cluster)?;

        let shard = topo.shard_mut(index)?;
        if shard.is_empty() {
            debug!("Rejected slot assignment to empty shard {} in {}/{}", index, namespace, cluster);
            return Err(TopologyError::EmptyShard);
        }
        shard.slot_ranges = merge_slot_ranges(&shard.slot_ranges, ranges);

        let version = self.commit(&mut local, namespace, topo).await?;
        self.publish(Event::shard(namespace, cluster, index, Command::AddSlots, version));
        Ok(())
    }

    /// Subtract slot ranges from a shard
    pub async fn remove_shard_slots(
        &self,
        namespace: &str,
        cluster: &str,
        index: usize,
        ranges: &[SlotRange],
    ) -> Result<()> {
        let mut local = self.write_gate().await?;
        validate_slot_ranges(ranges)?;
        let mut topo = local.cluster_copy(namespace, cluster)?;

        let shard = topo.shard_mut(index)?;
        shard.slot_ranges = remove_slot_ranges(&shard.slot_ranges, ranges);

        let version = self.commit(&mut local, namespace, topo).await?;
        self.publish(Event::shard(namespace, cluster, index, Command::RemoveSlots, version));
        Ok(())
    }
}
