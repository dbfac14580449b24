//! Node operations
//!
//! Role rules enforced here keep exactly one master in every non-empty shard
//! and never leave a slot-owning shard without its master.

use tracing::debug;

use super::TopologyStore;
use crate::error::{Result, TopologyError};
use crate::event::{Command, Event};
use crate::metadata::{NodeInfo, NodeRole};

impl TopologyStore {
    /// Copy of the nodes of one shard
    pub async fn list_nodes(
        &self,
        namespace: &str,
        cluster: &str,
        index: usize,
    ) -> Result<Vec<NodeInfo>> {
        let local = self.read_gate().await?;
        let topo = local.cluster_copy(namespace, cluster)?;
        Ok(topo.shard(index)?.nodes.clone())
    }

    /// Add a node: the first node must be the master, later ones replicas
    pub async fn create_node(
        &self,
        namespace: &str,
        cluster: &str,
        index: usize,
        node: NodeInfo,
    ) -> Result<()> {
        let mut local = self.write_gate().await?;
        let mut topo = local.cluster_copy(namespace, cluster)?;
        let shard = topo.shard_mut(index)?;

        if shard.has_address(&node.address) {
            debug!("Rejected node {}: address already in shard {}", node, index);
            return Err(TopologyError::NodeAlreadyExists(node.address));
        }
        if shard.is_empty() && !node.is_master() {
            return Err(TopologyError::MasterRequiredFirst);
        }
        if !shard.is_empty() && node.is_master() {
            return Err(TopologyError::MasterAlreadyPresent);
        }
        let node_id = node.id.clone();
        shard.nodes.push(node);

        let version = self.commit(&mut local, namespace, topo).await?;
        self.publish(Event::node(namespace, cluster, index, &node_id, Command::Create, version));
        Ok(())
    }

    /// Replace an existing node (matched by ID) in place
    ///
    /// The replacement must keep the shard's single master and must not take
    /// another node's address.
    pub async fn update_node(
        &self,
        namespace: &str,
        cluster: &str,
        index: usize,
        node: NodeInfo,
    ) -> Result<()> {
        let mut local = self.write_gate().await?;
        let mut topo = local.cluster_copy(namespace, cluster)?;
        let shard = topo.shard_mut(index)?;

        let position = shard
            .position(&node.id)
            .ok_or_else(|| TopologyError::NodeNotFound(node.id.clone()))?;
        if shard
            .nodes
            .iter()
            .any(|n| n.id != node.id && n.address == node.address)
        {
            return Err(TopologyError::NodeAlreadyExists(node.address));
        }
        match (shard.nodes[position].role, node.role) {
            (NodeRole::Master, NodeRole::Replica) => {
                debug!("Rejected demotion of master {} without failover", node.id);
                return Err(TopologyError::MasterRequiredFirst);
            }
            (NodeRole::Replica, NodeRole::Master) => {
                debug!("Rejected promotion of {} while a master exists", node.id);
                return Err(TopologyError::MasterAlreadyPresent);
            }
            _ => {}
        }
        let node_id = node.id.clone();
        shard.nodes[position] = node;

        let version = self.commit(&mut local, namespace, topo).await?;
        self.publish(Event::node(namespace, cluster, index, &node_id, Command::Update, version));
        Ok(())
    }

    /// Remove a node by ID
    pub async fn remove_node(
        &self,
        namespace: &str,
        cluster: &str,
        index: usize,
        node_id: &str,
    ) -> Result<()> {
        let mut local = self.write_gate().await?;
        let mut topo = local.cluster_copy(namespace, cluster)?;
        let shard = topo.shard_mut(index)?;

        let position = shard
            .position(node_id)
            .ok_or_else(|| TopologyError::NodeNotFound(node_id.to_string()))?;
        let is_master = shard.nodes[position].is_master();
        if shard.has_slots() {
            if shard.nodes.len() == 1 || is_master {
                debug!("Rejected removal of {}: shard {} still owns slots", node_id, index);
                return Err(TopologyError::SlotsPresentMigrateFirst);
            }
        } else if is_master && shard.replicas().next().is_some() {
            debug!("Rejected removal of master {}: replicas remain", node_id);
            return Err(TopologyError::RemoveReplicasFirst);
        }
        shard.nodes.remove(position);

        let version = self.commit(&mut local, namespace, topo).await?;
        self.publish(Event::node(namespace, cluster, index, node_id, Command::Remove, version));
        Ok(())
    }

    /// Promote a replica to master and demote the current master, in one commit
    pub async fn failover_shard(
        &self,
        namespace: &str,
        cluster: &str,
        index: usize,
        node_id: &str,
    ) -> Result<()> {
        let mut local = self.write_gate().await?;
        let mut topo = local.cluster_copy(namespace, cluster)?;
        let shard = topo.shard_mut(index)?;

        let promoted = shard
            .position(node_id)
            .ok_or_else(|| TopologyError::NodeNotFound(node_id.to_string()))?;
        if shard.nodes[promoted].is_master() {
            return Err(TopologyError::NotReplica(node_id.to_string()));
        }
        let demoted = shard
            .nodes
            .iter()
            .position(|n| n.is_master())
            .ok_or(TopologyError::NoMaster)?;
        shard.nodes[demoted].role = NodeRole::Replica;
        shard.nodes[promoted].role = NodeRole::Master;

        let version = self.commit(&mut local, namespace, topo).await?;
        self.publish(Event::node(namespace, cluster, index, node_id, Command::Update, version));
        Ok(())
    }
}
