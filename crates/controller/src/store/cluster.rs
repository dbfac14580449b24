//! Namespace and cluster operations

use tracing::debug;

use super::TopologyStore;
use crate::error::{Result, TopologyError};
use crate::event::{Command, Event};
use crate::metadata::Cluster;

impl TopologyStore {
    /// Names of all namespaces, sorted
    pub async fn list_namespaces(&self) -> Result<Vec<String>> {
        let local = self.read_gate().await?;
        Ok(local.topology().namespaces.keys().cloned().collect())
    }

    /// Names of the clusters in a namespace, sorted
    ///
    /// An unknown namespace has no clusters.
    pub async fn list_clusters(&self, namespace: &str) -> Result<Vec<String>> {
        let local = self.read_gate().await?;
        Ok(local
            .topology()
            .namespaces
            .get(namespace)
            .map(|clusters| clusters.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// Deep copy of a cluster
    pub async fn get_cluster(&self, namespace: &str, cluster: &str) -> Result<Cluster> {
        let local = self.read_gate().await?;
        local.cluster_copy(namespace, cluster)
    }

    /// Create a cluster at version 0, creating the namespace on first use
    pub async fn create_cluster(&self, namespace: &str, mut cluster: Cluster) -> Result<()> {
        let mut local = self.write_gate().await?;
        if local.contains(namespace, &cluster.name) {
            debug!("Rejected create of existing cluster {}/{}", namespace, cluster.name);
            return Err(TopologyError::ClusterAlreadyExists {
                namespace: namespace.to_string(),
                cluster: cluster.name,
            });
        }
        for shard in cluster.shards.iter_mut() {
            shard.validate()?;
            shard.normalize();
        }
        cluster.version = 0;
        let name = cluster.name.clone();

        self.persist(local.update_cluster(namespace, cluster)).await?;

        self.publish(Event::cluster(namespace, &name, Command::Create, 0));
        Ok(())
    }

    /// Remove a cluster; its namespace disappears with its last cluster
    pub async fn remove_cluster(&self, namespace: &str, cluster: &str) -> Result<()> {
        let mut local = self.write_gate().await?;
        let version = local.cluster_copy(namespace, cluster)?.version;

        self.persist(local.remove_cluster(namespace, cluster)).await?;

        self.publish(Event::cluster(namespace, cluster, Command::Remove, version));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::StoreConfig;
    use crate::event::EventType;
    use crate::leader::LeaderFlag;
    use crate::metadata::{NodeInfo, Shard, SlotRange};
    use crate::storage::MemoryStorage;

    async fn new_store() -> TopologyStore {
        TopologyStore::open(
            Arc::new(MemoryStorage::new()),
            Arc::new(LeaderFlag::new(true)),
            &StoreConfig::default(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let store = new_store().await;
        let mut events = store.subscribe().unwrap();

        store.create_cluster("b", Cluster::new("c2")).await.unwrap();
        store.create_cluster("a", Cluster::new("c1")).await.unwrap();
        store.create_cluster("a", Cluster::new("c0")).await.unwrap();

        assert_eq!(store.list_namespaces().await.unwrap(), vec!["a", "b"]);
        assert_eq!(store.list_clusters("a").await.unwrap(), vec!["c0", "c1"]);
        assert!(store.list_clusters("missing").await.unwrap().is_empty());

        let event = events.recv().await.unwrap();
        assert_eq!(event.event_type, EventType::Cluster);
        assert_eq!(event.command, Command::Create);
        assert_eq!(event.cluster, "c2");
        assert_eq!(event.version, 0);
    }

    #[tokio::test]
    async fn test_create_duplicate_rejected() {
        let store = new_store().await;
        store.create_cluster("a", Cluster::new("c")).await.unwrap();
        assert!(matches!(
            store.create_cluster("a", Cluster::new("c")).await,
            Err(TopologyError::ClusterAlreadyExists { .. })
        ));
        // Same name in another namespace is fine
        store.create_cluster("b", Cluster::new("c")).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_validates_and_normalizes_shards() {
        let store = new_store().await;

        let bad = Cluster::with_shards(
            "bad",
            vec![Shard::with_nodes(vec![NodeInfo::replica("n1", "h1:1")])],
        );
        assert!(matches!(
            store.create_cluster("a", bad).await,
            Err(TopologyError::MasterRequiredFirst)
        ));
        assert!(store.list_namespaces().await.unwrap().is_empty());

        let mut shard = Shard::with_nodes(vec![NodeInfo::master("n1", "h1:1")]);
        shard.slot_ranges = vec![SlotRange::new(50, 99), SlotRange::new(0, 49)];
        let mut cluster = Cluster::with_shards("good", vec![shard]);
        cluster.version = 17;
        store.create_cluster("a", cluster).await.unwrap();

        let cluster = store.get_cluster("a", "good").await.unwrap();
        assert_eq!(cluster.version, 0);
        assert_eq!(cluster.shards[0].slot_ranges, vec![SlotRange::new(0, 99)]);
    }

    #[tokio::test]
    async fn test_remove_cluster_drops_empty_namespace() {
        let store = new_store().await;
        let mut events = store.subscribe().unwrap();
        store.create_cluster("a", Cluster::new("c")).await.unwrap();
        store.create_shard("a", "c", Shard::new()).await.unwrap();

        store.remove_cluster("a", "c").await.unwrap();
        assert!(store.list_namespaces().await.unwrap().is_empty());
        assert!(matches!(
            store.get_cluster("a", "c").await,
            Err(TopologyError::ClusterNotFound { .. })
        ));
        assert!(matches!(
            store.remove_cluster("a", "c").await,
            Err(TopologyError::ClusterNotFound { .. })
        ));

        let last = events.drain().pop().unwrap();
        assert_eq!(last.event_type, EventType::Cluster);
        assert_eq!(last.command, Command::Remove);
        assert_eq!(last.version, 1);
    }
}
