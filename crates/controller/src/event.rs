//! Topology change events
//!
//! One event is published per accepted mutation, after its commit.

use serde::{Deserialize, Serialize};

/// Shard index carried by events that are not shard-scoped
pub const NO_SHARD: i32 = -1;

/// Entity an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum EventType {
    Cluster = 1,
    Shard = 2,
    Node = 3,
}

/// What happened to the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum Command {
    Create = 1,
    Remove = 2,
    Update = 3,
    AddSlots = 4,
    RemoveSlots = 5,
}

impl From<EventType> for i32 {
    fn from(value: EventType) -> Self {
        value as i32
    }
}

impl TryFrom<i32> for EventType {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(EventType::Cluster),
            2 => Ok(EventType::Shard),
            3 => Ok(EventType::Node),
            other => Err(format!("unknown event type {}", other)),
        }
    }
}

impl From<Command> for i32 {
    fn from(value: Command) -> Self {
        value as i32
    }
}

impl TryFrom<i32> for Command {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Command::Create),
            2 => Ok(Command::Remove),
            3 => Ok(Command::Update),
            4 => Ok(Command::AddSlots),
            5 => Ok(Command::RemoveSlots),
            other => Err(format!("unknown command {}", other)),
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Cluster => write!(f, "cluster"),
            EventType::Shard => write!(f, "shard"),
            EventType::Node => write!(f, "node"),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Create => write!(f, "create"),
            Command::Remove => write!(f, "remove"),
            Command::Update => write!(f, "update"),
            Command::AddSlots => write!(f, "add_slots"),
            Command::RemoveSlots => write!(f, "remove_slots"),
        }
    }
}

/// Immutable record of an accepted mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub namespace: String,
    pub cluster: String,
    /// Shard index at commit time, `NO_SHARD` for cluster events
    pub shard: i32,
    #[serde(rename = "nodeID", default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub command: Command,
    /// Cluster version produced by the mutation
    #[serde(default)]
    pub version: u64,
}

impl Event {
    pub fn cluster(namespace: &str, cluster: &str, command: Command, version: u64) -> Self {
        Self {
            namespace: namespace.to_string(),
            cluster: cluster.to_string(),
            shard: NO_SHARD,
            node_id: None,
            event_type: EventType::Cluster,
            command,
            version,
        }
    }

    pub fn shard(
        namespace: &str,
        cluster: &str,
        shard: usize,
        command: Command,
        version: u64,
    ) -> Self {
        Self {
            namespace: namespace.to_string(),
            cluster: cluster.to_string(),
            shard: shard_index(shard),
            node_id: None,
            event_type: EventType::Shard,
            command,
            version,
        }
    }

    pub fn node(
        namespace: &str,
        cluster: &str,
        shard: usize,
        node_id: &str,
        command: Command,
        version: u64,
    ) -> Self {
        Self {
            namespace: namespace.to_string(),
            cluster: cluster.to_string(),
            shard: shard_index(shard),
            node_id: Some(node_id.to_string()),
            event_type: EventType::Node,
            command,
            version,
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} {} {} shard={} v{}",
            self.namespace, self.cluster, self.event_type, self.command, self.shard, self.version
        )?;
        if let Some(node_id) = &self.node_id {
            write!(f, " node={}", node_id)?;
        }
        Ok(())
    }
}

fn shard_index(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_shape() {
        let event = Event::node("a", "c", 0, "n1", Command::Create, 2);
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["namespace"], "a");
        assert_eq!(value["cluster"], "c");
        assert_eq!(value["shard"], 0);
        assert_eq!(value["nodeID"], "n1");
        assert_eq!(value["type"], 3);
        assert_eq!(value["command"], 1);

        let decoded: Event = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_cluster_event_omits_node_id() {
        let event = Event::cluster("a", "c", Command::Remove, 7);
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["shard"], NO_SHARD);
        assert_eq!(value["type"], 1);
        assert_eq!(value["command"], 2);
        assert!(value.get("nodeID").is_none());
    }

    #[test]
    fn test_unknown_discriminant_rejected() {
        assert!(EventType::try_from(9).is_err());
        assert!(Command::try_from(0).is_err());
        assert_eq!(Command::try_from(4), Ok(Command::AddSlots));
    }
}
