//! Parsed `CLUSTER INFO` and `CLUSTER NODES` replies.
//!
//! Only what the `topology` command and the live slot table read is kept:
//! overall health, who is a primary, who replicates whom, and which slot
//! ranges each primary serves.

use std::collections::BTreeMap;
use std::str::FromStr;

use thiserror::Error;

use crate::slots::{SlotRange, TOTAL_SLOTS};

/// A cluster reply that does not have the expected shape.
#[derive(Error, Debug)]
pub enum ReplyError {
    #[error("CLUSTER INFO has no '{0}' field")]
    MissingField(&'static str),

    #[error("CLUSTER INFO field '{field}' has unexpected value '{value}'")]
    BadField { field: &'static str, value: String },

    #[error("Unreadable CLUSTER NODES line '{line}': {reason}")]
    BadNodeLine { line: String, reason: String },
}

/// `cluster_state` from `CLUSTER INFO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterState {
    Ok,
    Fail,
}

impl FromStr for ClusterState {
    type Err = ReplyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ok" => Ok(ClusterState::Ok),
            "fail" => Ok(ClusterState::Fail),
            other => Err(ReplyError::BadField {
                field: "cluster_state",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ClusterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ClusterState::Ok => "ok",
            ClusterState::Fail => "fail",
        })
    }
}

/// The `CLUSTER INFO` counters the health line uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterInfo {
    pub state: ClusterState,
    pub slots_assigned: u32,
    pub slots_pfail: u32,
    pub slots_fail: u32,
    pub known_nodes: u32,
    /// Missing on some older servers, then 0.
    pub current_epoch: u64,
}

impl ClusterInfo {
    /// Parse a `CLUSTER INFO` reply. Unknown fields are ignored.
    pub fn parse(reply: &str) -> Result<Self, ReplyError> {
        let fields: BTreeMap<&str, &str> = reply
            .lines()
            .filter_map(|line| line.trim().split_once(':'))
            .collect();

        let field = |name: &'static str| {
            fields
                .get(name)
                .copied()
                .ok_or(ReplyError::MissingField(name))
        };
        let counter = |name: &'static str| -> Result<u32, ReplyError> {
            let value = field(name)?;
            value.parse().map_err(|_| ReplyError::BadField {
                field: name,
                value: value.to_string(),
            })
        };

        Ok(ClusterInfo {
            state: field("cluster_state")?.parse()?,
            slots_assigned: counter("cluster_slots_assigned")?,
            slots_pfail: counter("cluster_slots_pfail")?,
            slots_fail: counter("cluster_slots_fail")?,
            known_nodes: counter("cluster_known_nodes")?,
            current_epoch: fields
                .get("cluster_current_epoch")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        })
    }

    pub fn all_slots_assigned(&self) -> bool {
        self.slots_assigned == u32::from(TOTAL_SLOTS)
    }

    /// State `ok` with no failing slots.
    pub fn is_healthy(&self) -> bool {
        self.state == ClusterState::Ok && self.slots_fail == 0 && self.slots_pfail == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Master,
    Replica,
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            NodeRole::Master => "master",
            NodeRole::Replica => "replica",
        })
    }
}

/// One line of `CLUSTER NODES`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterNode {
    pub node_id: String,
    /// `host:port` clients connect to, without the bus port.
    pub address: String,
    pub role: NodeRole,
    /// The primary this node replicates, for replicas.
    pub primary_id: Option<String>,
    /// Flagged `fail`, `fail?`, `handshake` or `noaddr`.
    pub failing: bool,
    pub connected: bool,
    pub slots: Vec<SlotRange>,
}

impl ClusterNode {
    pub fn role(&self) -> NodeRole {
        self.role
    }

    /// Reachable and not suspected of failure.
    pub fn is_healthy(&self) -> bool {
        !self.failing && self.connected
    }

    fn slot_count(&self) -> u32 {
        self.slots.iter().map(|r| u32::from(r.count())).sum()
    }
}

impl FromStr for ClusterNode {
    type Err = ReplyError;

    /// `<id> <host:port@bus[,hostname]> <flags> <primary> <ping> <pong>
    /// <epoch> <link> <slot>...`
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let bad = |reason: String| ReplyError::BadNodeLine {
            line: line.to_string(),
            reason,
        };

        let fields: Vec<&str> = line.split_whitespace().collect();
        let [node_id, endpoint, flags, primary, _, _, _, link, slots @ ..] = fields.as_slice()
        else {
            return Err(bad(format!("expected at least 8 fields, got {}", fields.len())));
        };

        let address = endpoint.split(['@', ',']).next().unwrap_or_default();
        if address.rsplit_once(':').is_none_or(|(_, port)| port.parse::<u16>().is_err()) {
            return Err(bad(format!("'{}' is not host:port", address)));
        }

        let mut role = NodeRole::Replica;
        let mut failing = false;
        for flag in flags.split(',') {
            match flag {
                "master" => role = NodeRole::Master,
                "fail" | "fail?" | "pfail" | "handshake" | "noaddr" => failing = true,
                _ => {}
            }
        }

        // `[slot->-id]` and `[slot-<-id]` mark a slot being moved; the owner
        // is still listed as a plain range.
        let slots = slots
            .iter()
            .filter(|s| !s.starts_with('['))
            .map(|s| s.parse::<SlotRange>().map_err(|e| bad(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ClusterNode {
            node_id: (*node_id).to_string(),
            address: address.to_string(),
            role,
            primary_id: (*primary != "-").then(|| (*primary).to_string()),
            failing,
            connected: *link == "connected",
            slots,
        })
    }
}

/// A whole `CLUSTER NODES` reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedClusterNodes {
    pub nodes: Vec<ClusterNode>,
}

impl ParsedClusterNodes {
    pub fn parse(reply: &str) -> Result<Self, ReplyError> {
        let nodes = reply
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::parse)
            .collect::<Result<_, _>>()?;
        Ok(Self { nodes })
    }

    pub fn masters(&self) -> Vec<&ClusterNode> {
        self.with_role(NodeRole::Master)
    }

    pub fn replicas(&self) -> Vec<&ClusterNode> {
        self.with_role(NodeRole::Replica)
    }

    fn with_role(&self, role: NodeRole) -> Vec<&ClusterNode> {
        self.nodes.iter().filter(|n| n.role == role).collect()
    }

    /// Replicas of the primary with id `primary_id`, in reply order.
    pub fn replicas_of(&self, primary_id: &str) -> Vec<&ClusterNode> {
        self.nodes
            .iter()
            .filter(|n| n.primary_id.as_deref() == Some(primary_id))
            .collect()
    }

    pub fn all_slots_assigned(&self) -> bool {
        let assigned: u32 = self.masters().iter().map(|m| m.slot_count()).sum();
        assigned == u32::from(TOTAL_SLOTS)
    }
}
