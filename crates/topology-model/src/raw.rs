//! Wire-format mirror of the topology document.
//!
//! These types track the JSON produced by the topology editor verbatim:
//! nodes, edges and interfaces arrive as lists, and per-interface queue and
//! service fields carry direction-suffixed names (`q_in`/`q_out`,
//! `mu_in`/`mu_out`, ...). [`crate::Topology::build`] normalizes them into
//! the validated model.

use serde::Deserialize;

use crate::DistParams;

#[derive(Debug, Clone, Deserialize)]
pub struct RawTopology {
    pub model: RawGlobal,
    pub nodes: Vec<RawNode>,
    pub edges: Vec<RawEdge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGlobal {
    #[serde(default)]
    pub rng: RawRng,
    pub sim: RawSim,
    pub time: RawTime,
    pub model: RawModelId,
    pub packet: RawPacket,
    pub traffic: RawTraffic,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRng {
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for RawRng {
    fn default() -> Self {
        Self { seed: default_seed() }
    }
}

fn default_seed() -> u64 {
    42
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSim {
    pub duration: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTime {
    pub unit: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawModelId {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPacket {
    pub mtu: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTraffic {
    pub capacity: RawCapacity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCapacity {
    pub dist: String,
    #[serde(default)]
    pub params: DistParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawNode {
    pub id: String,
    pub data: RawNodeData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawNodeData {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "nodeType")]
    pub node_type: String,
    #[serde(default)]
    pub generator: Option<RawGenerator>,
    pub interfaces: Vec<RawInterface>,
    #[serde(default)]
    pub processing: Option<RawProcessing>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGenerator {
    pub lambda: f64,
    #[serde(rename = "typeData")]
    pub type_data: i64,
    #[serde(rename = "capacitySource")]
    pub capacity_source: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawInterface {
    pub id: String,
    pub idx: u32,
    #[serde(default)]
    pub name: Option<String>,
    pub queue: RawQueue,
    #[serde(rename = "edgeId")]
    pub edge_id: String,
    #[serde(rename = "nextHop", default)]
    pub next_hop: Option<RawNextHop>,
    pub service: RawService,
    pub direction: String,
}

/// Queue depth under a direction-suffixed key; exactly one side is expected
/// to be present, matching the interface's `direction` tag.
#[derive(Debug, Clone, Deserialize)]
pub struct RawQueue {
    #[serde(default)]
    pub q_in: Option<i64>,
    #[serde(default)]
    pub q_out: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawNextHop {
    #[serde(default)]
    pub terminal: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawService {
    #[serde(default)]
    pub mu_in: Option<f64>,
    #[serde(default)]
    pub mu_out: Option<f64>,
    #[serde(default)]
    pub servers_in: Option<u32>,
    #[serde(default)]
    pub servers_out: Option<u32>,
    #[serde(default)]
    pub dist_in: Option<String>,
    #[serde(default)]
    pub dist_out: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawProcessing {
    pub mu: f64,
    pub dist: String,
    pub queue: i64,
    #[serde(rename = "routingTable", default)]
    pub routing_table: Vec<RawRoute>,
    #[serde(rename = "serviceLines")]
    pub service_lines: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRoute {
    #[serde(rename = "type")]
    pub packet_type: i64,
    #[serde(rename = "outPort")]
    pub out_port: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEdge {
    pub data: RawEdgeData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEdgeData {
    pub channel: RawChannel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawChannel {
    pub id: String,
    pub to: RawChannelTo,
}

/// Channel endpoint: either a named terminal sink or a (node, port) pair.
#[derive(Debug, Clone, Deserialize)]
pub struct RawChannelTo {
    #[serde(rename = "nodeId", default)]
    pub node_id: Option<String>,
    #[serde(rename = "portId", default)]
    pub port_id: Option<String>,
    #[serde(default)]
    pub terminal: Option<String>,
}
