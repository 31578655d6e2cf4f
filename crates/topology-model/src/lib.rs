//! Topology Model
//!
//! Typed, validated representation of a satellite-network topology document:
//!
//! - wire-format mirror of the editor JSON ([`raw`])
//! - two-phase build into immutable, id-indexed entities
//! - derived per-interface base labels used to address code blocks
//!
//! The model is constructed once per request, used purely for derivation,
//! and discarded with the response. No cross-request state.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use thiserror::Error;

pub mod raw;

use raw::{RawChannelTo, RawInterface, RawNode, RawTopology};

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("invalid field `{path}`: {reason}")]
    Validation { path: String, reason: String },
    #[error("unknown node type `{tag}` on node `{node}`")]
    UnknownNodeType { node: String, tag: String },
}

impl ModelError {
    fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Traffic direction of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "in" => Some(Direction::In),
            "out" => Some(Direction::Out),
            _ => None,
        }
    }
}

/// Closed set of node kinds. Anything else in the wire document is rejected
/// before any code is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Subscriber-cluster traffic generator.
    As,
    /// Satellite with on-board processing.
    Sc,
    /// High-altitude platform with on-board processing.
    Haps,
    /// Earth station.
    Es,
    /// Ground-segment public network operator (sink + source).
    Ssop,
}

impl NodeKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "as" => Some(NodeKind::As),
            "sc" => Some(NodeKind::Sc),
            "haps" => Some(NodeKind::Haps),
            "es" => Some(NodeKind::Es),
            "ssop" => Some(NodeKind::Ssop),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::As => "AS",
            NodeKind::Sc => "SC",
            NodeKind::Haps => "HAPS",
            NodeKind::Es => "ES",
            NodeKind::Ssop => "SSOP",
        }
    }

    /// Kinds that carry an arrival generator (traffic sources).
    pub fn generates_traffic(&self) -> bool {
        matches!(self, NodeKind::As | NodeKind::Ssop)
    }
}

/// Capacity-distribution parameters. Families use different subsets; absent
/// values default to zero and the stream index defaults at compile time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DistParams {
    #[serde(default)]
    pub rn: u32,
    #[serde(default)]
    pub min: i64,
    #[serde(default)]
    pub max: i64,
    #[serde(default)]
    pub n: i64,
    #[serde(default)]
    pub p: f64,
    #[serde(default)]
    pub nc: i64,
    #[serde(default)]
    pub m: f64,
}

/// Capacity-distribution descriptor from the global traffic settings.
#[derive(Debug, Clone)]
pub struct CapacityDist {
    pub dist: String,
    pub params: DistParams,
}

/// Global simulation settings, owned by the compilation request.
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    pub rng_seed: u64,
    pub sim_duration: u64,
    pub time_unit: String,
    pub model_id: String,
    pub mtu: u64,
    pub capacity: CapacityDist,
}

#[derive(Debug, Clone)]
pub struct GeneratorSpec {
    pub arrival_rate: f64,
    pub packet_type: i64,
    pub capacity_source: String,
}

#[derive(Debug, Clone)]
pub struct ServiceParams {
    pub mu: f64,
    pub servers: u32,
    pub dist: String,
}

/// A directional port on a node, bound to exactly one channel.
#[derive(Debug, Clone)]
pub struct Interface {
    pub id: String,
    pub idx: u32,
    pub name: Option<String>,
    pub queue_capacity: i64,
    pub edge_id: String,
    pub terminal: Option<String>,
    pub service: ServiceParams,
    pub direction: Direction,
    /// `{direction}_int{idx}_{nodeId}`, unique across the topology. This is
    /// the public name other code blocks use to address this interface.
    pub base_label: String,
}

#[derive(Debug, Clone)]
pub struct Route {
    pub packet_type: i64,
    pub out_port: u32,
}

/// Per-node service/queueing configuration plus the ordered routing table.
/// Table order defines branch priority: first match wins.
#[derive(Debug, Clone)]
pub struct ProcessingSpec {
    pub mu: f64,
    pub dist: String,
    pub queue_capacity: i64,
    pub service_lines: u32,
    pub routing_table: Vec<Route>,
}

#[derive(Debug, Clone)]
pub enum ChannelDestination {
    /// Named sink that is not another node's interface.
    Terminal(String),
    /// Another node's interface, addressed by (node id, interface id).
    Port { node_id: String, port_id: String },
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub id: String,
    pub destination: ChannelDestination,
}

#[derive(Debug, Clone)]
pub struct NodeEntity {
    pub id: String,
    pub label: Option<String>,
    pub kind: NodeKind,
    pub generator: Option<GeneratorSpec>,
    pub processing: Option<ProcessingSpec>,
    interfaces: Vec<Interface>,
    interface_index: HashMap<String, usize>,
}

impl NodeEntity {
    /// Interfaces in input-document order.
    pub fn interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter()
    }

    pub fn interface(&self, id: &str) -> Option<&Interface> {
        self.interface_index.get(id).map(|i| &self.interfaces[*i])
    }

    pub fn interfaces_with_direction(
        &self,
        direction: Direction,
    ) -> impl Iterator<Item = &Interface> {
        self.interfaces
            .iter()
            .filter(move |i| i.direction == direction)
    }

    /// Out-direction interface whose numeric index equals `idx`, as
    /// referenced by routing-table entries.
    pub fn out_interface_by_idx(&self, idx: u32) -> Option<&Interface> {
        self.interfaces
            .iter()
            .find(|i| i.direction == Direction::Out && i.idx == idx)
    }
}

/// The validated topology: global settings plus id-indexed nodes and
/// channels, both preserving input-document order.
#[derive(Debug, Clone)]
pub struct Topology {
    pub config: GlobalConfig,
    nodes: Vec<NodeEntity>,
    node_index: HashMap<String, usize>,
    channels: Vec<Channel>,
    channel_index: HashMap<String, usize>,
}

impl Topology {
    /// Build the validated model from a wire document. Fails with a
    /// [`ModelError`] naming the offending field before any code is emitted.
    pub fn build(doc: RawTopology) -> Result<Self> {
        let config = GlobalConfig {
            rng_seed: doc.model.rng.seed,
            sim_duration: doc.model.sim.duration,
            time_unit: doc.model.time.unit,
            model_id: doc.model.model.id,
            mtu: doc.model.packet.mtu,
            capacity: CapacityDist {
                dist: doc.model.traffic.capacity.dist,
                params: doc.model.traffic.capacity.params,
            },
        };

        let mut channels = Vec::with_capacity(doc.edges.len());
        let mut channel_index = HashMap::new();
        for edge in doc.edges {
            let channel = build_channel(edge.data.channel.id, edge.data.channel.to)?;
            if channel_index
                .insert(channel.id.clone(), channels.len())
                .is_some()
            {
                return Err(ModelError::invalid(
                    format!("edges[{}].data.channel.id", channel.id),
                    "duplicate channel id",
                ));
            }
            channels.push(channel);
        }

        let mut nodes = Vec::with_capacity(doc.nodes.len());
        let mut node_index = HashMap::new();
        let mut seen_labels = HashSet::new();
        for raw_node in doc.nodes {
            let node = build_node(raw_node, &mut seen_labels)?;
            if node_index.insert(node.id.clone(), nodes.len()).is_some() {
                return Err(ModelError::invalid(
                    format!("nodes[{}].id", node.id),
                    "duplicate node id",
                ));
            }
            nodes.push(node);
        }

        Ok(Self {
            config,
            nodes,
            node_index,
            channels,
            channel_index,
        })
    }

    /// Nodes in input-document order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeEntity> {
        self.nodes.iter()
    }

    pub fn node(&self, id: &str) -> Option<&NodeEntity> {
        self.node_index.get(id).map(|i| &self.nodes[*i])
    }

    pub fn channel(&self, id: &str) -> Option<&Channel> {
        self.channel_index.get(id).map(|i| &self.channels[*i])
    }

    /// All derived interface base labels across the topology.
    pub fn base_labels(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .flat_map(|n| n.interfaces.iter().map(|i| i.base_label.as_str()))
    }
}

fn build_channel(id: String, to: RawChannelTo) -> Result<Channel> {
    let destination = match (to.terminal, to.node_id, to.port_id) {
        (Some(terminal), None, None) => ChannelDestination::Terminal(terminal),
        (None, Some(node_id), Some(port_id)) => ChannelDestination::Port { node_id, port_id },
        _ => {
            return Err(ModelError::invalid(
                format!("edges[{id}].data.channel.to"),
                "expected either `terminal` or `nodeId` + `portId`",
            ))
        }
    };
    Ok(Channel { id, destination })
}

fn build_node(raw: RawNode, seen_labels: &mut HashSet<String>) -> Result<NodeEntity> {
    let node_id = raw.id;
    let kind = NodeKind::from_tag(&raw.data.node_type).ok_or_else(|| ModelError::UnknownNodeType {
        node: node_id.clone(),
        tag: raw.data.node_type.clone(),
    })?;

    let mut interfaces = Vec::with_capacity(raw.data.interfaces.len());
    let mut interface_index = HashMap::new();
    for raw_iface in raw.data.interfaces {
        let iface = build_interface(&node_id, raw_iface)?;
        if !seen_labels.insert(iface.base_label.clone()) {
            return Err(ModelError::invalid(
                format!("nodes[{}].interfaces[{}]", node_id, iface.id),
                format!("duplicate base label `{}`", iface.base_label),
            ));
        }
        if interface_index
            .insert(iface.id.clone(), interfaces.len())
            .is_some()
        {
            return Err(ModelError::invalid(
                format!("nodes[{}].interfaces[{}].id", node_id, iface.id),
                "duplicate interface id",
            ));
        }
        interfaces.push(iface);
    }

    let generator = raw.data.generator.map(|g| GeneratorSpec {
        arrival_rate: g.lambda,
        packet_type: g.type_data,
        capacity_source: g.capacity_source,
    });

    // Traffic sources sample their arrival distribution from the first
    // interface, so both must be there before generation starts.
    if kind.generates_traffic() {
        if generator.is_none() {
            return Err(ModelError::invalid(
                format!("nodes[{node_id}].generator"),
                format!("required for node type {}", kind.as_str()),
            ));
        }
        if interfaces.is_empty() {
            return Err(ModelError::invalid(
                format!("nodes[{node_id}].interfaces"),
                format!("node type {} requires at least one interface", kind.as_str()),
            ));
        }
    }

    let processing = raw.data.processing.map(|p| ProcessingSpec {
        mu: p.mu,
        dist: p.dist,
        queue_capacity: p.queue,
        service_lines: p.service_lines,
        routing_table: p
            .routing_table
            .into_iter()
            .map(|r| Route {
                packet_type: r.packet_type,
                out_port: r.out_port,
            })
            .collect(),
    });

    Ok(NodeEntity {
        id: node_id,
        label: raw.data.label,
        kind,
        generator,
        processing,
        interfaces,
        interface_index,
    })
}

fn build_interface(node_id: &str, raw: RawInterface) -> Result<Interface> {
    let path = |field: &str| format!("nodes[{}].interfaces[{}].{}", node_id, raw.id, field);

    let direction = Direction::from_tag(&raw.direction).ok_or_else(|| {
        ModelError::invalid(path("direction"), format!("expected `in` or `out`, got `{}`", raw.direction))
    })?;

    // Direction-qualified fields are selected here, once, using the
    // interface's own direction tag.
    let (queue_capacity, mu, servers, dist) = match direction {
        Direction::In => (
            raw.queue
                .q_in
                .ok_or_else(|| ModelError::invalid(path("queue.q_in"), "missing"))?,
            raw.service
                .mu_in
                .ok_or_else(|| ModelError::invalid(path("service.mu_in"), "missing"))?,
            raw.service
                .servers_in
                .ok_or_else(|| ModelError::invalid(path("service.servers_in"), "missing"))?,
            raw.service
                .dist_in
                .ok_or_else(|| ModelError::invalid(path("service.dist_in"), "missing"))?,
        ),
        Direction::Out => (
            raw.queue
                .q_out
                .ok_or_else(|| ModelError::invalid(path("queue.q_out"), "missing"))?,
            raw.service
                .mu_out
                .ok_or_else(|| ModelError::invalid(path("service.mu_out"), "missing"))?,
            raw.service
                .servers_out
                .ok_or_else(|| ModelError::invalid(path("service.servers_out"), "missing"))?,
            raw.service
                .dist_out
                .ok_or_else(|| ModelError::invalid(path("service.dist_out"), "missing"))?,
        ),
    };

    let base_label = format!("{}_int{}_{}", direction.as_str(), raw.idx, node_id);

    Ok(Interface {
        id: raw.id,
        idx: raw.idx,
        name: raw.name,
        queue_capacity,
        edge_id: raw.edge_id,
        terminal: raw.next_hop.and_then(|h| h.terminal),
        service: ServiceParams { mu, servers, dist },
        direction,
        base_label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire_doc() -> serde_json::Value {
        json!({
            "model": {
                "rng": { "seed": 42 },
                "sim": { "duration": 2880 },
                "time": { "unit": "min" },
                "model": { "id": "m1" },
                "packet": { "mtu": 1500 },
                "traffic": { "capacity": { "dist": "poisson", "params": { "m": 4 } } }
            },
            "nodes": [
                {
                    "id": "n2",
                    "data": {
                        "label": "Relay",
                        "nodeType": "sc",
                        "interfaces": [
                            {
                                "id": "i2", "idx": 0, "name": "feeder down",
                                "queue": { "q_in": 20 }, "edgeId": "e9",
                                "service": { "mu_in": 6.0, "servers_in": 1, "dist_in": "Exponential" },
                                "direction": "in"
                            },
                            {
                                "id": "i3", "idx": 0,
                                "queue": { "q_out": 15 }, "edgeId": "e2",
                                "service": { "mu_out": 7.0, "servers_out": 1, "dist_out": "Exponential" },
                                "direction": "out"
                            }
                        ],
                        "processing": {
                            "mu": 8.0, "dist": "Exponential", "queue": 50,
                            "routingTable": [ { "type": 1, "outPort": 0 } ],
                            "serviceLines": 2
                        }
                    }
                },
                {
                    "id": "n1",
                    "data": {
                        "label": "Cluster A",
                        "nodeType": "AS",
                        "generator": { "lambda": 0.5, "typeData": 1, "capacitySource": "capacity" },
                        "interfaces": [
                            {
                                "id": "i1", "idx": 0, "name": "uplink",
                                "queue": { "q_out": 10 }, "edgeId": "e1",
                                "service": { "mu_out": 5.0, "servers_out": 1, "dist_out": "Exponential" },
                                "direction": "out"
                            }
                        ]
                    }
                }
            ],
            "edges": [
                { "data": { "channel": { "id": "e1", "to": { "nodeId": "n2", "portId": "i2" } } } },
                { "data": { "channel": { "id": "e2", "to": { "terminal": "T1" } } } },
                { "data": { "channel": { "id": "e9", "to": { "terminal": "T9" } } } }
            ]
        })
    }

    fn build(value: serde_json::Value) -> Result<Topology> {
        Topology::build(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn builds_and_preserves_node_order() {
        let topo = build(wire_doc()).unwrap();
        let ids: Vec<&str> = topo.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n2", "n1"]);
        assert_eq!(topo.config.sim_duration, 2880);
        assert_eq!(topo.config.mtu, 1500);
        assert_eq!(topo.config.capacity.dist, "poisson");
    }

    #[test]
    fn derives_base_labels_deterministically() {
        let a = build(wire_doc()).unwrap();
        let b = build(wire_doc()).unwrap();
        let labels_a: Vec<String> = a.base_labels().map(String::from).collect();
        let labels_b: Vec<String> = b.base_labels().map(String::from).collect();
        assert_eq!(labels_a, labels_b);
        assert_eq!(labels_a, vec!["in_int0_n2", "out_int0_n2", "out_int0_n1"]);
    }

    #[test]
    fn selects_queue_field_by_direction() {
        let topo = build(wire_doc()).unwrap();
        let relay = topo.node("n2").unwrap();
        assert_eq!(relay.interface("i2").unwrap().queue_capacity, 20);
        assert_eq!(relay.interface("i3").unwrap().queue_capacity, 15);
        assert_eq!(relay.interface("i2").unwrap().service.mu, 6.0);
    }

    #[test]
    fn missing_direction_qualified_field_names_path() {
        let mut doc = wire_doc();
        // in-direction interface with only q_out populated
        doc["nodes"][0]["data"]["interfaces"][0]["queue"] = json!({ "q_out": 20 });
        let err = build(doc).unwrap_err();
        match err {
            ModelError::Validation { path, .. } => {
                assert_eq!(path, "nodes[n2].interfaces[i2].queue.q_in");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_node_type() {
        let mut doc = wire_doc();
        doc["nodes"][1]["data"]["nodeType"] = json!("xyz");
        let err = build(doc).unwrap_err();
        assert!(matches!(err, ModelError::UnknownNodeType { ref tag, .. } if tag == "xyz"));
    }

    #[test]
    fn node_type_tag_is_case_insensitive() {
        let topo = build(wire_doc()).unwrap();
        assert_eq!(topo.node("n2").unwrap().kind, NodeKind::Sc);
        assert_eq!(topo.node("n1").unwrap().kind, NodeKind::As);
    }

    #[test]
    fn channels_are_keyed_by_channel_id() {
        let topo = build(wire_doc()).unwrap();
        match &topo.channel("e2").unwrap().destination {
            ChannelDestination::Terminal(t) => assert_eq!(t, "T1"),
            other => panic!("unexpected destination: {other:?}"),
        }
        match &topo.channel("e1").unwrap().destination {
            ChannelDestination::Port { node_id, port_id } => {
                assert_eq!(node_id, "n2");
                assert_eq!(port_id, "i2");
            }
            other => panic!("unexpected destination: {other:?}"),
        }
    }

    #[test]
    fn rejects_ambiguous_channel_destination() {
        let mut doc = wire_doc();
        doc["edges"][1]["data"]["channel"]["to"] = json!({ "nodeId": "n2" });
        let err = build(doc).unwrap_err();
        assert!(matches!(err, ModelError::Validation { .. }));
    }

    #[test]
    fn rejects_duplicate_base_label() {
        let mut doc = wire_doc();
        // same idx + direction + node as i3
        doc["nodes"][0]["data"]["interfaces"]
            .as_array_mut()
            .unwrap()
            .push(json!({
                "id": "i4", "idx": 0,
                "queue": { "q_out": 5 }, "edgeId": "e2",
                "service": { "mu_out": 1.0, "servers_out": 1, "dist_out": "Exponential" },
                "direction": "out"
            }));
        let err = build(doc).unwrap_err();
        assert!(matches!(err, ModelError::Validation { .. }));
    }

    #[test]
    fn generator_node_requires_generator_spec() {
        let mut doc = wire_doc();
        doc["nodes"][1]["data"]
            .as_object_mut()
            .unwrap()
            .remove("generator");
        let err = build(doc).unwrap_err();
        match err {
            ModelError::Validation { path, .. } => assert_eq!(path, "nodes[n1].generator"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
