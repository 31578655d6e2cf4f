//! Next-hop resolution.
//!
//! Wires one node's sections to the exact entry labels of its neighbors (or
//! to a terminal name) at generation time, making the emitted program
//! graph-connected without any runtime linking.

use topology_model::{ChannelDestination, Direction, Interface, NodeEntity, Topology};

use crate::{CodegenError, Result};

/// Resolve the downstream destination label for `interface`.
///
/// Inbound traffic always feeds the node's own processing entry point. For
/// outbound traffic the interface's channel is followed: a terminal
/// destination is returned verbatim, a port destination resolves to the
/// destination interface's base label.
pub fn next_hop(
    topology: &Topology,
    node: &NodeEntity,
    interface: &Interface,
    direction: Direction,
) -> Result<String> {
    if direction == Direction::In {
        return Ok(format!("processing_{}", node.id));
    }

    let channel = topology.channel(&interface.edge_id).ok_or_else(|| {
        CodegenError::DestinationNotFound(format!(
            "interface `{}` references missing channel `{}`",
            interface.base_label, interface.edge_id
        ))
    })?;

    match &channel.destination {
        ChannelDestination::Terminal(name) => Ok(name.clone()),
        ChannelDestination::Port { node_id, port_id } => topology
            .node(node_id)
            .and_then(|n| n.interface(port_id))
            .map(|i| i.base_label.clone())
            .ok_or_else(|| {
                CodegenError::DestinationNotFound(format!(
                    "channel `{}` points to missing interface `{}/{}`",
                    channel.id, node_id, port_id
                ))
            }),
    }
}
