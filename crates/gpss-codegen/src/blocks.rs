//! Per-node GPSS block generation.
//!
//! Every node kind shares the same envelope (a banner header naming the
//! node's role and a body built from shared section builders) and the kind
//! selects which sections make up the body:
//!
//! - `AS`: input declarations, arrival generation, inbound terminate stubs
//! - `SC` / `HAPS` / `ES`: input declarations, in-section,
//!   processing/routing section, out-section
//! - `SSOP`: input declarations, a processing-entry terminate stub, arrival
//!   generation, inbound terminate stubs

use topology_model::{Direction, NodeEntity, NodeKind, Topology};

use crate::dist::compile_routing;
use crate::layout::Layout;
use crate::resolver::next_hop;
use crate::Result;

fn role(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::As => "Subscriber cluster traffic generator",
        NodeKind::Sc => "Satellite with on-board processing",
        NodeKind::Haps => "HAPS with on-board processing",
        NodeKind::Es => "Earth station",
        NodeKind::Ssop => "Public ground network operator",
    }
}

fn banner_title(node: &NodeEntity) -> String {
    match &node.label {
        Some(label) => format!("[{} | {} | {}]", role(node.kind), node.id, label),
        None => format!("[{} | {}]", role(node.kind), node.id),
    }
}

/// Emit the complete code block for one node. The banner header and footer
/// are emitted only when non-empty; every kind sets a header and none sets
/// a footer, so only the header path exists here.
pub fn node_block(topology: &Topology, node: &NodeEntity, layout: &Layout) -> Result<String> {
    let body = match node.kind {
        NodeKind::As => source_body(topology, node, layout, "cap_data_AS", false)?,
        NodeKind::Sc | NodeKind::Haps | NodeKind::Es => relay_body(topology, node, layout)?,
        NodeKind::Ssop => source_body(topology, node, layout, "cap_data_SSOP", true)?,
    };

    Ok(format!(
        "{}\n\n{}",
        layout.banner(&banner_title(node)),
        body.trim_matches('\n')
    ))
}

/// Symbol equates and storage declarations consumed by the node's sections:
/// the arrival-rate equate, the processing storage/queue/rate trio, and one
/// queue/rate pair per interface with a positive queue capacity.
fn input_declarations(node: &NodeEntity, layout: &Layout) -> String {
    let mut lines = Vec::new();
    if let Some(generator) = &node.generator {
        lines.push(layout.stmt(
            &format!("la_gen_{}", node.id),
            &format!("EQU       {}", generator.arrival_rate),
        ));
    }
    if let Some(processing) = &node.processing {
        lines.push(layout.stmt(
            &format!("service_{}", node.id),
            &format!("STORAGE   {}", processing.service_lines),
        ));
        lines.push(layout.stmt(
            &format!(" q_{}", node.id),
            &format!("EQU       {}", processing.queue_capacity),
        ));
        lines.push(layout.stmt(
            &format!("mu_{}", node.id),
            &format!("EQU       {}", processing.mu),
        ));
    }
    for iface in node.interfaces().filter(|i| i.queue_capacity > 0) {
        lines.push(layout.stmt(
            &format!(" q_{}", iface.base_label),
            &format!("EQU       {}", iface.queue_capacity),
        ));
        lines.push(layout.stmt(
            &format!("mu_{}", iface.base_label),
            &format!("EQU       {}", iface.service.mu),
        ));
    }
    lines.join("\n")
}

/// One queue/serve/forward block per interface matching `direction`, in
/// input order. Overflow goes to the interface's loss counter.
fn interface_section(
    topology: &Topology,
    node: &NodeEntity,
    direction: Direction,
    layout: &Layout,
) -> Result<String> {
    let mut blocks = Vec::new();
    for iface in node.interfaces_with_direction(direction) {
        let base = &iface.base_label;
        let next = next_hop(topology, node, iface, direction)?;

        let mut lines = Vec::new();
        if let Some(name) = &iface.name {
            lines.push(format!("* {name}"));
        }
        lines.push(layout.stmt(
            base,
            &format!(
                "ASSIGN    number_{}_int_{},{}",
                direction.as_str(),
                node.kind.as_str(),
                iface.idx
            ),
        ));
        lines.push(layout.stmt(
            "",
            &format!("TEST L    Q$queue_{base},q_{base},loss_{base}"),
        ));
        lines.push(layout.stmt("", &format!("QUEUE     queue_{base}")));
        lines.push(layout.stmt("", &format!("SEIZE     service_{base}")));
        lines.push(layout.stmt("", &format!("DEPART    queue_{base}")));
        lines.push(layout.stmt(
            "",
            &format!("ADVANCE   ({}(1,0,1/mu_{base}))", iface.service.dist),
        ));
        lines.push(layout.stmt("", &format!("RELEASE   service_{base}")));
        lines.push(layout.stmt("", &format!("TRANSFER  ,{next}")));
        lines.push(String::new());
        lines.push(layout.stmt(
            &format!("loss_{base}"),
            &format!("SAVEVALUE loss_{base}_+,1"),
        ));
        lines.push(layout.stmt("", "TERMINATE"));
        blocks.push(lines.join("\n"));
    }
    Ok(blocks.join("\n\n"))
}

/// Admission, grouped service and the compiled routing table. Empty when
/// the node carries no processing spec.
fn processing_section(node: &NodeEntity, layout: &Layout) -> Result<String> {
    let Some(processing) = &node.processing else {
        return Ok(String::new());
    };
    let id = &node.id;
    let (branches, transfers) = compile_routing(node, layout)?;

    let mut lines = vec!["* Processing".to_string()];
    lines.push(layout.stmt(
        &format!("processing_{id}"),
        &format!("TEST L    Q$queue_{id},q_{id},loss_{id}"),
    ));
    lines.push(layout.stmt("", &format!("QUEUE     queue_{id}")));
    lines.push(layout.stmt("", &format!("ENTER     service_{id},1")));
    lines.push(layout.stmt("", &format!("DEPART    queue_{id}")));
    lines.push(layout.stmt(
        "",
        &format!("ADVANCE   ({}(1,0,1/mu_{id}))", processing.dist),
    ));
    lines.push(layout.stmt("", &format!("LEAVE     service_{id},1")));
    if !branches.is_empty() {
        lines.push(String::new());
        lines.extend(branches);
        lines.push(String::new());
        lines.extend(transfers);
    }
    lines.push(String::new());
    lines.push(layout.stmt(
        &format!("loss_{id}"),
        &format!("SAVEVALUE loss_{id}_+,1"),
    ));
    lines.push(layout.stmt("", "TERMINATE"));
    Ok(lines.join("\n"))
}

/// Body for receive-process-forward nodes (`SC`, `HAPS`, `ES`).
fn relay_body(topology: &Topology, node: &NodeEntity, layout: &Layout) -> Result<String> {
    let inbound = interface_section(topology, node, Direction::In, layout)?;
    let processing = processing_section(node, layout)?;
    let outbound = interface_section(topology, node, Direction::Out, layout)?;

    let mut body = input_declarations(node, layout);
    body.push_str("\n\n");
    let middle: Vec<String> = [inbound, processing, outbound]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    body.push_str(&middle.join("\n\n\n"));
    Ok(body)
}

/// Body for traffic sources (`AS`, and `SSOP` with its sink stub): periodic
/// arrivals are tagged, split by MTU and transferred to the resolved
/// targets of every out-interface; in-interfaces are terminate stubs.
fn source_body(
    topology: &Topology,
    node: &NodeEntity,
    layout: &Layout,
    cap_key: &str,
    sink_stub: bool,
) -> Result<String> {
    // both guaranteed by Topology::build for traffic-source kinds
    let generator = node.generator.as_ref().expect("validated traffic source");
    let arrival_dist = &node
        .interfaces()
        .next()
        .expect("validated traffic source")
        .service
        .dist;

    let mut targets = Vec::new();
    for iface in node.interfaces_with_direction(Direction::Out) {
        targets.push(next_hop(topology, node, iface, Direction::Out)?);
    }

    let arrival = [
        layout.stmt(
            "",
            &format!("GENERATE  ({}(1,0,1/la_gen_{}))", arrival_dist, node.id),
        ),
        layout.stmt(
            "",
            &format!("ASSIGN    {},(V${})", cap_key, generator.capacity_source),
        ),
        layout.stmt(
            "",
            &format!("SPLIT     (P${}/{})", cap_key, topology.config.mtu),
        ),
        layout.stmt("", &format!("ASSIGN    type_data,{}", generator.packet_type)),
        layout.stmt("", &format!("TRANSFER  ,{}", targets.join(","))),
    ]
    .join("\n");

    let mut sections = vec![input_declarations(node, layout)];
    if sink_stub {
        sections.push(layout.stmt(&format!("processing_{}", node.id), "TERMINATE"));
    }
    sections.push(arrival);
    let stubs: Vec<String> = node
        .interfaces_with_direction(Direction::In)
        .map(|i| layout.stmt(&i.base_label, "TERMINATE"))
        .collect();
    if !stubs.is_empty() {
        sections.push(stubs.join("\n"));
    }
    Ok(sections.join("\n\n"))
}
