//! Distribution-expression and routing-table compilers.

use topology_model::{DistParams, NodeEntity};

use crate::layout::Layout;
use crate::{CodegenError, Result};

/// Compile a capacity-distribution descriptor into a GPSS call expression.
///
/// Family names are case-insensitive; the random-number stream index
/// defaults to 1 when absent. An unrecognized family silently falls back to
/// the discrete-uniform syntax — observable output behavior, kept as-is.
pub fn distribution_expr(dist: &str, params: &DistParams) -> String {
    let rn = if params.rn == 0 { 1 } else { params.rn };
    match dist.to_ascii_lowercase().as_str() {
        "duniform" => format!("DUNIFORM({},{},{})", rn, params.min, params.max),
        "binomial" => format!("Binomial({},{},{})", rn, params.n, params.p),
        "negbinom" => format!("NEGBINOM({},{},{})", rn, params.nc, params.p),
        "geometric" => format!("GEOMETRIC({},{})", rn, params.p),
        "poisson" => format!("POISSON({},{})", rn, params.m),
        other => {
            tracing::debug!(family = other, "unknown capacity distribution, using DUNIFORM");
            format!("DUNIFORM({},{},{})", rn, params.min, params.max)
        }
    }
}

/// Compile a node's routing table: one conditional branch per entry, in
/// table order (first match wins), then one transfer per synthesized label
/// to the base label of the out-interface at the entry's out-port. Entries
/// are never reordered or deduplicated.
///
/// Returns `(branch lines, transfer lines)`; both are empty for an empty
/// table. An out-port with no matching out-interface is a lookup failure.
pub fn compile_routing(node: &NodeEntity, layout: &Layout) -> Result<(Vec<String>, Vec<String>)> {
    let Some(processing) = &node.processing else {
        return Ok((Vec::new(), Vec::new()));
    };

    let mut branches = Vec::with_capacity(processing.routing_table.len());
    let mut transfers = Vec::with_capacity(processing.routing_table.len());
    for route in &processing.routing_table {
        let branch_label = format!("TEST_{}_{}", node.id, route.out_port);
        branches.push(layout.stmt(
            "",
            &format!("TEST E    P$type_data,{},{}", route.packet_type, branch_label),
        ));
        let target = node.out_interface_by_idx(route.out_port).ok_or_else(|| {
            CodegenError::DestinationNotFound(format!(
                "routing entry for packet type {} on node `{}` references missing out-port {}",
                route.packet_type, node.id, route.out_port
            ))
        })?;
        transfers.push(layout.stmt(
            &branch_label,
            &format!("TRANSFER  ,{}", target.base_label),
        ));
    }
    Ok((branches, transfers))
}
