//! GPSS code generation for satellite-network topology models.
//!
//! Turns a validated [`Topology`] into a fixed-format, column-aligned GPSS
//! program:
//!
//! - shared fixed-column text layout ([`layout`])
//! - per-node-kind block generators ([`blocks`])
//! - next-hop resolution across the topology graph ([`resolver`])
//! - distribution and routing compilers ([`dist`])
//! - the [`Generator`] assembler producing the final document
//!
//! Purely computational: every compilation derives everything from its own
//! input and holds no cross-request state.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use topology_model::Topology;

pub mod blocks;
pub mod dist;
pub mod layout;
pub mod resolver;

use crate::dist::distribution_expr;
use crate::layout::Layout;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("destination not found: {0}")]
    DestinationNotFound(String),
}

pub type Result<T> = std::result::Result<T, CodegenError>;

/// Generated program text plus generation metadata.
#[derive(Debug, Clone, Serialize)]
pub struct GpssCode {
    pub code: String,
    #[serde(rename = "genTime")]
    pub gen_time: Option<f64>,
    #[serde(rename = "genDate")]
    pub gen_date: Option<DateTime<Utc>>,
}

/// Program assembler: global preamble, one block per node in document
/// order, global postamble. Generation is all-or-nothing; a failure never
/// yields a truncated document.
pub struct Generator<'a> {
    topology: &'a Topology,
    layout: Layout,
}

impl<'a> Generator<'a> {
    pub fn new(topology: &'a Topology) -> Self {
        let layout = Layout::from_labels(topology.base_labels());
        Self { topology, layout }
    }

    /// Assemble the full program. With `add_metadata`, a banner carrying
    /// the generation timestamp and the elapsed assembly time is prepended;
    /// the body is unaffected. Elapsed time covers assembly only, not
    /// upstream parsing.
    pub fn generate(&self, add_metadata: bool) -> Result<GpssCode> {
        let start = Instant::now();
        let layout = &self.layout;
        let config = &self.topology.config;

        let capacity_line = layout.stmt(
            "capacity",
            &format!(
                "VARIABLE  ({})",
                distribution_expr(&config.capacity.dist, &config.capacity.params)
            ),
        );

        let mut sections = vec![banner_section(layout, "[Model settings 1]", &capacity_line)];
        for node in self.topology.nodes() {
            sections.push(blocks::node_block(self.topology, node, layout)?);
        }

        let run_control = [
            layout.stmt("", &format!("GENERATE  {}", config.sim_duration)),
            layout.stmt("", "TERMINATE 1"),
            layout.stmt("", "START     1"),
        ]
        .join("\n");
        sections.push(banner_section(layout, "[Model settings 2]", &run_control));

        let mut code = sections.join("\n\n");
        code.push('\n');

        let gen_time = start.elapsed().as_secs_f64();
        let gen_date = Utc::now();

        if add_metadata {
            let info = format!(
                "* Code generated at : {}\n* Generation time   : {} s",
                gen_date, gen_time
            );
            code = format!(
                "{}\n{}",
                banner_section(layout, "[Generation info]", &info),
                code
            );
        }

        tracing::debug!(
            model = %config.model_id,
            elapsed_s = gen_time,
            "assembled GPSS program"
        );

        Ok(GpssCode {
            code,
            gen_time: Some(gen_time),
            gen_date: Some(gen_date),
        })
    }
}

fn banner_section(layout: &Layout, title: &str, content: &str) -> String {
    format!(
        "{}\n\n{}\n\n{}",
        layout.banner(title),
        content,
        layout.banner("")
    )
}
