//! Compilation pipeline
//!
//! One invocation turns a raw plan into the three artifacts: sanitize, build
//! the overview, then build the graph and map from it. The two final
//! builders share no mutable state and only read the finished overview, so
//! they run on their own threads and are joined before the result is
//! published. A `CompiledPlan` is immutable once returned and safe to share
//! read-only across any number of consumers.

use anyhow::{Result, anyhow};
use std::thread;

use crate::diagnostics::Diagnostics;
use crate::graph::{Graph, build_graph};
use crate::modmap::{MapNode, build_map};
use crate::overview::{ResourceOverview, build_overview};
use crate::plan::types::Plan;
use crate::plan::sanitize;

/// The compiled result of one plan: sanitized input, the three derived
/// artifacts, and the diagnostics collected along the way.
#[derive(Debug, Clone)]
pub struct CompiledPlan {
    pub plan: Plan,
    pub overview: ResourceOverview,
    pub graph: Graph,
    pub map: MapNode,
    pub diagnostics: Diagnostics,
}

/// Compile a plan into its visualization artifacts. Non-fatal problems are
/// collected into `diagnostics`; the only failure here is a builder thread
/// panicking.
pub fn compile(plan: &Plan, show_sensitive: bool) -> Result<CompiledPlan> {
    let mut diagnostics = Diagnostics::default();

    let (plan, sanitize_warning) = sanitize(plan, show_sensitive);
    if let Some(warning) = sanitize_warning {
        diagnostics.push(warning);
    }

    let (overview, overview_diagnostics) = build_overview(&plan);
    diagnostics.extend(overview_diagnostics);

    let (graph_result, map) = thread::scope(|scope| {
        let graph_handle = scope.spawn(|| build_graph(&overview));
        let map_handle = scope.spawn(|| build_map(&overview));

        let graph = graph_handle
            .join()
            .map_err(|_| anyhow!("graph builder panicked"));
        let map = map_handle.join().map_err(|_| anyhow!("map builder panicked"));
        (graph, map)
    });

    let (graph, graph_diagnostics) = graph_result?;
    diagnostics.extend(graph_diagnostics);

    Ok(CompiledPlan {
        plan,
        overview,
        graph,
        map: map?,
        diagnostics,
    })
}
