//! Module map builder
//!
//! Derives the containment tree used for layout: the root configuration at
//! the top, one internal node per module, and every resource, data source,
//! output, and variable as a leaf under the module that declares it.
//! Children are ordered by kind (module, resource, data, output, variable,
//! local), then lexicographically by id, for stable rendering.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::overview::ResourceOverview;
use crate::plan::{NodeKind, module_path};

/// Synthetic id of the root node.
pub const ROOT_ID: &str = "root";

/// A node of the containment tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapNode {
    pub id: String,
    pub kind: NodeKind,
    pub children: Vec<MapNode>,
}

impl MapNode {
    fn leaf(id: String, kind: NodeKind) -> Self {
        MapNode {
            id,
            kind,
            children: Vec::new(),
        }
    }
}

/// Build the containment tree from the completed overview.
pub fn build_map(overview: &ResourceOverview) -> MapNode {
    let mut ids: BTreeSet<String> = overview
        .resources
        .keys()
        .chain(overview.configs.keys())
        .chain(overview.states.keys())
        .cloned()
        .collect();

    // Module instances expanded from a replicated call (`module.m[0]`) have
    // no overview entry of their own; insert an internal node for every
    // containing module so each id stays reachable from the root.
    let ancestors: Vec<String> = ids
        .iter()
        .flat_map(|id| {
            let mut found = Vec::new();
            let mut path = module_path(id);
            while let Some(current) = path {
                path = module_path(&current);
                found.push(current);
            }
            found
        })
        .collect();
    ids.extend(ancestors);

    // Bucket every id under its containing module (None = root scope).
    let mut members: BTreeMap<Option<String>, Vec<(String, NodeKind)>> = BTreeMap::new();
    for id in &ids {
        let kind = overview
            .resources
            .get(id)
            .map(|meta| meta.kind)
            .unwrap_or(NodeKind::Module);
        members
            .entry(module_path(id))
            .or_default()
            .push((id.clone(), kind));
    }

    build_node(ROOT_ID.to_string(), NodeKind::Module, None, &members)
}

fn build_node(
    id: String,
    kind: NodeKind,
    scope: Option<&str>,
    members: &BTreeMap<Option<String>, Vec<(String, NodeKind)>>,
) -> MapNode {
    let mut children: Vec<MapNode> = members
        .get(&scope.map(String::from))
        .map(|entries| {
            entries
                .iter()
                .map(|(child_id, child_kind)| match child_kind {
                    NodeKind::Module => {
                        build_node(child_id.clone(), *child_kind, Some(child_id.as_str()), members)
                    }
                    _ => MapNode::leaf(child_id.clone(), *child_kind),
                })
                .collect()
        })
        .unwrap_or_default();

    children.sort_by(|a, b| a.kind.rank().cmp(&b.kind.rank()).then(a.id.cmp(&b.id)));

    MapNode { id, kind, children }
}
