//! Dependency graph builder
//!
//! Derives nodes and typed edges from the completed overview. Nodes are the
//! canonical ids the overview names; edges come only from declared
//! configuration references, module containment, and replica expansion.
//! Emission order is fixed (source id ascending, then attribute declaration
//! order) so two runs over the same overview serialize byte-identically.

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

use crate::diagnostics::Diagnostic;
use crate::overview::{ConfigEntry, ResolvedConfig, ResourceOverview};
use crate::plan::address::split_segments;
use crate::plan::{NodeKind, canonicalize, config_id, module_path, strip_replica_suffix};

/// The dependency graph artifact.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Reference,
    ModuleContainment,
    ReplicaOf,
}

/// Expression references that never name graph nodes.
const SYNTHETIC_ROOTS: &[&str] = &["each", "count", "self", "path", "terraform"];

/// Build the graph from the completed overview.
pub fn build_graph(overview: &ResourceOverview) -> (Graph, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();

    let ids: BTreeSet<String> = overview
        .resources
        .keys()
        .chain(overview.configs.keys())
        .chain(overview.states.keys())
        .cloned()
        .collect();

    let nodes: Vec<GraphNode> = ids
        .iter()
        .map(|id| match overview.resources.get(id) {
            Some(meta) => GraphNode {
                id: id.clone(),
                kind: meta.kind,
                module_path: meta.module_path.clone(),
            },
            None => GraphNode {
                id: id.clone(),
                kind: canonicalize(id).kind,
                module_path: module_path(id),
            },
        })
        .collect();

    let mut edges = Vec::new();
    let mut seen: HashSet<GraphEdge> = HashSet::new();
    let mut push_edge = |edges: &mut Vec<GraphEdge>, edge: GraphEdge| {
        if seen.insert(edge.clone()) {
            edges.push(edge);
        }
    };

    // Reference edges, source id ascending, attributes in declaration order.
    for id in &ids {
        let references = match overview.resolve_config(id) {
            ResolvedConfig::Entry(entry) => entry_references(entry),
            ResolvedConfig::Empty | ResolvedConfig::DeferToParent => continue,
        };

        let prefixes = resolution_prefixes(id);
        for reference in references {
            if is_synthetic(&reference) {
                continue;
            }
            match resolve_reference(&ids, &prefixes, id, &reference) {
                Some(target) => push_edge(
                    &mut edges,
                    GraphEdge {
                        from: id.clone(),
                        to: target,
                        kind: EdgeKind::Reference,
                    },
                ),
                None => diagnostics.push(Diagnostic::UnresolvableReference {
                    from: id.clone(),
                    reference,
                }),
            }
        }
    }

    // Containment edges from each module to its direct members.
    for id in &ids {
        if let Some(parent) = module_path(id) {
            match edge_source(&ids, &parent) {
                Some(from) => push_edge(
                    &mut edges,
                    GraphEdge {
                        from,
                        to: id.clone(),
                        kind: EdgeKind::ModuleContainment,
                    },
                ),
                None => diagnostics.push(Diagnostic::UnresolvableReference {
                    from: id.clone(),
                    reference: parent,
                }),
            }
        }
    }

    // Expansion edges from each declaration to its concrete replicas.
    for id in &ids {
        let parent = strip_replica_suffix(id);
        if parent.len() == id.len() {
            continue;
        }
        match edge_source(&ids, parent) {
            Some(from) => push_edge(
                &mut edges,
                GraphEdge {
                    from,
                    to: id.clone(),
                    kind: EdgeKind::ReplicaOf,
                },
            ),
            None => diagnostics.push(Diagnostic::UnresolvableReference {
                from: id.clone(),
                reference: parent.to_string(),
            }),
        }
    }

    (Graph { nodes, edges }, diagnostics)
}

/// The declared references of a config entry, in declaration order.
fn entry_references(entry: &ConfigEntry) -> Vec<String> {
    match entry {
        ConfigEntry::Output(output) => output.references.clone(),
        ConfigEntry::Module(_) | ConfigEntry::Resource(_) => entry
            .attributes()
            .iter()
            .flat_map(|attr| match &attr.value {
                crate::overview::AttributeValue::Reference(ids) => ids.clone(),
                _ => Vec::new(),
            })
            .collect(),
        ConfigEntry::Variable(_) => Vec::new(),
    }
}

/// Resolve a containment/expansion edge source to a known node. Module
/// instances expanded from a replicated call (`module.m[0]`) have no node of
/// their own; the bracket-stripped declaration stands in for them.
fn edge_source(ids: &BTreeSet<String>, parent: &str) -> Option<String> {
    if ids.contains(parent) {
        return Some(parent.to_string());
    }
    let stripped = config_id(parent);
    ids.contains(&stripped).then_some(stripped)
}

fn is_synthetic(reference: &str) -> bool {
    let root = reference.split('.').next().unwrap_or(reference);
    SYNTHETIC_ROOTS.contains(&root)
}

/// Module scopes to try when resolving a reference declared on `id`:
/// its own module path first (configuration references are module-local),
/// with replica suffixes stripped as a fallback, then the root scope.
fn resolution_prefixes(id: &str) -> Vec<String> {
    let mut prefixes = Vec::new();
    if let Some(path) = module_path(id) {
        prefixes.push(format!("{path}."));
        let stripped = format!("{}.", config_id(&path));
        if !prefixes.contains(&stripped) {
            prefixes.push(stripped);
        }
    }
    prefixes.push(String::new());
    prefixes
}

/// Resolve a declared reference to a node id. Trailing attribute accessors
/// and index suffixes are peeled off segment by segment until a known node
/// matches; a reference that reduces to nothing is unresolvable.
fn resolve_reference(
    ids: &BTreeSet<String>,
    prefixes: &[String],
    from: &str,
    reference: &str,
) -> Option<String> {
    let mut candidate = reference.to_string();

    loop {
        for prefix in prefixes {
            let full = format!("{prefix}{candidate}");
            if full != from && ids.contains(&full) {
                return Some(full);
            }
        }

        let stripped = strip_replica_suffix(&candidate);
        if stripped.len() < candidate.len() {
            candidate = stripped.to_string();
            continue;
        }

        let mut segments = split_segments(&candidate);
        if segments.len() < 2 {
            return None;
        }
        segments.pop();
        candidate = segments.join(".");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overview::build_overview;
    use crate::plan::types::{
        Change, ConfigOutput, ConfigResource, ModuleCall, Plan, PlanVariable, ResourceChange,
    };
    use crate::plan::Action;
    use serde_json::json;

    fn fixture_plan() -> Plan {
        let mut plan = Plan::default();

        plan.variables.insert(
            "ami".to_string(),
            PlanVariable {
                value: json!("ami-123"),
            },
        );

        for index in 0..2 {
            plan.resource_changes.push(ResourceChange {
                address: format!("aws_instance.web[{index}]"),
                change: Change {
                    actions: vec![Action::Create],
                    after: Some(json!({"ami": "ami-123"})),
                    ..Default::default()
                },
                ..Default::default()
            });
        }
        plan.resource_changes.push(ResourceChange {
            address: "module.vpc.aws_subnet.main".to_string(),
            change: Change {
                actions: vec![Action::Create],
                ..Default::default()
            },
            ..Default::default()
        });

        plan.configuration.root_module.resources.push(ConfigResource {
            address: "aws_instance.web".to_string(),
            resource_type: "aws_instance".to_string(),
            name: "web".to_string(),
            expressions: serde_json::from_value(json!({
                "ami": {"references": ["var.ami"]},
                "subnet_id": {"references": ["module.vpc.aws_subnet.main.id", "module.vpc.aws_subnet.main"]}
            }))
            .unwrap(),
            count_expression: Some(json!({"constant_value": 2})),
            ..Default::default()
        });
        plan.configuration.root_module.variables.insert(
            "ami".to_string(),
            Default::default(),
        );

        let mut call = ModuleCall {
            source: "./modules/vpc".to_string(),
            ..Default::default()
        };
        call.module.resources.push(ConfigResource {
            address: "aws_subnet.main".to_string(),
            resource_type: "aws_subnet".to_string(),
            name: "main".to_string(),
            expressions: serde_json::from_value(json!({
                "cidr_block": {"references": ["var.cidr"]}
            }))
            .unwrap(),
            ..Default::default()
        });
        call.module
            .variables
            .insert("cidr".to_string(), Default::default());
        call.module.outputs.insert(
            "subnet_id".to_string(),
            ConfigOutput {
                expression: Some(json!({"references": ["aws_subnet.main.id", "aws_subnet.main"]})),
                ..Default::default()
            },
        );
        plan.configuration
            .root_module
            .module_calls
            .insert("vpc".to_string(), call);

        plan
    }

    fn build(plan: &Plan) -> (Graph, Vec<Diagnostic>) {
        let (overview, _) = build_overview(plan);
        build_graph(&overview)
    }

    #[test]
    fn test_one_node_per_state_id() {
        let plan = fixture_plan();
        let (overview, _) = build_overview(&plan);
        let (graph, _) = build_graph(&overview);

        for id in overview.states.keys() {
            let count = graph.nodes.iter().filter(|n| &n.id == id).count();
            assert_eq!(count, 1, "expected exactly one node for {id}");
        }
    }

    #[test]
    fn test_no_dangling_edges() {
        let (graph, _) = build(&fixture_plan());
        let ids: BTreeSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();

        for edge in &graph.edges {
            assert!(ids.contains(edge.from.as_str()), "dangling from: {}", edge.from);
            assert!(ids.contains(edge.to.as_str()), "dangling to: {}", edge.to);
        }
    }

    #[test]
    fn test_deterministic_output() {
        let plan = fixture_plan();
        let (overview, _) = build_overview(&plan);
        let (first, _) = build_graph(&overview);
        let (second, _) = build_graph(&overview);

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_reference_edges_trim_attribute_accessors() {
        let (graph, _) = build(&fixture_plan());

        // `module.vpc.aws_subnet.main.id` reduces to the subnet node.
        assert!(graph.edges.contains(&GraphEdge {
            from: "aws_instance.web".to_string(),
            to: "module.vpc.aws_subnet.main".to_string(),
            kind: EdgeKind::Reference,
        }));
        assert!(graph.edges.contains(&GraphEdge {
            from: "aws_instance.web".to_string(),
            to: "var.ami".to_string(),
            kind: EdgeKind::Reference,
        }));
    }

    #[test]
    fn test_module_local_references_resolve_in_scope() {
        let (graph, _) = build(&fixture_plan());

        assert!(graph.edges.contains(&GraphEdge {
            from: "module.vpc.aws_subnet.main".to_string(),
            to: "module.vpc.var.cidr".to_string(),
            kind: EdgeKind::Reference,
        }));
        assert!(graph.edges.contains(&GraphEdge {
            from: "module.vpc.output.subnet_id".to_string(),
            to: "module.vpc.aws_subnet.main".to_string(),
            kind: EdgeKind::Reference,
        }));
    }

    #[test]
    fn test_module_containment_edges() {
        let (graph, _) = build(&fixture_plan());

        assert!(graph.edges.contains(&GraphEdge {
            from: "module.vpc".to_string(),
            to: "module.vpc.aws_subnet.main".to_string(),
            kind: EdgeKind::ModuleContainment,
        }));
        assert!(graph.edges.contains(&GraphEdge {
            from: "module.vpc".to_string(),
            to: "module.vpc.var.cidr".to_string(),
            kind: EdgeKind::ModuleContainment,
        }));
    }

    #[test]
    fn test_replica_edges() {
        let (graph, _) = build(&fixture_plan());

        for index in 0..2 {
            assert!(graph.edges.contains(&GraphEdge {
                from: "aws_instance.web".to_string(),
                to: format!("aws_instance.web[{index}]"),
                kind: EdgeKind::ReplicaOf,
            }));
        }
    }

    #[test]
    fn test_replicated_module_instances_are_connected() {
        let mut plan = Plan::default();
        for module_index in 0..2 {
            plan.resource_changes.push(ResourceChange {
                address: format!("module.m[{module_index}].aws_instance.x[0]"),
                change: Change {
                    actions: vec![Action::Create],
                    ..Default::default()
                },
                ..Default::default()
            });
        }
        let mut call = ModuleCall::default();
        call.expressions = serde_json::from_value(json!({
            "count": {"constant_value": 2}
        }))
        .unwrap();
        call.module.resources.push(ConfigResource {
            address: "aws_instance.x".to_string(),
            resource_type: "aws_instance".to_string(),
            name: "x".to_string(),
            ..Default::default()
        });
        plan.configuration
            .root_module
            .module_calls
            .insert("m".to_string(), call);

        let (graph, diagnostics) = build(&plan);
        assert!(diagnostics.is_empty(), "unexpected: {diagnostics:?}");

        // Instances hang off the bracket-stripped declaration nodes.
        for module_index in 0..2 {
            let instance = format!("module.m[{module_index}].aws_instance.x[0]");
            assert!(graph.edges.contains(&GraphEdge {
                from: "module.m".to_string(),
                to: instance.clone(),
                kind: EdgeKind::ModuleContainment,
            }));
            assert!(graph.edges.contains(&GraphEdge {
                from: "module.m.aws_instance.x".to_string(),
                to: instance,
                kind: EdgeKind::ReplicaOf,
            }));
        }
    }

    #[test]
    fn test_unresolvable_reference_is_dropped_and_counted() {
        let mut plan = fixture_plan();
        plan.configuration.root_module.resources[0]
            .expressions
            .insert(
                "vpc_security_group_ids".to_string(),
                json!({"references": ["aws_security_group.missing.id"]}),
            );

        let (graph, diagnostics) = build(&plan);

        assert!(!graph.edges.iter().any(|e| e.to.contains("missing")));
        assert!(diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::UnresolvableReference { reference, .. }
                if reference == "aws_security_group.missing.id"
        )));
    }

    #[test]
    fn test_synthetic_references_are_skipped_silently() {
        let mut plan = fixture_plan();
        plan.configuration.root_module.resources[0]
            .expressions
            .insert(
                "name".to_string(),
                json!({"references": ["each.key", "count.index"]}),
            );

        let (_, diagnostics) = build(&plan);
        assert!(!diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::UnresolvableReference { reference, .. }
                if reference.starts_with("each.") || reference.starts_with("count.")
        )));
    }
}
