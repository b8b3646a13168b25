//! End-to-end tests for the compilation pipeline
//!
//! A realistic plan document goes through sanitization, overview, graph,
//! and map construction, and the artifacts are checked against each other.

use std::collections::BTreeSet;

use plansight::commands::ExportCommand;
use plansight::compile::{CompiledPlan, compile};
use plansight::graph::EdgeKind;
use plansight::overview::AttributeValue;
use plansight::plan::types::Plan;
use plansight::plan::{Action, NodeKind, REDACTED};
use serde_json::json;

const PLAN_JSON: &str = include_str!("fixtures/plan.json");

fn fixture_plan() -> Plan {
    serde_json::from_str(PLAN_JSON).expect("fixture plan should parse")
}

fn compiled() -> CompiledPlan {
    compile(&fixture_plan(), false).expect("compilation should succeed")
}

#[test]
fn test_compilation_is_clean() {
    let compiled = compiled();
    assert!(
        compiled.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        compiled.diagnostics.entries
    );
}

#[test]
fn test_sensitive_values_are_redacted_in_artifacts() {
    let compiled = compiled();

    let change = compiled.overview.states["aws_db_instance.db"]
        .change
        .as_ref()
        .unwrap();
    assert_eq!(
        serde_json::to_value(&change.before["password"]).unwrap(),
        json!(REDACTED)
    );
    assert_eq!(
        serde_json::to_value(&change.after["password"]).unwrap(),
        json!(REDACTED)
    );

    // The sensitive variable value is redacted too.
    assert_eq!(
        compiled.plan.variables["db_password"].value,
        json!(REDACTED)
    );
}

#[test]
fn test_show_sensitive_keeps_values() {
    let compiled = compile(&fixture_plan(), true).unwrap();

    let change = compiled.overview.states["aws_db_instance.db"]
        .change
        .as_ref()
        .unwrap();
    assert_eq!(
        serde_json::to_value(&change.after["password"]).unwrap(),
        json!("hunter2")
    );
}

#[test]
fn test_replace_collapsing_and_unknown_merging() {
    let compiled = compiled();

    let db = compiled.overview.states["aws_db_instance.db"]
        .change
        .as_ref()
        .unwrap();
    assert_eq!(db.action, Action::Replace);

    let web = compiled.overview.states["aws_instance.web[0]"]
        .change
        .as_ref()
        .unwrap();
    assert_eq!(web.action, Action::Create);
    assert_eq!(web.after["arn"], AttributeValue::Unknown);
    assert_eq!(
        web.after["instance_type"],
        AttributeValue::Concrete(json!("t3.micro"))
    );
}

#[test]
fn test_replicas_share_config() {
    let compiled = compiled();

    assert_eq!(
        compiled.overview.states["aws_instance.web[0]"].config_id,
        "aws_instance.web"
    );
    assert_eq!(
        compiled.overview.states["aws_instance.web[1]"].config_id,
        "aws_instance.web"
    );
    assert!(compiled.overview.configs.contains_key("aws_instance.web"));
}

#[test]
fn test_unknown_output_gets_sentinel() {
    let compiled = compiled();

    let endpoint = compiled.overview.states["output.endpoint"]
        .change
        .as_ref()
        .unwrap();
    assert_eq!(endpoint.after["value"], AttributeValue::Unknown);

    let region = compiled.overview.states["output.region_used"]
        .change
        .as_ref()
        .unwrap();
    assert_eq!(
        region.before["value"],
        AttributeValue::Concrete(json!("us-east-1"))
    );
    assert_eq!(
        region.after["value"],
        AttributeValue::Concrete(json!("eu-west-1"))
    );
}

#[test]
fn test_graph_covers_every_state_id() {
    let compiled = compiled();
    let node_ids: BTreeSet<&str> = compiled.graph.nodes.iter().map(|n| n.id.as_str()).collect();

    for id in compiled.overview.states.keys() {
        assert!(node_ids.contains(id.as_str()), "missing node for {id}");
        assert_eq!(
            compiled
                .graph
                .nodes
                .iter()
                .filter(|n| &n.id == id)
                .count(),
            1
        );
    }
}

#[test]
fn test_graph_has_no_dangling_edges() {
    let compiled = compiled();
    let node_ids: BTreeSet<&str> = compiled.graph.nodes.iter().map(|n| n.id.as_str()).collect();

    for edge in &compiled.graph.edges {
        assert!(node_ids.contains(edge.from.as_str()));
        assert!(node_ids.contains(edge.to.as_str()));
    }
}

#[test]
fn test_expected_edges_exist() {
    let compiled = compiled();
    let has_edge = |from: &str, to: &str, kind: EdgeKind| {
        compiled
            .graph
            .edges
            .iter()
            .any(|e| e.from == from && e.to == to && e.kind == kind)
    };

    // References.
    assert!(has_edge("aws_instance.web", "data.aws_ami.base", EdgeKind::Reference));
    assert!(has_edge(
        "aws_instance.web",
        "module.vpc.aws_subnet.main",
        EdgeKind::Reference
    ));
    assert!(has_edge("aws_db_instance.db", "var.db_password", EdgeKind::Reference));
    assert!(has_edge("module.vpc", "var.region", EdgeKind::Reference));
    assert!(has_edge("output.endpoint", "aws_db_instance.db", EdgeKind::Reference));
    assert!(has_edge(
        "module.vpc.output.subnet_id",
        "module.vpc.aws_subnet.main",
        EdgeKind::Reference
    ));

    // Containment.
    assert!(has_edge(
        "module.vpc",
        "module.vpc.aws_subnet.main",
        EdgeKind::ModuleContainment
    ));

    // Replica expansion.
    assert!(has_edge("aws_instance.web", "aws_instance.web[0]", EdgeKind::ReplicaOf));
    assert!(has_edge("aws_instance.web", "aws_instance.web[1]", EdgeKind::ReplicaOf));
}

#[test]
fn test_compilation_is_deterministic() {
    let first = compiled();
    let second = compiled();

    assert_eq!(
        serde_json::to_string(&first.overview).unwrap(),
        serde_json::to_string(&second.overview).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&first.graph).unwrap(),
        serde_json::to_string(&second.graph).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&first.map).unwrap(),
        serde_json::to_string(&second.map).unwrap()
    );
}

#[test]
fn test_map_places_resources_under_their_module() {
    let compiled = compiled();

    let vpc = compiled
        .map
        .children
        .iter()
        .find(|c| c.id == "module.vpc")
        .expect("module.vpc under root");
    assert_eq!(vpc.kind, NodeKind::Module);
    assert!(vpc.children.iter().any(|c| c.id == "module.vpc.aws_subnet.main"));

    // Nothing module-scoped leaks to the root level.
    assert!(
        !compiled
            .map
            .children
            .iter()
            .any(|c| c.id.starts_with("module.vpc."))
    );
}

#[test]
fn test_export_round() {
    let compiled = compiled();
    let dir = tempfile::tempdir().unwrap();

    ExportCommand::execute(&compiled, dir.path(), true).unwrap();

    let rso: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("rso.json")).unwrap())
            .unwrap();
    assert!(rso["states"]["aws_instance.web[0]"].is_object());

    let graph: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("graph.json")).unwrap())
            .unwrap();
    assert!(graph["nodes"].as_array().unwrap().len() >= compiled.overview.states.len());
}
