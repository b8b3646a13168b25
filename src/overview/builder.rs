//! Resource State Overview builder
//!
//! Walks the sanitized plan once and produces the overview consumed by the
//! graph and map builders: shared configuration entries keyed by config id,
//! per-instance states with collapsed actions and unknown-merged diffs, and
//! descriptive metadata for every canonical id.

use serde_json::Value;
use std::collections::BTreeMap;

use crate::diagnostics::Diagnostic;
use crate::plan::types::{Change, ConfigModule, Plan};
use crate::plan::{Action, canonicalize, config_id};

use super::types::{
    AttributeExpr, AttributeValue, ChangeSummary, ConfigEntry, ModuleConfig, OutputConfig,
    ResourceConfig, ResourceMeta, ResourceOverview, ResourceState, VariableConfig,
};

/// Build the overview from a sanitized plan.
pub fn build_overview(plan: &Plan) -> (ResourceOverview, Vec<Diagnostic>) {
    let mut overview = ResourceOverview::default();
    let mut diagnostics = Vec::new();

    walk_config_module(
        "",
        &plan.configuration.root_module,
        &mut overview.configs,
        &mut diagnostics,
    );

    // Top-level input variables. Variables have no change record.
    for name in plan.variables.keys() {
        let id = format!("var.{name}");
        overview.states.insert(
            id.clone(),
            ResourceState {
                config_id: id.clone(),
                change: None,
            },
        );
    }

    // Outputs: scalar before/after values are coerced to a one-key mapping
    // so the diff shape is uniform across kinds.
    for (name, change) in &plan.output_changes {
        let id = format!("output.{name}");
        let action = collapse_action(change, &id, &mut diagnostics);

        let mut after = wrap_output_value(change.after.as_ref());
        if change.after_unknown == Value::Bool(true) {
            after.insert("value".to_string(), AttributeValue::Unknown);
        }

        overview.states.insert(
            id.clone(),
            ResourceState {
                config_id: id.clone(),
                change: Some(ChangeSummary {
                    action,
                    before: wrap_output_value(change.before.as_ref()),
                    after,
                }),
            },
        );
    }

    // Resource instances.
    for rc in &plan.resource_changes {
        if rc.address.is_empty() {
            diagnostics.push(Diagnostic::MalformedPlan {
                address: format!("{}.{}", rc.resource_type, rc.name),
                detail: "resource change has no address".to_string(),
            });
            continue;
        }

        let address = canonicalize(&rc.address);
        let action = collapse_action(&rc.change, &address.id, &mut diagnostics);

        let before = diff_map(rc.change.before.as_ref(), &address.id, "before", &mut diagnostics);
        let mut after = diff_map(rc.change.after.as_ref(), &address.id, "after", &mut diagnostics);
        apply_unknown(&mut after, &rc.change.after_unknown);

        let state_config_id = config_id(&address.id);
        overview.states.insert(
            address.id.clone(),
            ResourceState {
                config_id: state_config_id,
                change: Some(ChangeSummary {
                    action,
                    before,
                    after,
                }),
            },
        );

        let provider = (!rc.provider_name.is_empty()).then(|| rc.provider_name.clone());
        insert_meta(&mut overview.resources, &address.id, provider);
    }

    // Metadata for everything else the artifact names.
    let remaining: Vec<String> = overview
        .states
        .keys()
        .chain(overview.configs.keys())
        .filter(|id| !overview.resources.contains_key(*id))
        .cloned()
        .collect();
    for id in remaining {
        insert_meta(&mut overview.resources, &id, None);
    }

    (overview, diagnostics)
}

/// Recursively flatten one module's declarations into config entries keyed
/// by canonical id. On the (invalid) input where two declarations claim the
/// same id, the variable > output > module > resource priority decides.
fn walk_config_module(
    prefix: &str,
    module: &ConfigModule,
    configs: &mut BTreeMap<String, ConfigEntry>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (name, decl) in &module.variables {
        insert_config(
            configs,
            format!("{prefix}var.{name}"),
            ConfigEntry::Variable(VariableConfig {
                default: decl.default.clone(),
                description: decl.description.clone(),
                sensitive: decl.sensitive,
            }),
        );
    }

    for (name, decl) in &module.outputs {
        let mut references = Vec::new();
        if let Some(expression) = &decl.expression {
            collect_references(expression, &mut references);
        }
        insert_config(
            configs,
            format!("{prefix}output.{name}"),
            ConfigEntry::Output(OutputConfig {
                sensitive: decl.sensitive,
                description: decl.description.clone(),
                references,
            }),
        );
    }

    for (name, call) in &module.module_calls {
        insert_config(
            configs,
            format!("{prefix}module.{name}"),
            ConfigEntry::Module(ModuleConfig {
                source: call.source.clone(),
                attributes: expression_attributes(&call.expressions),
            }),
        );
        walk_config_module(
            &format!("{prefix}module.{name}."),
            &call.module,
            configs,
            diagnostics,
        );
    }

    for decl in &module.resources {
        if decl.address.is_empty() {
            diagnostics.push(Diagnostic::MalformedPlan {
                address: format!("{prefix}{}.{}", decl.resource_type, decl.name),
                detail: "configuration resource has no address".to_string(),
            });
            continue;
        }
        insert_config(
            configs,
            format!("{prefix}{}", decl.address),
            ConfigEntry::Resource(ResourceConfig {
                provider: decl.provider_config_key.clone(),
                mode: decl.mode,
                attributes: expression_attributes(&decl.expressions),
                replicated: decl.is_replicated(),
            }),
        );
    }
}

fn insert_config(configs: &mut BTreeMap<String, ConfigEntry>, id: String, entry: ConfigEntry) {
    match configs.get(&id) {
        Some(existing) if existing.priority() <= entry.priority() => {}
        _ => {
            configs.insert(id, entry);
        }
    }
}

fn insert_meta(
    resources: &mut BTreeMap<String, ResourceMeta>,
    id: &str,
    provider_name: Option<String>,
) {
    let address = canonicalize(id);
    let meta = ResourceMeta {
        module_path: crate::plan::module_path(id),
        id: address.id,
        kind: address.kind,
        resource_type: address.resource_type,
        resource_name: address.resource_name,
        file_name_hint: address.file_name_hint,
        provider_name,
        is_replica: address.is_replica,
    };
    resources.insert(id.to_string(), meta);
}

/// Resolve one attribute expression into its discriminated value.
fn expression_value(expression: &Value) -> AttributeValue {
    if let Some(constant) = expression.get("constant_value") {
        return AttributeValue::Constant(constant.clone());
    }

    let mut references = Vec::new();
    collect_references(expression, &mut references);
    if references.is_empty() {
        // A nested block with only constants; its concrete values show up
        // in the diff, so nothing further to resolve here.
        AttributeValue::Constant(Value::Null)
    } else {
        AttributeValue::Reference(references)
    }
}

fn expression_attributes(expressions: &serde_json::Map<String, Value>) -> Vec<AttributeExpr> {
    expressions
        .iter()
        .map(|(name, expression)| AttributeExpr {
            name: name.clone(),
            value: expression_value(expression),
        })
        .collect()
}

/// Gather every `references` list under an expression, in document order.
fn collect_references(expression: &Value, out: &mut Vec<String>) {
    match expression {
        Value::Object(map) => {
            for (key, value) in map {
                if key == "references" {
                    if let Value::Array(items) = value {
                        out.extend(items.iter().filter_map(|v| v.as_str().map(String::from)));
                    }
                } else {
                    collect_references(value, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        _ => {}
    }
}

fn collapse_action(change: &Change, id: &str, diagnostics: &mut Vec<Diagnostic>) -> Action {
    match change.collapsed_action() {
        Some(action) => action,
        None => {
            diagnostics.push(Diagnostic::MalformedPlan {
                address: id.to_string(),
                detail: "change has an empty action sequence".to_string(),
            });
            Action::NoOp
        }
    }
}

/// Normalize a before/after value into an always-present attribute mapping.
/// Null and absent become `{}`; a non-mapping value for a resource is
/// malformed and also yields `{}` so consumers never branch.
fn diff_map(
    value: Option<&Value>,
    id: &str,
    side: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> BTreeMap<String, AttributeValue> {
    match value {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| (k.clone(), AttributeValue::Concrete(v.clone())))
            .collect(),
        Some(other) => {
            diagnostics.push(Diagnostic::MalformedPlan {
                address: id.to_string(),
                detail: format!("{side} value is not a mapping: {other}"),
            });
            BTreeMap::new()
        }
    }
}

/// Wrap an output's scalar value into the uniform one-key mapping form.
fn wrap_output_value(value: Option<&Value>) -> BTreeMap<String, AttributeValue> {
    match value {
        None | Some(Value::Null) => BTreeMap::new(),
        Some(v) => {
            let mut map = BTreeMap::new();
            map.insert("value".to_string(), AttributeValue::Concrete(v.clone()));
            map
        }
    }
}

/// Overwrite attributes flagged unknown. A `true` mask replaces the whole
/// attribute with the unknown sentinel regardless of any concrete value; a
/// container mask merges sentinels into the matching leaves.
fn apply_unknown(after: &mut BTreeMap<String, AttributeValue>, after_unknown: &Value) {
    let Value::Object(mask) = after_unknown else {
        return;
    };

    for (key, sub_mask) in mask {
        match sub_mask {
            Value::Bool(true) => {
                after.insert(key.clone(), AttributeValue::Unknown);
            }
            _ if is_masked(sub_mask) => {
                let current = match after.remove(key) {
                    Some(AttributeValue::Concrete(v)) => v,
                    Some(other) => {
                        // Already resolved (e.g. repeated key); keep it.
                        after.insert(key.clone(), other);
                        continue;
                    }
                    None => Value::Null,
                };
                after.insert(
                    key.clone(),
                    AttributeValue::Concrete(merge_unknown(current, sub_mask)),
                );
            }
            _ => {}
        }
    }
}

fn merge_unknown(value: Value, mask: &Value) -> Value {
    match mask {
        Value::Bool(true) => AttributeValue::unknown_sentinel(),
        Value::Object(mask_map) => {
            let mut map = match value {
                Value::Object(map) => map,
                _ => serde_json::Map::new(),
            };
            for (key, sub_mask) in mask_map {
                if !is_masked(sub_mask) {
                    continue;
                }
                let current = map.remove(key).unwrap_or(Value::Null);
                map.insert(key.clone(), merge_unknown(current, sub_mask));
            }
            Value::Object(map)
        }
        Value::Array(mask_items) => {
            let mut items = match value {
                Value::Array(items) => items,
                _ => Vec::new(),
            };
            while items.len() < mask_items.len() {
                items.push(Value::Null);
            }
            for (index, sub_mask) in mask_items.iter().enumerate() {
                if !is_masked(sub_mask) {
                    continue;
                }
                let current = std::mem::replace(&mut items[index], Value::Null);
                items[index] = merge_unknown(current, sub_mask);
            }
            Value::Array(items)
        }
        _ => value,
    }
}

/// Whether a mask subtree flags anything as unknown.
fn is_masked(mask: &Value) -> bool {
    match mask {
        Value::Bool(flag) => *flag,
        Value::Object(map) => map.values().any(is_masked),
        Value::Array(items) => items.iter().any(is_masked),
        _ => false,
    }
}
