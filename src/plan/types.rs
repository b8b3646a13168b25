//! Raw plan data model
//!
//! Serde types for the JSON emitted by `terraform show -json <planfile>` /
//! `tofu show -json <planfile>`. Only the fields the compiler consumes are
//! modeled; everything else in the document is ignored on deserialize.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A parsed plan document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub format_version: String,

    #[serde(default)]
    pub terraform_version: String,

    /// Top-level input variable values, keyed by variable name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, PlanVariable>,

    /// One entry per planned resource instance.
    #[serde(default)]
    pub resource_changes: Vec<ResourceChange>,

    /// Planned output changes, keyed by output name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub output_changes: BTreeMap<String, Change>,

    /// The declared configuration graph (one entry per declaration,
    /// independent of count/for_each expansion).
    #[serde(default)]
    pub configuration: Configuration,
}

/// A resolved input variable value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanVariable {
    #[serde(default)]
    pub value: Value,
}

/// One planned change to a single resource instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceChange {
    /// Full instance address, e.g. `module.vpc.aws_subnet.main[0]`.
    #[serde(default)]
    pub address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_address: Option<String>,

    #[serde(default)]
    pub mode: ResourceMode,

    #[serde(rename = "type", default)]
    pub resource_type: String,

    #[serde(default)]
    pub name: String,

    /// count index (number) or for_each key (string) for replicas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<Value>,

    #[serde(default)]
    pub provider_name: String,

    #[serde(default)]
    pub change: Change,
}

/// Whether a resource is managed or a data source read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceMode {
    #[default]
    Managed,
    Data,
}

/// The before/after change record for one resource instance or output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub actions: Vec<Action>,

    /// Prior value; `None` when the resource does not currently exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,

    /// Planned value; attributes not known until apply are absent here and
    /// flagged in `after_unknown` instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,

    /// Boolean-shaped mask: `true` at a path means the planned value there
    /// cannot be computed until apply.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub after_unknown: Value,

    /// Boolean-shaped sensitivity mask over `before`.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub before_sensitive: Value,

    /// Boolean-shaped sensitivity mask over `after`.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub after_sensitive: Value,
}

impl Change {
    /// Collapse the action sequence to a single action. A multi-action
    /// sequence (delete+create in either order) is a replacement. Returns
    /// `None` for an empty sequence, which a valid plan never produces.
    pub fn collapsed_action(&self) -> Option<Action> {
        match self.actions.as_slice() {
            [] => None,
            [single] => Some(*single),
            _ => Some(Action::Replace),
        }
    }
}

/// A single planned action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Create,
    Update,
    Delete,
    Read,
    NoOp,
    /// Synthetic: never present in the raw plan, produced by collapsing a
    /// multi-action sequence.
    Replace,
}

/// The declared configuration graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub root_module: ConfigModule,
}

/// One module's declarations. The root module and every module call body
/// share this shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigModule {
    #[serde(default)]
    pub resources: Vec<ConfigResource>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, ConfigVariable>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, ConfigOutput>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub module_calls: BTreeMap<String, ModuleCall>,
}

/// A declared resource (shared by all of its count/for_each instances).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigResource {
    /// Module-local address, e.g. `aws_instance.web` or `data.aws_ami.base`.
    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub mode: ResourceMode,

    #[serde(rename = "type", default)]
    pub resource_type: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub provider_config_key: String,

    /// Attribute expressions in declaration order. Each value is either
    /// `{"constant_value": ...}`, `{"references": [...]}`, or a nested
    /// block structure of the same.
    #[serde(default)]
    pub expressions: serde_json::Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count_expression: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub for_each_expression: Option<Value>,
}

impl ConfigResource {
    /// True when the declaration expands into multiple instances.
    pub fn is_replicated(&self) -> bool {
        self.count_expression.is_some() || self.for_each_expression.is_some()
    }
}

/// A declared input variable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigVariable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub sensitive: bool,
}

/// A declared output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigOutput {
    #[serde(default)]
    pub sensitive: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<Value>,
}

/// A declared call to a child module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleCall {
    #[serde(default)]
    pub source: String,

    /// Argument expressions passed to the module, in declaration order.
    #[serde(default)]
    pub expressions: serde_json::Map<String, Value>,

    /// The called module's own declarations.
    #[serde(default)]
    pub module: ConfigModule,
}
