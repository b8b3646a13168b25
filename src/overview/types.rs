//! Resource State Overview artifact types
//!
//! Build-once, read-only structures handed to the graph and map builders
//! and serialized for the presentation layer.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::plan::types::{Action, ResourceMode};
use crate::plan::NodeKind;

/// The compiled overview: descriptive metadata, shared configuration, and
/// per-instance state for every canonical id in the plan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceOverview {
    pub resources: BTreeMap<String, ResourceMeta>,
    pub configs: BTreeMap<String, ConfigEntry>,
    pub states: BTreeMap<String, ResourceState>,
}

impl ResourceOverview {
    /// Resolve the configuration for a canonical id. Replicas whose shared
    /// configuration cannot be found defer to their parent resource rather
    /// than failing.
    pub fn resolve_config(&self, id: &str) -> ResolvedConfig<'_> {
        let config_id = self
            .states
            .get(id)
            .map(|state| state.config_id.clone())
            .unwrap_or_else(|| crate::plan::config_id(id));

        match self.configs.get(&config_id) {
            Some(entry) => ResolvedConfig::Entry(entry),
            None if crate::plan::canonicalize(id).is_replica => ResolvedConfig::DeferToParent,
            None => ResolvedConfig::Empty,
        }
    }
}

/// Outcome of configuration resolution for one id.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedConfig<'a> {
    Entry(&'a ConfigEntry),
    /// No configuration was declared; behaves as `{}`.
    Empty,
    /// Replica with no shared configuration entry of its own; consumers
    /// should look at the parent resource instead.
    DeferToParent,
}

/// Descriptive metadata for one canonical id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceMeta {
    pub id: String,
    pub kind: NodeKind,
    pub resource_type: String,
    pub resource_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name_hint: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,

    pub is_replica: bool,
}

/// State of one planned instance: which configuration it shares and what
/// will change.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceState {
    pub config_id: String,

    /// Absent for variables, which have no change record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<ChangeSummary>,
}

/// A collapsed, diff-ready change record. `before` and `after` are always
/// present mappings, possibly empty, so consumers iterate unconditionally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeSummary {
    pub action: Action,
    pub before: BTreeMap<String, AttributeValue>,
    pub after: BTreeMap<String, AttributeValue>,
}

impl ChangeSummary {
    /// Attribute names whose values actually differ: both sides present,
    /// neither null, and not deeply equal. Fields absent or null on either
    /// side are not part of the comparable diff set.
    pub fn changed_fields(&self) -> Vec<&str> {
        self.before
            .iter()
            .filter_map(|(name, before)| {
                let after = self.after.get(name)?;
                match (before, after) {
                    (AttributeValue::Concrete(b), AttributeValue::Concrete(a))
                        if !b.is_null() && !a.is_null() && b != a =>
                    {
                        Some(name.as_str())
                    }
                    _ => None,
                }
            })
            .collect()
    }
}

/// One declared configuration entry. Exactly one variant applies per id;
/// the empty configuration is the absence of an entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigEntry {
    Variable(VariableConfig),
    Output(OutputConfig),
    Module(ModuleConfig),
    Resource(ResourceConfig),
}

impl ConfigEntry {
    /// Resolution priority when the raw configuration maps offer more than
    /// one variant for the same id: lowest wins.
    pub fn priority(&self) -> u8 {
        match self {
            ConfigEntry::Variable(_) => 0,
            ConfigEntry::Output(_) => 1,
            ConfigEntry::Module(_) => 2,
            ConfigEntry::Resource(_) => 3,
        }
    }

    /// Attribute expressions in declaration order, for kinds that have them.
    pub fn attributes(&self) -> &[AttributeExpr] {
        match self {
            ConfigEntry::Module(m) => &m.attributes,
            ConfigEntry::Resource(r) => &r.attributes,
            ConfigEntry::Variable(_) | ConfigEntry::Output(_) => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VariableConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub sensitive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutputConfig {
    pub sensitive: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Canonical ids referenced by the output expression, in declaration
    /// order.
    pub references: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModuleConfig {
    pub source: String,
    pub attributes: Vec<AttributeExpr>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceConfig {
    pub provider: String,
    pub mode: ResourceMode,
    pub attributes: Vec<AttributeExpr>,

    /// True when declared with count/for_each.
    pub replicated: bool,
}

/// A named attribute expression, declaration order preserved by position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeExpr {
    pub name: String,
    pub value: AttributeValue,
}

/// A resolved attribute value, discriminated once at build time so
/// consumers never re-inspect raw shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// A concrete planned or prior value.
    Concrete(Value),
    /// Not computable until the change is applied.
    Unknown,
    /// An expression referencing other canonical ids.
    Reference(Vec<String>),
    /// A constant configuration expression.
    Constant(Value),
}

impl AttributeValue {
    /// The JSON sentinel for an unknown value.
    pub fn unknown_sentinel() -> Value {
        serde_json::json!({"unknown": true})
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttributeValue::Concrete(value) => value.serialize(serializer),
            AttributeValue::Unknown => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("unknown", &true)?;
                map.end()
            }
            AttributeValue::Reference(ids) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("references", ids)?;
                map.end()
            }
            AttributeValue::Constant(value) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("constant_value", value)?;
                map.end()
            }
        }
    }
}
