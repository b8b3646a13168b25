//! Resource State Overview
//!
//! The first derived artifact: per-resource configuration resolution plus a
//! field-level before/after diff with unknown values merged in. The graph
//! and map builders consume this, never the raw plan.

mod builder;
mod types;

pub use builder::build_overview;
pub use types::{
    AttributeExpr, AttributeValue, ChangeSummary, ConfigEntry, ModuleConfig, OutputConfig,
    ResolvedConfig, ResourceConfig, ResourceMeta, ResourceOverview, ResourceState, VariableConfig,
};
