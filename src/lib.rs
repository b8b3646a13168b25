//! plansight - compiles Terraform/OpenTofu plan JSON into three
//! visualization-ready artifacts:
//!
//! - **Resource State Overview**: per-resource configuration plus a
//!   field-level before/after diff with unknown values merged in
//! - **Dependency Graph**: nodes and typed edges across resources,
//!   modules, variables, and outputs
//! - **Module Map**: the hierarchical containment tree used for layout
//!
//! Sensitive values are redacted before any artifact is built, identifiers
//! are canonicalized into one dotted form, and replicas of count/for_each
//! declarations share a single configuration entry. Compilation never
//! aborts on a bad entry; problems are collected as diagnostics alongside
//! the artifacts.

pub mod commands;
pub mod compile;
pub mod diagnostics;
pub mod graph;
pub mod modmap;
pub mod output;
pub mod overview;
pub mod plan;
