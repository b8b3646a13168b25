//! Plan ingestion: raw JSON model, identifier canonicalization, and
//! sensitive-value redaction.

pub mod address;
pub mod sanitize;
pub mod types;

pub use address::{Address, NodeKind, canonicalize, config_id, module_path, strip_replica_suffix};
pub use sanitize::{REDACTED, sanitize};
pub use types::{Action, Change, Configuration, Plan, ResourceChange};

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Load and parse a plan JSON document from disk. This is the only fatal
/// error boundary of the compiler: a document that does not parse into the
/// plan shape cannot be compiled at all.
pub fn load_plan(path: &Path) -> Result<Plan> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse plan file as JSON: {}", path.display()))
}
