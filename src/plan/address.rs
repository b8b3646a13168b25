//! Identifier canonicalization
//!
//! Plan documents name the same object several ways: module-prefixed
//! instance addresses (`module.vpc.aws_subnet.main[0]`), module-local
//! configuration addresses (`aws_subnet.main`), variable/output shorthand
//! (`var.region`, `output.endpoint`), and occasionally a slash-namespaced
//! form whose leading segment is a source-file hint. Everything here
//! normalizes those into one dotted canonical id and classifies it.
//!
//! Replica suffix grammar (applied right-to-left, repeatable):
//!
//! ```text
//! suffix := '[' ( digit+ | '"' non-quote* '"' ) ']'
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// One or more trailing replica suffixes, e.g. `[0]` or `["eu-west-1"]`.
    static ref REPLICA_SUFFIX: Regex =
        Regex::new(r#"(?:\[(?:\d+|"[^"]*")\])+$"#).expect("invalid replica suffix pattern");

    /// A single replica suffix anywhere in an id.
    static ref BRACKET_GROUP: Regex =
        Regex::new(r#"\[(?:\d+|"[^"]*")\]"#).expect("invalid bracket group pattern");
}

/// The primitive classification of a canonical id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Resource,
    Data,
    Module,
    Variable,
    Output,
    Local,
}

impl NodeKind {
    /// Display ordering used when listing siblings.
    pub fn rank(self) -> u8 {
        match self {
            NodeKind::Module => 0,
            NodeKind::Resource => 1,
            NodeKind::Data => 2,
            NodeKind::Output => 3,
            NodeKind::Variable => 4,
            NodeKind::Local => 5,
        }
    }
}

/// A canonicalized identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Canonical dotted id, e.g. `module.vpc.aws_subnet.main[0]`.
    pub id: String,

    /// Leading namespace segment of the slash-delimited raw form, when
    /// present. Absent for ordinary plan addresses.
    pub file_name_hint: Option<String>,

    /// Second-to-last dotted segment, e.g. `aws_subnet`, `var`, `module`.
    pub resource_type: String,

    /// Last dotted segment, replica suffix included.
    pub resource_name: String,

    pub kind: NodeKind,

    /// True when the id names one concrete instance of a count/for_each
    /// declaration.
    pub is_replica: bool,
}

/// Canonicalize a raw identifier.
pub fn canonicalize(raw: &str) -> Address {
    let (file_name_hint, dotted) = match raw.split_once('/') {
        Some((hint, rest)) => (Some(hint.to_string()), rest.replace('/', ".")),
        None => (None, raw.to_string()),
    };

    let parent = strip_replica_suffix(&dotted);
    let suffix = &dotted[parent.len()..];
    let segments = split_segments(parent);

    let (resource_type, resource_name) = match segments.as_slice() {
        [] => (String::new(), String::new()),
        [only] => (String::new(), format!("{only}{suffix}")),
        [.., ty, name] => (ty.clone(), format!("{name}{suffix}")),
    };

    let kind = classify(&dotted, &resource_type);
    let is_replica = !suffix.is_empty();

    Address {
        id: dotted,
        file_name_hint,
        resource_type,
        resource_name,
        kind,
        is_replica,
    }
}

/// Derive the configuration id shared by all replicas of a declaration:
/// the canonical id with every replica suffix removed.
pub fn config_id(id: &str) -> String {
    BRACKET_GROUP.replace_all(id, "").into_owned()
}

/// Remove trailing replica suffixes only. Total: ids without a suffix are
/// returned unchanged, and brackets elsewhere in the id are untouched.
pub fn strip_replica_suffix(id: &str) -> &str {
    match REPLICA_SUFFIX.find(id) {
        Some(m) => &id[..m.start()],
        None => id,
    }
}

/// The containing module path of a canonical id, e.g.
/// `module.vpc.aws_subnet.main` -> `module.vpc`. For a module id the path
/// is its parent module; top-level ids have none.
pub fn module_path(id: &str) -> Option<String> {
    let segments = split_segments(id);
    let mut pairs = 0;
    while pairs * 2 + 1 < segments.len() && segments[pairs * 2] == "module" {
        pairs += 1;
    }

    // An id that is itself a module keeps only its ancestors.
    let is_module = pairs > 0 && segments.len() == pairs * 2;
    let kept = if is_module { pairs - 1 } else { pairs };

    if kept == 0 {
        return None;
    }
    Some(segments[..kept * 2].join("."))
}

fn classify(id: &str, resource_type: &str) -> NodeKind {
    match resource_type {
        "var" => return NodeKind::Variable,
        "output" => return NodeKind::Output,
        "local" => return NodeKind::Local,
        "module" => return NodeKind::Module,
        _ => {}
    }

    // Strip the module prefix so nested data sources classify correctly.
    let local = match module_path(id) {
        Some(path) => id.strip_prefix(&format!("{path}.")).unwrap_or(id),
        None => id,
    };
    if local.starts_with("data.") {
        NodeKind::Data
    } else {
        NodeKind::Resource
    }
}

/// Split a dotted id into segments, treating dots inside replica suffixes
/// (quoted for_each keys may contain them) as part of the segment.
pub(crate) fn split_segments(id: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0u32;
    let mut in_quotes = false;

    for c in id.chars() {
        match c {
            '[' if !in_quotes => {
                depth += 1;
                current.push(c);
            }
            ']' if !in_quotes && depth > 0 => {
                depth -= 1;
                current.push(c);
            }
            '"' if depth > 0 => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '.' if depth == 0 => {
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments
}
