//! Non-fatal compilation diagnostics
//!
//! A partial visualization is more useful than none, so the builders never
//! abort on a bad identifier or reference. Everything they skip or drop is
//! recorded here and returned alongside the artifacts.

use serde::Serialize;
use std::fmt;

/// One recorded problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A required field was missing or of the wrong shape for its kind;
    /// the offending entry was skipped.
    MalformedPlan { address: String, detail: String },

    /// A configuration reference named an id with no node in the graph;
    /// the edge was dropped.
    UnresolvableReference { from: String, reference: String },

    /// Sensitivity detection failed; the plan was left unredacted.
    SanitizationFailure { detail: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MalformedPlan { address, detail } => {
                write!(f, "malformed plan entry '{address}': {detail}")
            }
            Diagnostic::UnresolvableReference { from, reference } => {
                write!(f, "dropped reference from '{from}': '{reference}' is not a known node")
            }
            Diagnostic::SanitizationFailure { detail } => {
                write!(f, "plan left unredacted, sanitization failed: {detail}")
            }
        }
    }
}

/// The collected diagnostics of one compilation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.entries.extend(diagnostics);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of reference edges dropped for naming unknown nodes.
    pub fn dropped_references(&self) -> usize {
        self.entries
            .iter()
            .filter(|d| matches!(d, Diagnostic::UnresolvableReference { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_reference_count() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.push(Diagnostic::UnresolvableReference {
            from: "aws_instance.web".to_string(),
            reference: "aws_sg.missing".to_string(),
        });
        diagnostics.push(Diagnostic::SanitizationFailure {
            detail: "mask mismatch".to_string(),
        });

        assert_eq!(diagnostics.dropped_references(), 1);
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn test_display_names_the_entry() {
        let d = Diagnostic::MalformedPlan {
            address: "aws_instance.web".to_string(),
            detail: "missing address".to_string(),
        };
        assert!(d.to_string().contains("aws_instance.web"));
    }
}
