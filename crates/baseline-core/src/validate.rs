//! Document-wide validation of feature references

use crate::matcher::{Range, find_first_reference};
use crate::registry::FeatureRegistry;
use serde::Serialize;

/// Code attached to every unrecognized-id diagnostic
pub const UNRECOGNIZED_FEATURE_CODE: &str = "unrecognized-feature";

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
}

/// A validation finding tied to a text range
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub range: Range,
    pub message: String,
    pub severity: Severity,
    pub code: &'static str,
    /// The id that was not found
    pub feature_id: String,
}

/// Validate every line of a document against the registry.
///
/// Each line contributes at most one diagnostic (its first reference). The
/// result replaces whatever was previously reported for the document.
/// An empty registry (data failed to load) reports nothing.
pub fn validate(text: &str, registry: &FeatureRegistry) -> Vec<Diagnostic> {
    if registry.is_empty() {
        return Vec::new();
    }

    text.lines()
        .enumerate()
        .filter_map(|(line_idx, line)| find_first_reference(line, line_idx as u32))
        .filter(|reference| !registry.has(&reference.feature_id))
        .map(|reference| Diagnostic {
            range: reference.range(),
            message: unrecognized_message(&reference.feature_id),
            severity: Severity::Error,
            code: UNRECOGNIZED_FEATURE_CODE,
            feature_id: reference.feature_id,
        })
        .collect()
}

fn unrecognized_message(feature_id: &str) -> String {
    format!(
        "Unrecognized Baseline feature ID: {}\n\nTry using the 'Baseline search' command to find the feature you're looking for.",
        feature_id
    )
}
