//! TODO report rows enriched with registry data

use crate::registry::{FeatureRegistry, SupportCell};
use crate::status::{IconKey, classify};
use serde::Serialize;
use std::path::{Path, PathBuf};
use url::Url;

/// A `TODO(baseline/<id>)` marker found in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoEntry {
    /// The id as written; not checked against the registry
    pub feature_id: String,
    pub file_name: String,
    pub file_path: PathBuf,
    /// Line number (1-indexed)
    pub line_number: usize,
}

/// Registry data attached to a TODO row for a known feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSummary {
    pub name: String,
    pub status_label: String,
    pub icon: IconKey,
}

/// One row of the TODO report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TodoRow {
    pub feature_id: String,
    pub file_name: String,
    pub file_path: String,
    /// `file://` URI of the file, for click-to-open
    pub file_uri: String,
    /// Line number (1-indexed)
    pub line_number: usize,
    /// `None` when the id is not registered
    pub feature: Option<FeatureSummary>,
    /// Per-browser support, empty for unknown ids
    pub support: Vec<SupportCell>,
}

/// Ordered TODO report
#[derive(Debug, Clone, Default, Serialize)]
pub struct TodoReport {
    pub rows: Vec<TodoRow>,
}

impl TodoReport {
    /// Enrich scan entries with registry data, keeping their order
    pub fn build(entries: &[TodoEntry], registry: &FeatureRegistry) -> Self {
        let rows = entries
            .iter()
            .map(|entry| {
                // Ids are captured verbatim; registry keys are lowercase
                let feature = registry.get(&entry.feature_id.to_lowercase());
                TodoRow {
                    feature_id: entry.feature_id.clone(),
                    file_name: entry.file_name.clone(),
                    file_path: entry.file_path.display().to_string(),
                    file_uri: file_uri(&entry.file_path),
                    line_number: entry.line_number,
                    feature: feature.map(|f| {
                        let status = classify(&f.status);
                        FeatureSummary {
                            name: f.name.clone(),
                            status_label: status.label,
                            icon: status.icon,
                        }
                    }),
                    support: feature
                        .map(|f| registry.support_cells(f))
                        .unwrap_or_default(),
                }
            })
            .collect();

        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows whose feature id is not registered
    pub fn unknown(&self) -> impl Iterator<Item = &TodoRow> {
        self.rows.iter().filter(|r| r.feature.is_none())
    }
}

/// `file://` URI of a path; relative paths are resolved against the current
/// directory first.
fn file_uri(path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    Url::from_file_path(&absolute)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("file://{}", absolute.display()))
}
