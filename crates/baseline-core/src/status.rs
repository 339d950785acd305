//! Baseline status classification

use crate::registry::{BaselineLevel, FeatureStatus, UNKNOWN_DATE};
use serde::Serialize;

/// Which Baseline icon to show next to a status label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IconKey {
    Widely,
    Newly,
    Limited,
}

impl IconKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            IconKey::Widely => "widely",
            IconKey::Newly => "newly",
            IconKey::Limited => "limited",
        }
    }
}

impl std::fmt::Display for IconKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable Baseline tier of a feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaselineStatus {
    pub label: String,
    pub icon: IconKey,
}

/// Derive the label and icon for a feature status.
///
/// Total over the three tiers: every value that is not `high` or `low` is
/// limited availability.
pub fn classify(status: &FeatureStatus) -> BaselineStatus {
    let date = |d: &Option<String>| d.clone().unwrap_or_else(|| UNKNOWN_DATE.to_string());

    match status.baseline {
        BaselineLevel::High => BaselineStatus {
            label: format!("Widely available since {}", date(&status.baseline_high_date)),
            icon: IconKey::Widely,
        },
        BaselineLevel::Low => BaselineStatus {
            label: format!("Newly available since {}", date(&status.baseline_low_date)),
            icon: IconKey::Newly,
        },
        BaselineLevel::Limited => BaselineStatus {
            label: "Limited availability across major browsers".to_string(),
            icon: IconKey::Limited,
        },
    }
}
