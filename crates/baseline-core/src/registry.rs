//! Feature and browser registry
//!
//! The registry is built from a `web-features` `data.json` snapshot and is
//! immutable once loaded. Consumers hold it by reference (or behind an `Arc`)
//! and a reload always replaces the whole value.

use crate::status::classify;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sentinel returned by [`FeatureRegistry::release_date`] when a browser or
/// version is not known.
pub const UNKNOWN_DATE: &str = "Unknown";

/// Base URL of the webstatus.dev feature pages.
const EXPLORE_BASE_URL: &str = "https://webstatus.dev/features";

/// Errors that can occur while loading the registry
#[derive(Debug, Error)]
pub enum RegistryLoadError {
    #[error("failed to read feature data from {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse feature data")]
    Parse(#[from] serde_json::Error),

    #[error("feature data is missing the `{0}` key")]
    MissingKey(&'static str),
}

/// The browsers Baseline status is computed over, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BrowserId {
    Chrome,
    ChromeAndroid,
    Edge,
    Safari,
    SafariIos,
    Firefox,
    FirefoxAndroid,
}

impl BrowserId {
    /// Canonical ordering used for every support table.
    pub const ALL: [BrowserId; 7] = [
        BrowserId::Chrome,
        BrowserId::ChromeAndroid,
        BrowserId::Edge,
        BrowserId::Safari,
        BrowserId::SafariIos,
        BrowserId::Firefox,
        BrowserId::FirefoxAndroid,
    ];

    /// Key used by the data source
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserId::Chrome => "chrome",
            BrowserId::ChromeAndroid => "chrome_android",
            BrowserId::Edge => "edge",
            BrowserId::Safari => "safari",
            BrowserId::SafariIos => "safari_ios",
            BrowserId::Firefox => "firefox",
            BrowserId::FirefoxAndroid => "firefox_android",
        }
    }

    /// Display name used when the registry has no entry for this browser
    pub fn fallback_name(&self) -> &'static str {
        match self {
            BrowserId::Chrome => "Chrome",
            BrowserId::ChromeAndroid => "Chrome Android",
            BrowserId::Edge => "Edge",
            BrowserId::Safari => "Safari",
            BrowserId::SafariIos => "Safari on iOS",
            BrowserId::Firefox => "Firefox",
            BrowserId::FirefoxAndroid => "Firefox for Android",
        }
    }
}

impl std::fmt::Display for BrowserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single browser release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub version: String,
    pub date: String,
}

/// A browser and its release history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Browser {
    /// Display name, e.g. "Safari on iOS"
    pub name: String,
    /// Releases in the order the data source lists them
    #[serde(default)]
    pub releases: Vec<Release>,
}

/// Raw Baseline tier as stored in the data source.
///
/// The source encodes "not Baseline" as `false`; anything that is not `"high"`
/// or `"low"` collapses into [`BaselineLevel::Limited`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineLevel {
    High,
    Low,
    #[default]
    Limited,
}

fn deserialize_baseline<'de, D>(deserializer: D) -> Result<BaselineLevel, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value.as_ref().and_then(|v| v.as_str()) {
        Some("high") => BaselineLevel::High,
        Some("low") => BaselineLevel::Low,
        _ => BaselineLevel::Limited,
    })
}

/// Availability status of a feature
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureStatus {
    #[serde(default, deserialize_with = "deserialize_baseline")]
    pub baseline: BaselineLevel,
    #[serde(default)]
    pub baseline_low_date: Option<String>,
    #[serde(default)]
    pub baseline_high_date: Option<String>,
    /// Browser id -> earliest supporting version. Unsupported browsers are absent.
    #[serde(default)]
    pub support: HashMap<String, String>,
}

/// A web platform feature
#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    /// Lowercase kebab-case key
    pub id: String,
    pub name: String,
    pub description: String,
    pub description_html: String,
    pub status: FeatureStatus,
}

impl Feature {
    /// Earliest supporting version for a browser, if any
    pub fn support_for(&self, browser: BrowserId) -> Option<&str> {
        self.status.support.get(browser.as_str()).map(String::as_str)
    }
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    description_html: String,
    #[serde(default)]
    status: FeatureStatus,
}

#[derive(Deserialize)]
struct RawData {
    #[serde(default)]
    features: Option<HashMap<String, RawFeature>>,
    #[serde(default)]
    browsers: Option<HashMap<String, Browser>>,
}

/// Support of one browser for one feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportCell {
    pub browser: BrowserId,
    pub browser_name: String,
    /// Earliest supporting version, `None` when unsupported
    pub version: Option<String>,
    /// Release date of `version`, or [`UNKNOWN_DATE`]
    pub release_date: Option<String>,
}

/// A feature as offered to an external picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickCandidate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub description_html: String,
    pub status_label: String,
}

impl PickCandidate {
    /// Message shown once the user picked this candidate
    pub fn summary(&self) -> String {
        format!("{} is Baseline {}", self.id, self.status_label)
    }

    /// Where to explore the feature further
    pub fn explore_url(&self) -> String {
        explore_url(&self.id)
    }
}

/// webstatus.dev page for a feature
pub fn explore_url(feature_id: &str) -> String {
    format!("{}/{}/", EXPLORE_BASE_URL, feature_id)
}

/// In-memory index of all known features and browsers
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    features: HashMap<String, Feature>,
    browsers: HashMap<String, Browser>,
}

impl FeatureRegistry {
    /// A registry with no features. Every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a registry from the `data.json` contents
    pub fn from_json(json: &str) -> Result<Self, RegistryLoadError> {
        let raw: RawData = serde_json::from_str(json)?;
        let features = raw.features.ok_or(RegistryLoadError::MissingKey("features"))?;
        let browsers = raw.browsers.ok_or(RegistryLoadError::MissingKey("browsers"))?;

        let features = features
            .into_iter()
            // Redirect entries (moved/split features) carry no name
            .filter_map(|(id, raw)| {
                let name = raw.name?;
                let id = id.to_lowercase();
                Some((
                    id.clone(),
                    Feature {
                        id,
                        name,
                        description: raw.description,
                        description_html: raw.description_html,
                        status: raw.status,
                    },
                ))
            })
            .collect();

        Ok(Self { features, browsers })
    }

    /// Load a registry from a `data.json` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryLoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| RegistryLoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Whether a feature id is known. Ids are compared exactly against the
    /// lowercase keys.
    pub fn has(&self, feature_id: &str) -> bool {
        self.features.contains_key(feature_id)
    }

    pub fn get(&self, feature_id: &str) -> Option<&Feature> {
        self.features.get(feature_id)
    }

    pub fn browser(&self, browser: BrowserId) -> Option<&Browser> {
        self.browsers.get(browser.as_str())
    }

    /// Display name for a browser, falling back to a built-in name
    pub fn browser_name(&self, browser: BrowserId) -> &str {
        self.browser(browser)
            .map(|b| b.name.as_str())
            .unwrap_or_else(|| browser.fallback_name())
    }

    /// Release date of a browser version, or [`UNKNOWN_DATE`].
    ///
    /// Ranged versions like `≤79` are looked up as `79`.
    pub fn release_date(&self, browser: &str, version: &str) -> &str {
        let version = version.trim_start_matches('≤');
        self.browsers
            .get(browser)
            .and_then(|b| b.releases.iter().find(|r| r.version == version))
            .map(|r| r.date.as_str())
            .unwrap_or(UNKNOWN_DATE)
    }

    /// All features, in no particular order
    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Every feature as a picker candidate, sorted by name
    pub fn candidates(&self) -> Vec<PickCandidate> {
        let mut candidates: Vec<PickCandidate> = self.features().map(to_candidate).collect();
        candidates.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });
        candidates
    }

    /// Candidates whose id, name or description contain `query`
    /// (case-insensitive). An exact id match ranks first, the rest by name
    /// similarity to the query.
    pub fn search(&self, query: &str) -> Vec<PickCandidate> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.candidates();
        }

        let mut hits: Vec<(f64, PickCandidate)> = self
            .features()
            .filter(|f| {
                f.id.contains(&query)
                    || f.name.to_lowercase().contains(&query)
                    || f.description.to_lowercase().contains(&query)
            })
            .map(|f| {
                let score = if f.id == query {
                    2.0
                } else {
                    strsim::jaro_winkler(&query, &f.name.to_lowercase())
                };
                (score, to_candidate(f))
            })
            .collect();

        hits.sort_by(|(sa, a), (sb, b)| {
            sb.total_cmp(sa)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.into_iter().map(|(_, c)| c).collect()
    }

    /// Per-browser support of a feature, in [`BrowserId::ALL`] order
    pub fn support_cells(&self, feature: &Feature) -> Vec<SupportCell> {
        BrowserId::ALL
            .into_iter()
            .map(|browser| {
                let version = feature.support_for(browser);
                SupportCell {
                    browser,
                    browser_name: self.browser_name(browser).to_string(),
                    version: version.map(str::to_string),
                    release_date: version
                        .map(|v| self.release_date(browser.as_str(), v).to_string()),
                }
            })
            .collect()
    }
}

fn to_candidate(feature: &Feature) -> PickCandidate {
    PickCandidate {
        id: feature.id.clone(),
        name: feature.name.clone(),
        description: feature.description.clone(),
        description_html: feature.description_html.clone(),
        status_label: classify(&feature.status).label,
    }
}
