//! Configuration schema for baseline
//!
//! Config lives at `.config/baseline/config.yaml` relative to the project root.
//! The language server also accepts the same keys as `initializationOptions`.

use baseline_core::{DEFAULT_IGNORE_FILE, RenderOptions, ScanOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config location, relative to the project root
pub const CONFIG_PATH: &str = ".config/baseline/config.yaml";

/// Where npm puts the `web-features` data when it is a project dependency
pub const DEFAULT_DATA_PATH: &str = "node_modules/web-features/data.json";

/// Extensions scanned for TODO markers when the config does not say otherwise
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "html", "htm", "css", "scss", "sass", "less", "js", "jsx", "mjs", "cjs", "ts", "tsx", "vue",
    "svelte", "astro", "md",
];

/// Root configuration for baseline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the `web-features` `data.json`, relative to the project root
    pub data: Option<PathBuf>,

    /// File extensions the TODO scanner visits (leading dots are fine)
    pub extensions: Vec<String>,

    /// Ignore file read at the top of each workspace root
    pub ignore_file: String,

    /// Base URI for Baseline status icons in hovers
    pub icon_base_uri: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            ignore_file: DEFAULT_IGNORE_FILE.to_string(),
            icon_base_uri: None,
        }
    }
}

impl Config {
    /// Parse a YAML config
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes as null
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Parse LSP `initializationOptions`; `null` means defaults
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
    }

    /// Resolve the data file against the project root
    pub fn data_path(&self, project_root: &Path) -> PathBuf {
        match &self.data {
            Some(path) => project_root.join(path),
            None => project_root.join(DEFAULT_DATA_PATH),
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            extensions: self.extensions.clone(),
            ignore_file: self.ignore_file.clone(),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            icon_base_uri: self.icon_base_uri.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_yaml(indoc! {r#"
            data: vendor/web-features.json
            extensions: [".js", "ts"]
            ignore_file: .baselineignore
            icon_base_uri: https://example.com/icons
        "#})
        .unwrap();

        assert_eq!(config.data, Some(PathBuf::from("vendor/web-features.json")));
        assert_eq!(config.extensions, vec![".js", "ts"]);
        assert_eq!(config.ignore_file, ".baselineignore");
        assert_eq!(
            config.render_options().icon_base_uri.as_deref(),
            Some("https://example.com/icons")
        );
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = Config::from_yaml("extensions: [css]\n").unwrap();
        assert_eq!(config.ignore_file, ".gitignore");
        assert_eq!(config.data, None);
        assert_eq!(
            config.data_path(Path::new("/p")),
            PathBuf::from("/p/node_modules/web-features/data.json")
        );

        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_explicit_empty_extensions_survive() {
        // Rejected later by the scanner, not silently replaced here
        let config = Config::from_yaml("extensions: []\n").unwrap();
        assert!(config.extensions.is_empty());
    }

    #[test]
    fn test_initialization_options() {
        let config =
            Config::from_json_value(serde_json::json!({ "extensions": ["vue"] })).unwrap();
        assert_eq!(config.scan_options().extensions, vec!["vue"]);
        assert_eq!(
            Config::from_json_value(serde_json::Value::Null).unwrap(),
            Config::default()
        );
        assert!(Config::from_json_value(serde_json::json!({ "extensions": 3 })).is_err());
    }
}
