//! baseline-core - Core library for Baseline feature references
//!
//! This crate provides the building blocks for:
//! - Loading the `web-features` registry of features and browsers
//! - Recognizing feature references in arbitrary source text
//! - Validating references and rendering hover information
//! - Scanning a workspace for `TODO(baseline/<id>)` markers
//!
//! # Features
//!
//! - `scan` - Enable [`TodoScanner`] for async workspace scanning (brings in
//!   `ignore`, `globset` and `tokio`)
//!
//! # Reference syntax
//!
//! Two syntaxes embed a feature id in text. Only the first reference of each
//! line is recognized.
//!
//! ```text
//! // Uses baseline/container-queries for the sidebar
//! <baseline-status featureId="container-queries"></baseline-status>
//! ```
//!
//! ```
//! use baseline_core::{FeatureRegistry, find_first_reference, validate};
//!
//! let registry = FeatureRegistry::from_json(r#"{
//!     "browsers": {},
//!     "features": { "grid": { "name": "Grid", "status": { "baseline": "high" } } }
//! }"#).unwrap();
//!
//! let reference = find_first_reference("// see baseline/grid", 0).unwrap();
//! assert_eq!(reference.feature_id, "grid");
//! assert_eq!((reference.start_column, reference.end_column), (16, 20));
//!
//! assert!(validate("// see baseline/grid", &registry).is_empty());
//! assert_eq!(validate("// see baseline/gird", &registry).len(), 1);
//! ```
//!
//! # TODO markers
//!
//! ```text
//! // TODO(baseline/dialog) drop the polyfill once this is widely available
//! ```

mod hover;
mod matcher;
mod registry;
mod report;
#[cfg(feature = "scan")]
mod scan;
mod status;
mod validate;

pub use hover::{HOVER_SCAN_CHARS, RenderOptions, RenderedHover, UNSUPPORTED_CELL, hover};
pub use matcher::{
    InsertionTrigger, Position, Range, Reference, SyntaxKind, TextInsertion, completion_trigger,
    find_first_reference, find_todo_marker, insertion_trigger,
};
pub use registry::{
    BaselineLevel, Browser, BrowserId, Feature, FeatureRegistry, FeatureStatus, PickCandidate,
    RegistryLoadError, Release, SupportCell, UNKNOWN_DATE, explore_url,
};
pub use report::{FeatureSummary, TodoEntry, TodoReport, TodoRow};
#[cfg(feature = "scan")]
pub use scan::{
    DEFAULT_IGNORE_FILE, ScanError, ScanOptions, ScanStatus, TodoScanner, extract_todos,
    normalize_extensions,
};
pub use status::{BaselineStatus, IconKey, classify};
pub use validate::{Diagnostic, Severity, UNRECOGNIZED_FEATURE_CODE, validate};
