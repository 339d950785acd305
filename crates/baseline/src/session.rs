//! Open documents and the validation runs computed against them.
//!
//! Each document is stored with the version the editor last sent. A
//! validation run remembers the version it was computed from, so a run that
//! finishes after the document changed again can be recognized and dropped.

use baseline_core::{
    Diagnostic, FeatureRegistry, InsertionTrigger, Position, RenderOptions, RenderedHover,
    completion_trigger, hover, validate,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Document {
    version: i32,
    text: String,
}

/// Result of validating one version of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRun {
    pub uri: String,
    pub version: i32,
    pub diagnostics: Vec<Diagnostic>,
}

/// The set of documents currently open in the editor
#[derive(Debug, Default)]
pub struct Session {
    documents: BTreeMap<String, Document>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, uri: impl Into<String>, version: i32, text: impl Into<String>) {
        self.documents.insert(
            uri.into(),
            Document {
                version,
                text: text.into(),
            },
        );
    }

    /// Replace a document's full text. Returns false when the change is older
    /// than what is stored.
    pub fn change(&mut self, uri: &str, version: i32, text: impl Into<String>) -> bool {
        match self.documents.get_mut(uri) {
            Some(doc) if version < doc.version => false,
            Some(doc) => {
                doc.version = version;
                doc.text = text.into();
                true
            }
            None => {
                self.open(uri, version, text);
                true
            }
        }
    }

    /// Forget a document. Returns whether it was open.
    pub fn close(&mut self, uri: &str) -> bool {
        self.documents.remove(uri).is_some()
    }

    pub fn text(&self, uri: &str) -> Option<&str> {
        self.documents.get(uri).map(|d| d.text.as_str())
    }

    pub fn version(&self, uri: &str) -> Option<i32> {
        self.documents.get(uri).map(|d| d.version)
    }

    /// URIs of every open document, in a stable order
    pub fn open_uris(&self) -> Vec<String> {
        self.documents.keys().cloned().collect()
    }

    /// Validate the stored version of a document
    pub fn validate(&self, uri: &str, registry: &FeatureRegistry) -> Option<ValidationRun> {
        let doc = self.documents.get(uri)?;
        Some(ValidationRun {
            uri: uri.to_string(),
            version: doc.version,
            diagnostics: validate(&doc.text, registry),
        })
    }

    /// Whether a run still describes the stored document
    pub fn is_current(&self, run: &ValidationRun) -> bool {
        self.version(&run.uri) == Some(run.version)
    }

    pub fn hover(
        &self,
        uri: &str,
        position: Position,
        registry: &FeatureRegistry,
        options: &RenderOptions,
    ) -> Option<RenderedHover> {
        hover(self.text(uri)?, position, registry, options)
    }

    /// Insertion trigger at a cursor, allowing a partially typed id
    pub fn completion_trigger(&self, uri: &str, position: Position) -> Option<InsertionTrigger> {
        let line = self.text(uri)?.lines().nth(position.line as usize)?;
        completion_trigger(line, position.line, position.character)
    }
}
