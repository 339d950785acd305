//! Loading and sharing the feature registry.
//!
//! The registry is immutable once built. Readers take an `Arc` snapshot from a
//! `watch` channel; a reload builds a complete replacement and sends it.

use baseline_core::FeatureRegistry;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{info, warn};

/// Load the registry, degrading to an empty one when the data file is
/// missing or malformed. The failure is logged once, here.
pub fn load_registry(path: &Path) -> FeatureRegistry {
    match FeatureRegistry::load(path) {
        Ok(registry) => {
            info!("Loaded {} features from {}", registry.len(), path.display());
            registry
        }
        Err(e) => {
            warn!("Could not load feature data ({}); continuing without it", e);
            FeatureRegistry::empty()
        }
    }
}

/// Registry shared between the language server's tasks
#[derive(Debug)]
pub struct SharedRegistry {
    path: Mutex<PathBuf>,
    tx: watch::Sender<Arc<FeatureRegistry>>,
}

impl SharedRegistry {
    /// Load the initial registry from `path`
    pub fn load(path: PathBuf) -> Self {
        let registry = load_registry(&path);
        Self::with_registry(path, registry)
    }

    pub fn with_registry(path: PathBuf, registry: FeatureRegistry) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(registry));
        Self {
            path: Mutex::new(path),
            tx,
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<FeatureRegistry> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<FeatureRegistry>> {
        self.tx.subscribe()
    }

    /// Data file the next reload reads
    pub fn path(&self) -> PathBuf {
        self.path
            .lock()
            .map(|p| p.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    /// Re-read the data file on the blocking pool and publish the result.
    /// Returns the new snapshot.
    pub async fn reload(&self) -> Arc<FeatureRegistry> {
        let path = self.path();
        let registry = match tokio::task::spawn_blocking(move || load_registry(&path)).await {
            Ok(registry) => Arc::new(registry),
            Err(e) => {
                warn!("Registry reload task failed: {}", e);
                return self.snapshot();
            }
        };
        self.tx.send_replace(registry.clone());
        registry
    }

    /// Point at a different data file and reload from it.
    pub async fn reload_from(&self, path: PathBuf) -> Arc<FeatureRegistry> {
        match self.path.lock() {
            Ok(mut current) => *current = path,
            Err(e) => *e.into_inner() = path,
        }
        self.reload().await
    }
}
