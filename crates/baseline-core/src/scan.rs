//! Workspace scanning for `TODO(baseline/<id>)` markers

use crate::matcher::find_todo_marker;
use crate::report::TodoEntry;
use futures_util::StreamExt;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Ignore file read from the top of every root by default
pub const DEFAULT_IGNORE_FILE: &str = ".gitignore";

/// How many file reads may be in flight at once
const READ_CONCURRENCY: usize = 8;

/// Errors that abort a scan
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(
        "no file extensions are configured for TODO scanning; add at least one entry to `extensions`"
    )]
    Configuration,

    #[error("file enumeration task failed")]
    Enumerate(#[from] tokio::task::JoinError),
}

/// Whether a scan ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Complete,
    /// The token was cancelled; entries gathered so far are left in the buffer
    Cancelled,
}

/// Scanner configuration
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Extensions to visit, with or without a leading dot
    pub extensions: Vec<String>,
    /// File at the top of each root listing excluded patterns
    pub ignore_file: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: Vec::new(),
            ignore_file: DEFAULT_IGNORE_FILE.to_string(),
        }
    }
}

/// Normalize an extension allow-list: trim, strip leading dots, lowercase,
/// drop empties and duplicates.
pub fn normalize_extensions(raw: &[impl AsRef<str>]) -> Vec<String> {
    let mut extensions: Vec<String> = Vec::new();
    for ext in raw {
        let ext = ext.as_ref().trim().trim_start_matches('.').to_lowercase();
        if !ext.is_empty() && !extensions.contains(&ext) {
            extensions.push(ext);
        }
    }
    extensions
}

/// Extract every TODO marker from a file's contents
pub fn extract_todos(path: &Path, content: &str) -> Vec<TodoEntry> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            find_todo_marker(line).map(|id| TodoEntry {
                feature_id: id.to_string(),
                file_name: file_name.clone(),
                file_path: path.to_path_buf(),
                line_number: idx + 1,
            })
        })
        .collect()
}

/// Walks workspace roots looking for TODO markers
#[derive(Debug, Clone)]
pub struct TodoScanner {
    extensions: Vec<String>,
    ignore_file: String,
}

impl TodoScanner {
    /// Fails with [`ScanError::Configuration`] when the allow-list is empty
    /// after normalization.
    pub fn new(options: ScanOptions) -> Result<Self, ScanError> {
        let extensions = normalize_extensions(&options.extensions);
        if extensions.is_empty() {
            return Err(ScanError::Configuration);
        }
        Ok(Self {
            extensions,
            ignore_file: options.ignore_file,
        })
    }

    /// Scan `roots` in order, appending entries to `out`.
    ///
    /// Entries are ordered by root, then file, then line, regardless of the
    /// order in which reads complete. Unreadable files are skipped. The token
    /// is checked between file reads.
    pub async fn scan(
        &self,
        roots: &[PathBuf],
        out: &mut Vec<TodoEntry>,
        cancel: &CancellationToken,
    ) -> Result<ScanStatus, ScanError> {
        let already_buffered = out.len();
        for root in roots {
            if cancel.is_cancelled() {
                return Ok(ScanStatus::Cancelled);
            }

            let excludes = load_exclude_set(&root.join(&self.ignore_file)).await;
            let files = {
                let root = root.clone();
                let extensions = self.extensions.clone();
                tokio::task::spawn_blocking(move || enumerate_files(&root, &extensions, excludes))
                    .await?
            };
            debug!("{} candidate files under {}", files.len(), root.display());

            let reads = futures_util::stream::iter(files)
                .map(|path| async move {
                    let content = tokio::fs::read_to_string(&path).await;
                    (path, content)
                })
                .buffered(READ_CONCURRENCY);
            let mut reads = std::pin::pin!(reads);

            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Ok(ScanStatus::Cancelled),
                    next = reads.next() => next,
                };
                let Some((path, content)) = next else {
                    break;
                };

                if !has_allowed_extension(&path, &self.extensions) {
                    continue;
                }
                match content {
                    Ok(content) => out.extend(extract_todos(&path, &content)),
                    Err(e) => debug!("Skipping unreadable {}: {}", path.display(), e),
                }
            }
        }

        info!("TODO scan found {} entries", out.len() - already_buffered);
        Ok(ScanStatus::Complete)
    }
}

fn has_allowed_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
}

/// Read the ignore file; a missing or unreadable file means no exclusions.
async fn load_exclude_set(ignore_path: &Path) -> Option<GlobSet> {
    match tokio::fs::read_to_string(ignore_path).await {
        Ok(content) => build_exclude_set(&content),
        Err(e) => {
            debug!("No ignore patterns from {}: {}", ignore_path.display(), e);
            None
        }
    }
}

/// One pattern per non-empty line. Pattern `p` excludes `p` itself and
/// everything below it, relative to the root.
fn build_exclude_set(content: &str) -> Option<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let mut count = 0;

    for line in content.lines() {
        let pattern = line.trim();
        if pattern.is_empty() || pattern.starts_with('#') {
            continue;
        }
        let pattern = pattern.trim_start_matches('/').trim_end_matches('/');
        if pattern.is_empty() {
            continue;
        }

        for glob in [pattern.to_string(), format!("{}/**", pattern)] {
            match Glob::new(&glob) {
                Ok(g) => {
                    builder.add(g);
                    count += 1;
                }
                Err(e) => debug!("Ignoring invalid pattern {:?}: {}", glob, e),
            }
        }
    }

    if count == 0 {
        return None;
    }
    builder.build().ok()
}

fn is_excluded(path: &Path, root: &Path, excludes: &GlobSet) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    !relative.as_os_str().is_empty() && excludes.is_match(relative)
}

/// List files under `root` with an allowed extension, skipping excluded
/// paths. Excluded directories are not descended into.
fn enumerate_files(root: &Path, extensions: &[String], excludes: Option<GlobSet>) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .follow_links(true)
        .sort_by_file_name(|a, b| a.cmp(b));

    if let Some(excludes) = excludes {
        let root = root.to_path_buf();
        builder.filter_entry(move |entry| !is_excluded(entry.path(), &root, &excludes));
    }

    builder
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .filter(|entry| has_allowed_extension(entry.path(), extensions))
        .map(|entry| entry.into_path())
        .collect()
}
