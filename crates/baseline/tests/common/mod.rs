//! Common test utilities.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

/// Get the path to the test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

pub fn baseline_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_baseline"))
}

/// Write a file, creating parent directories.
pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().expect("file has a parent"))
        .expect("Failed to create parent dir");
    std::fs::write(path, content).expect("Failed to write file");
}

/// Create a temporary web project with feature data installed where npm
/// would put it.
pub fn create_temp_project() -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("Failed to create temp dir");

    write(temp.path(), "package.json", "{ \"name\": \"fixture\" }\n");
    std::fs::create_dir_all(temp.path().join("node_modules/web-features"))
        .expect("Failed to create node_modules");
    std::fs::copy(
        fixtures_dir().join("data.json"),
        temp.path().join("node_modules/web-features/data.json"),
    )
    .expect("Failed to copy data.json");

    temp
}
