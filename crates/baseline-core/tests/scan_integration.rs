//! Integration tests for workspace TODO scanning.
//!
//! Every test builds its own workspace in a temp directory.

use std::fs;
use std::path::{Path, PathBuf};

use baseline_core::{ScanError, ScanOptions, ScanStatus, TodoEntry, TodoScanner};
use indoc::indoc;
use tokio_util::sync::CancellationToken;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn scanner(extensions: &[&str]) -> TodoScanner {
    TodoScanner::new(ScanOptions {
        extensions: extensions.iter().map(|e| e.to_string()).collect(),
        ..Default::default()
    })
    .expect("valid scanner options")
}

async fn scan(scanner: &TodoScanner, roots: &[PathBuf]) -> Vec<TodoEntry> {
    let mut out = Vec::new();
    let status = scanner
        .scan(roots, &mut out, &CancellationToken::new())
        .await
        .expect("scan succeeds");
    assert_eq!(status, ScanStatus::Complete);
    out
}

const A_JS: &str = indoc! {"
    import { x } from './x.js';

    export function layout() {
      // nothing to see here
      // TODO(baseline/grid) fix this
    }
"};

#[tokio::test]
async fn test_only_allowed_extensions_are_scanned() {
    let temp = tempfile::tempdir().unwrap();
    write(temp.path(), "a.js", A_JS);
    write(temp.path(), "b.css", "/* TODO(baseline/grid) fix this too */\n");

    let entries = scan(&scanner(&["js"]), &[temp.path().to_path_buf()]).await;

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].feature_id, "grid");
    assert_eq!(entries[0].file_name, "a.js");
    assert_eq!(entries[0].line_number, 5);
    assert_eq!(entries[0].file_path, temp.path().join("a.js"));
}

#[tokio::test]
async fn test_ignore_file_excludes_directories() {
    let temp = tempfile::tempdir().unwrap();
    write(temp.path(), ".gitignore", "dist\n");
    write(temp.path(), "dist/bundle.js", "// TODO(baseline/grid) generated\n");
    write(temp.path(), "src/app.js", "// TODO(baseline/dialog) real\n");

    let entries = scan(&scanner(&[".js"]), &[temp.path().to_path_buf()]).await;

    let ids: Vec<_> = entries.iter().map(|e| e.feature_id.as_str()).collect();
    assert_eq!(ids, vec!["dialog"]);
}

#[tokio::test]
async fn test_custom_ignore_file_name() {
    let temp = tempfile::tempdir().unwrap();
    write(temp.path(), ".baselineignore", "vendor\n");
    write(temp.path(), ".gitignore", "src\n");
    write(temp.path(), "vendor/lib.js", "// TODO(baseline/grid)\n");
    write(temp.path(), "src/app.js", "// TODO(baseline/dialog)\n");

    let scanner = TodoScanner::new(ScanOptions {
        extensions: vec!["js".into()],
        ignore_file: ".baselineignore".into(),
    })
    .unwrap();
    let entries = scan(&scanner, &[temp.path().to_path_buf()]).await;

    let ids: Vec<_> = entries.iter().map(|e| e.feature_id.as_str()).collect();
    assert_eq!(ids, vec!["dialog"]);
}

#[tokio::test]
async fn test_missing_ignore_file_excludes_nothing() {
    let temp = tempfile::tempdir().unwrap();
    write(temp.path(), "dist/bundle.js", "// TODO(baseline/grid)\n");

    let entries = scan(&scanner(&["js"]), &[temp.path().to_path_buf()]).await;
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn test_order_is_root_then_file_then_line() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    write(second.path(), "a.ts", "// TODO(baseline/s-a)\n");
    write(
        first.path(),
        "b.js",
        "// TODO(baseline/f-b1)\n\n// TODO(baseline/f-b2)\n",
    );
    write(first.path(), "a.js", "// TODO(baseline/f-a)\n");
    write(first.path(), "sub/c.js", "// TODO(baseline/f-c)\n");

    let entries = scan(
        &scanner(&["js", "ts"]),
        &[first.path().to_path_buf(), second.path().to_path_buf()],
    )
    .await;

    let ids: Vec<_> = entries.iter().map(|e| e.feature_id.as_str()).collect();
    assert_eq!(ids, vec!["f-a", "f-b1", "f-b2", "f-c", "s-a"]);
    assert_eq!(entries[2].line_number, 3);
}

#[tokio::test]
async fn test_unreadable_file_is_skipped() {
    let temp = tempfile::tempdir().unwrap();
    // Not valid UTF-8, so reading it as a string fails
    fs::write(temp.path().join("a.js"), [0xff, 0xfe, 0x00, 0x41]).unwrap();
    write(temp.path(), "b.js", "// TODO(baseline/grid)\n");

    let entries = scan(&scanner(&["js"]), &[temp.path().to_path_buf()]).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].file_name, "b.js");
}

#[tokio::test]
async fn test_missing_root_yields_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let entries = scan(&scanner(&["js"]), &[temp.path().join("does-not-exist")]).await;
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_cancelled_scan_stops_without_error() {
    let temp = tempfile::tempdir().unwrap();
    write(temp.path(), "a.js", "// TODO(baseline/grid)\n");

    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut out = Vec::new();
    let status = scanner(&["js"])
        .scan(&[temp.path().to_path_buf()], &mut out, &cancel)
        .await
        .unwrap();

    assert_eq!(status, ScanStatus::Cancelled);
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_cancel_while_reading_abandons_remaining_files() {
    let temp = tempfile::tempdir().unwrap();
    let files = 200;
    for i in 0..files {
        write(
            temp.path(),
            &format!("src/file-{:04}.js", i),
            "// TODO(baseline/grid)\n",
        );
    }

    let scanner = scanner(&["js"]);
    let roots = [temp.path().to_path_buf()];
    let cancel = CancellationToken::new();
    let mut out = Vec::new();

    let status = {
        let mut scan = Box::pin(scanner.scan(&roots, &mut out, &cancel));
        // The first poll gets past the root check and parks on file I/O
        assert!(futures_util::poll!(scan.as_mut()).is_pending());
        cancel.cancel();
        scan.await
    };

    assert_eq!(status.unwrap(), ScanStatus::Cancelled);
    assert!(out.len() < files);
}

#[tokio::test]
async fn test_scan_appends_after_existing_entries() {
    let temp = tempfile::tempdir().unwrap();
    write(temp.path(), "a.js", "// TODO(baseline/grid)\n");

    let earlier = TodoEntry {
        feature_id: "dialog".into(),
        file_name: "old.js".into(),
        file_path: PathBuf::from("/elsewhere/old.js"),
        line_number: 1,
    };
    let mut out = vec![earlier.clone()];
    let status = scanner(&["js"])
        .scan(&[temp.path().to_path_buf()], &mut out, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(status, ScanStatus::Complete);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0], earlier);
    assert_eq!(out[1].feature_id, "grid");
}

#[test]
fn test_empty_allow_list_never_touches_disk() {
    let err = TodoScanner::new(ScanOptions::default()).unwrap_err();
    assert!(matches!(err, ScanError::Configuration));
    assert!(err.to_string().contains("extensions"));
}
