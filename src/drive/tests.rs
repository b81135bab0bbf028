// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs;

use tempfile::TempDir;

use super::events::{CLOSE_FRAME, frame, relay};
use super::{DirEntry, Drive, normalize};
use crate::error::{DriveError, FsError};
use crate::pipeline::test_utils::{MockBackend, collect, fast_options};
use crate::pipeline::{Operation, OperationId, Pipeline, Stage, Status};

fn setup() -> (TempDir, MockBackend, Pipeline, Drive) {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    let root = temp.path();
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::create_dir_all(root.join("docs/nested")).unwrap();
    fs::write(root.join("a.txt"), vec![0_u8; 524_288]).unwrap();
    fs::write(root.join("docs/b.txt"), "b").unwrap();
    fs::write(root.join("docs/nested/c.txt"), "c").unwrap();

    let backend = MockBackend::new();
    let pipeline = Pipeline::start(backend.clone(), &fast_options()).unwrap();
    let drive = Drive::new(root, pipeline.handle());
    (temp, backend, pipeline, drive)
}

fn fs_error(err: &DriveError) -> &FsError {
    err.as_fs()
        .unwrap_or_else(|| panic!("expected a filesystem error, got {err}"))
}

#[test]
fn test_normalize() {
    let cases = [
        ("/", ""),
        ("", ""),
        ("/a.txt", "a.txt"),
        ("docs//nested/./c.txt", "docs/nested/c.txt"),
        ("docs/", "docs"),
    ];
    for (input, expected) in cases {
        assert_eq!(normalize(input).unwrap(), expected, "input: {input:?}");
    }

    for rejected in ["../etc/passwd", "docs/../../x", "/.git", "docs/.git/config"] {
        assert!(
            matches!(normalize(rejected), Err(FsError::InvalidPath { .. })),
            "{rejected:?} should be rejected"
        );
    }
}

#[tokio::test]
async fn test_read_dir_lists_sorted_without_metadata() {
    let (_temp, _backend, pipeline, drive) = setup();

    let entries = drive.read_dir("/").await.unwrap();
    assert_eq!(
        entries,
        vec![
            DirEntry {
                name: "a.txt".to_string(),
                is_dir: false,
                size_mb: 0.5,
            },
            DirEntry {
                name: "docs".to_string(),
                is_dir: true,
                size_mb: entries[1].size_mb,
            },
        ]
    );

    let nested = drive.read_dir("docs").await.unwrap();
    let names: Vec<_> = nested.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["b.txt", "nested"]);

    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_read_dir_errors() {
    let (_temp, _backend, pipeline, drive) = setup();

    let err = drive.read_dir("/missing").await.unwrap_err();
    assert!(matches!(fs_error(&err), FsError::NotFound(p) if p == "/missing"));

    let err = drive.read_dir("a.txt").await.unwrap_err();
    assert!(matches!(fs_error(&err), FsError::InvalidPath { .. }));

    let err = drive.read_dir("..").await.unwrap_err();
    assert!(matches!(fs_error(&err), FsError::InvalidPath { .. }));

    pipeline.shutdown().await.unwrap();
}

#[test]
fn test_dir_entry_json_field_names() {
    let entry = DirEntry {
        name: "a.txt".to_string(),
        is_dir: false,
        size_mb: 0.5,
    };
    insta::assert_snapshot!(
        serde_json::to_string(&entry).unwrap(),
        @r#"{"name":"a.txt","isDir":false,"size":0.5}"#
    );
}

#[tokio::test]
async fn test_remove_file_submits_and_succeeds() {
    let (temp, backend, pipeline, drive) = setup();

    let id = drive.remove("/a.txt").await.unwrap();
    assert!(!temp.path().join("a.txt").exists());

    let snapshots = collect(drive.listen(id).await.unwrap()).await;
    let trail: Vec<_> = snapshots.iter().map(|op| (op.stage, op.progress)).collect();
    assert_eq!(
        trail,
        vec![
            (Stage::Queued, 0),
            (Stage::Add, 33),
            (Stage::Commit, 66),
            (Stage::Push, 69),
            (Stage::Push, 100),
        ]
    );
    assert_eq!(snapshots.last().map(|op| op.status), Some(Status::Success));

    {
        let state = backend.state();
        assert_eq!(state.staged, vec!["a.txt".to_string()]);
        assert_eq!(state.commits, vec!["rm: a.txt".to_string()]);
    }
    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_remove_directory_recursively() {
    let (temp, backend, pipeline, drive) = setup();

    let (_, subscription) = drive.remove_and_listen("docs/").await.unwrap();
    assert!(!temp.path().join("docs").exists());

    let snapshots = collect(subscription).await;
    assert_eq!(snapshots.last().map(|op| op.status), Some(Status::Success));
    assert_eq!(backend.state().commits, vec!["rm: docs".to_string()]);

    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_remove_rejections_submit_nothing() {
    let (temp, backend, pipeline, drive) = setup();

    let err = drive.remove("/missing.txt").await.unwrap_err();
    assert!(matches!(fs_error(&err), FsError::NotFound(_)));

    for path in ["/", "", "/.git", "../a.txt"] {
        let err = drive.remove(path).await.unwrap_err();
        assert!(
            matches!(fs_error(&err), FsError::InvalidPath { .. }),
            "{path:?}: {err}"
        );
    }

    assert!(temp.path().join(".git").exists());
    assert!(backend.state().commits.is_empty());
    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_remove_and_listen_sees_stage_failure() {
    let (_temp, backend, pipeline, drive) = setup();
    backend.state().stage_error = Some("index.lock exists".to_string());

    let (_, subscription) = drive.remove_and_listen("a.txt").await.unwrap();
    let snapshots = collect(subscription).await;
    let last = snapshots.last().unwrap();
    assert_eq!(last.status, Status::Failed);
    assert_eq!(last.data, "index.lock exists");

    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_listen_unknown_operation() {
    let (_temp, _backend, pipeline, drive) = setup();
    let err = drive.listen(OperationId::new(5)).await.unwrap_err();
    assert!(err.as_operation().is_some(), "{err}");
    pipeline.shutdown().await.unwrap();
}

// --- events ---

#[test]
fn test_frames() {
    let mut op = Operation::new(OperationId::new(42));
    op.advance(Stage::Add);
    assert_eq!(
        frame(&op),
        "data: {\"id\":42,\"stage\":\"add\",\"progress\":33,\"status\":\"pending\",\"data\":\"\"}\n\n"
    );

    op.fail("network unreachable");
    assert_eq!(
        frame(&op),
        "event: error\ndata: {\"id\":42,\"stage\":\"add\",\"progress\":33,\"status\":\"failed\",\"data\":\"network unreachable\"}\n\n"
    );

    assert_eq!(CLOSE_FRAME, "event: close\ndata: close\n\n");
}

#[tokio::test]
async fn test_relay_streams_until_close() {
    let (_temp, _backend, pipeline, drive) = setup();

    let (_, subscription) = drive.remove_and_listen("a.txt").await.unwrap();
    let mut out = Vec::new();
    tokio::time::timeout(std::time::Duration::from_secs(10), relay(subscription, &mut out))
        .await
        .expect("relay did not finish")
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    let frames: Vec<_> = text.split_terminator("\n\n").collect();
    assert_eq!(frames.len(), 6, "{text}");
    assert!(frames[0].contains(r#""stage":"queued""#));
    assert!(frames[4].contains(r#""status":"success""#));
    assert_eq!(frames[5], "event: close\ndata: close");

    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_relay_writer_failure_does_not_affect_operation() {
    let (_temp, _backend, pipeline, drive) = setup();

    let (id, subscription) = drive.remove_and_listen("a.txt").await.unwrap();
    let watcher = drive.listen(id).await.unwrap();

    let (mut writer, reader) = tokio::io::duplex(64);
    drop(reader);
    assert!(relay(subscription, &mut writer).await.is_err());

    let snapshots = collect(watcher).await;
    assert_eq!(snapshots.last().map(|op| op.status), Some(Status::Success));

    pipeline.shutdown().await.unwrap();
}
