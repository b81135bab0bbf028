// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{follow, format_entry};
use crate::drive::DirEntry;
use crate::pipeline::test_utils::{MockBackend, fast_options};
use crate::pipeline::Pipeline;

#[test]
fn test_format_entry() {
    let file = DirEntry {
        name: "report.pdf".to_string(),
        is_dir: false,
        size_mb: 1.5,
    };
    let dir = DirEntry {
        name: "docs".to_string(),
        is_dir: true,
        size_mb: 0.0,
    };
    insta::assert_snapshot!(
        [format_entry(&file), format_entry(&dir)].join("\n"),
        @r"
    file       1.50 MB  report.pdf
    dir        0.00 MB  docs
    "
    );
}

#[tokio::test]
async fn test_follow_reports_success() {
    let pipeline = Pipeline::start(MockBackend::new(), &fast_options()).unwrap();
    let (_, subscription) = pipeline
        .handle()
        .submit_and_listen("rm: a.txt", vec!["a.txt".to_string()])
        .await
        .unwrap();

    follow(subscription).await.unwrap();
    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_follow_reports_failure_reason() {
    let backend = MockBackend::new();
    backend.state().push_error = Some("remote rejected".to_string());
    let pipeline = Pipeline::start(backend, &fast_options()).unwrap();
    let (id, subscription) = pipeline
        .handle()
        .submit_and_listen("rm: a.txt", vec!["a.txt".to_string()])
        .await
        .unwrap();

    let err = follow(subscription).await.unwrap_err();
    assert!(err.to_string().starts_with(&format!("operation {id} failed: ")), "{err}");
    assert!(err.to_string().contains("remote rejected"), "{err}");
    pipeline.shutdown().await.unwrap();
}
