// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashSet;
use std::time::Duration;

use super::test_utils::{MockBackend, collect, fast_options};
use super::*;
use crate::error::{DriveError, OperationError};

fn trail(snapshots: &[Operation]) -> Vec<(Stage, u32, Status)> {
    snapshots
        .iter()
        .map(|op| (op.stage, op.progress, op.status))
        .collect()
}

fn paths(items: &[&str]) -> Vec<String> {
    items.iter().map(ToString::to_string).collect()
}

// --- Operation / IdGenerator ---

#[test]
fn test_ids_are_unique_and_increasing() {
    let ids = IdGenerator::new();
    let generated: Vec<OperationId> = (0..1000).map(|_| ids.next_id()).collect();
    assert!(generated.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(generated.iter().collect::<HashSet<_>>().len(), 1000);
}

#[test]
fn test_operation_ignores_backward_and_post_terminal_moves() {
    let mut op = Operation::new(OperationId::new(1));
    assert!(op.advance(Stage::Commit));
    assert!(!op.advance(Stage::Add));
    assert_eq!((op.stage, op.progress), (Stage::Commit, 66));

    assert!(op.succeed());
    assert_eq!(op.progress, 100);
    assert!(!op.fail("late"));
    assert!(!op.advance(Stage::Push));
    assert_eq!(op.status, Status::Success);
    assert!(op.data.is_empty());
}

#[test]
fn test_operation_serializes_lowercase() {
    let mut op = Operation::new(OperationId::new(42));
    op.advance(Stage::Push);
    op.fail("network unreachable");
    insta::assert_yaml_snapshot!(op, @r"
    id: 42
    stage: push
    progress: 69
    status: failed
    data: network unreachable
    ");
}

// --- Registry ---

#[tokio::test]
async fn test_registry_replays_history_then_closes() {
    let mut registry = OperationRegistry::new();
    let id = OperationId::new(7);
    registry.insert(id).unwrap();
    registry.advance(id, Stage::Add);

    let subscription = registry.subscribe(id).unwrap();
    registry.advance(id, Stage::Commit);
    registry.succeed(id);

    assert!(registry.is_empty());
    assert_eq!(
        trail(&subscription.collect().await),
        vec![
            (Stage::Queued, 0, Status::Pending),
            (Stage::Add, 33, Status::Pending),
            (Stage::Commit, 66, Status::Pending),
            (Stage::Commit, 100, Status::Success),
        ]
    );
}

#[test]
fn test_registry_rejects_duplicates_and_unknown_ids() {
    let mut registry = OperationRegistry::new();
    let id = OperationId::new(3);
    registry.insert(id).unwrap();
    assert!(matches!(registry.insert(id), Err(OperationError::Duplicate(d)) if d == id));

    let unknown = OperationId::new(4);
    assert!(matches!(registry.subscribe(unknown), Err(OperationError::NotFound(u)) if u == unknown));
    assert!(!registry.advance(unknown, Stage::Add));
    assert!(!registry.succeed(unknown));

    assert!(registry.fail(id, "boom"));
    assert!(matches!(registry.subscribe(id), Err(OperationError::NotFound(_))));
    assert!(!registry.fail(id, "again"));
}

#[tokio::test]
async fn test_registry_ignores_backward_transition() {
    let mut registry = OperationRegistry::new();
    let id = OperationId::new(9);
    registry.insert(id).unwrap();
    assert!(registry.advance(id, Stage::Commit));
    assert!(!registry.advance(id, Stage::Add));

    let subscription = registry.subscribe(id).unwrap();
    registry.succeed(id);
    assert_eq!(
        trail(&subscription.collect().await),
        vec![
            (Stage::Queued, 0, Status::Pending),
            (Stage::Commit, 66, Status::Pending),
            (Stage::Commit, 100, Status::Success),
        ]
    );
}

// --- Pipeline ---

#[tokio::test]
async fn test_successful_operation_sequence() {
    let backend = MockBackend::new();
    let pipeline = Pipeline::start(backend.clone(), &fast_options()).unwrap();
    let handle = pipeline.handle();

    let id = handle.submit("rm: a.txt", paths(&["a.txt"])).await.unwrap();
    let snapshots = collect(handle.listen(id).await.unwrap()).await;

    assert_eq!(
        trail(&snapshots),
        vec![
            (Stage::Queued, 0, Status::Pending),
            (Stage::Add, 33, Status::Pending),
            (Stage::Commit, 66, Status::Pending),
            (Stage::Push, 69, Status::Pending),
            (Stage::Push, 100, Status::Success),
        ]
    );
    assert!(snapshots.iter().all(|op| op.id == id));

    {
        let state = backend.state();
        assert_eq!(state.opens, 1);
        assert_eq!(state.staged, paths(&["a.txt"]));
        assert_eq!(state.commits, vec!["rm: a.txt".to_string()]);
        assert_eq!(state.pushes, 1);
    }

    // terminal operations are forgotten
    assert!(matches!(handle.listen(id).await, Err(OperationError::NotFound(_))));
    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_push_failure_fails_operation() {
    let backend = MockBackend::new();
    backend.state().push_error = Some("network unreachable".to_string());
    let pipeline = Pipeline::start(backend.clone(), &fast_options()).unwrap();
    let handle = pipeline.handle();

    let id = handle.submit("rm: a.txt", paths(&["a.txt"])).await.unwrap();
    let snapshots = collect(handle.listen(id).await.unwrap()).await;

    let last = snapshots.last().unwrap();
    assert_eq!(last.status, Status::Failed);
    assert_eq!(last.stage, Stage::Push);
    assert_eq!(last.data, "network unreachable");
    assert_eq!(
        snapshots.iter().filter(|op| op.is_terminal()).count(),
        1,
        "exactly one terminal snapshot"
    );
    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_stage_failure_never_pushes() {
    let backend = MockBackend::new();
    backend.state().stage_error = Some("pathspec did not match".to_string());
    let pipeline = Pipeline::start(backend.clone(), &fast_options()).unwrap();
    let handle = pipeline.handle();

    let (_, subscription) = handle.submit_and_listen("rm: x", paths(&["x"])).await.unwrap();
    let snapshots = collect(subscription).await;
    assert_eq!(
        trail(&snapshots),
        vec![
            (Stage::Queued, 0, Status::Pending),
            (Stage::Queued, 0, Status::Failed),
        ]
    );
    assert_eq!(snapshots[1].data, "pathspec did not match");

    // several push periods with an empty queue
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(backend.state().pushes, 0);
    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_commit_failure_never_pushes() {
    let backend = MockBackend::new();
    backend.state().commit_error = Some("nothing to commit".to_string());
    let pipeline = Pipeline::start(backend.clone(), &fast_options()).unwrap();
    let handle = pipeline.handle();

    let (_, subscription) = handle.submit_and_listen("rm: x", paths(&["x"])).await.unwrap();
    let snapshots = collect(subscription).await;
    assert_eq!(
        trail(&snapshots),
        vec![
            (Stage::Queued, 0, Status::Pending),
            (Stage::Add, 33, Status::Pending),
            (Stage::Add, 33, Status::Failed),
        ]
    );
    assert!(snapshots.iter().all(|op| op.stage != Stage::Push));

    pipeline.shutdown().await.unwrap();
    assert_eq!(backend.state().pushes, 0);
}

#[tokio::test]
async fn test_submissions_in_one_window_share_a_push() {
    let backend = MockBackend::new();
    let options = PipelineOptions::builder()
        .push_interval(Duration::from_millis(400))
        .build();
    let pipeline = Pipeline::start(backend.clone(), &options).unwrap();
    let handle = pipeline.handle();

    let first = handle.submit("rm: a", paths(&["a"])).await.unwrap();
    let second = handle.submit("rm: b", paths(&["b"])).await.unwrap();
    let first_sub = handle.listen(first).await.unwrap();
    let second_sub = handle.listen(second).await.unwrap();

    let (a, b) = tokio::join!(collect(first_sub), collect(second_sub));
    assert_eq!(a.last().map(|op| op.status), Some(Status::Success));
    assert_eq!(b.last().map(|op| op.status), Some(Status::Success));
    assert_eq!(backend.state().pushes, 1);
    assert_eq!(backend.state().commits.len(), 2);

    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_tolerated_push_message_is_success() {
    let backend = MockBackend::new();
    backend.state().push_error = Some("Everything up-to-date".to_string());
    let pipeline = Pipeline::start(backend.clone(), &fast_options()).unwrap();
    let handle = pipeline.handle();

    let id = handle.submit("rm: a", paths(&["a"])).await.unwrap();
    let snapshots = collect(handle.listen(id).await.unwrap()).await;
    let last = snapshots.last().unwrap();
    assert_eq!(last.status, Status::Success);
    assert!(last.data.is_empty());

    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_pull_errors_do_not_stop_the_loop() {
    let backend = MockBackend::new();
    backend.state().pull_error = Some("network unreachable".to_string());
    let pipeline = Pipeline::start(backend.clone(), &fast_options()).unwrap();
    let handle = pipeline.handle();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(backend.state().pulls >= 2, "idle pulls keep running");

    let id = handle.submit("rm: a", paths(&["a"])).await.unwrap();
    let snapshots = collect(handle.listen(id).await.unwrap()).await;
    assert_eq!(snapshots.last().map(|op| op.status), Some(Status::Success));

    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_listen_unknown_id_is_not_found() {
    let pipeline = Pipeline::start(MockBackend::new(), &fast_options()).unwrap();
    let handle = pipeline.handle();

    let unknown = OperationId::new(1);
    let err = handle.listen(unknown).await.unwrap_err();
    assert!(matches!(err, OperationError::NotFound(id) if id == unknown));

    pipeline.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_full_queue_evicts_oldest_operation() {
    let backend = MockBackend::new();
    let options = PipelineOptions::builder()
        .push_interval(Duration::from_secs(60))
        .queue_capacity(2)
        .build();
    let pipeline = Pipeline::start(backend.clone(), &options).unwrap();
    let handle = pipeline.handle();

    let first = handle.submit("rm: a", paths(&["a"])).await.unwrap();
    let first_sub = handle.listen(first).await.unwrap();
    let second = handle.submit("rm: b", paths(&["b"])).await.unwrap();
    let third = handle.submit("rm: c", paths(&["c"])).await.unwrap();
    let second_sub = handle.listen(second).await.unwrap();
    let third_sub = handle.listen(third).await.unwrap();

    let evicted = collect(first_sub).await;
    let last = evicted.last().unwrap();
    assert_eq!((last.stage, last.status), (Stage::Commit, Status::Failed));
    assert_eq!(last.data, EVICTED);

    // shutdown flushes the survivors
    pipeline.shutdown().await.unwrap();
    for sub in [second_sub, third_sub] {
        let snapshots = collect(sub).await;
        assert_eq!(snapshots.last().map(|op| op.status), Some(Status::Success));
    }
    assert_eq!(backend.state().pushes, 1);
}

#[tokio::test]
async fn test_shutdown_flushes_pending_commands() {
    let backend = MockBackend::new();
    let options = PipelineOptions::builder()
        .push_interval(Duration::from_secs(60))
        .build();
    let pipeline = Pipeline::start(backend.clone(), &options).unwrap();
    let handle = pipeline.handle();

    let id = handle.submit("rm: a", paths(&["a"])).await.unwrap();
    let subscription = handle.listen(id).await.unwrap();
    pipeline.shutdown().await.unwrap();

    let snapshots = collect(subscription).await;
    assert_eq!(snapshots.last().map(|op| op.status), Some(Status::Success));
    assert_eq!(backend.state().pushes, 1);

    assert!(!handle.is_running());
    assert!(matches!(
        handle.submit("rm: b", paths(&["b"])).await,
        Err(OperationError::PipelineClosed)
    ));
}

#[tokio::test]
async fn test_shutdown_processes_commands_accepted_during_pull() {
    let backend = MockBackend::new();
    backend.state().pull_delay = Some(Duration::from_millis(300));
    let options = PipelineOptions::builder()
        .push_interval(Duration::from_secs(60))
        .pull_interval(Duration::from_millis(1))
        .build();
    let pipeline = Pipeline::start(backend.clone(), &options).unwrap();
    let handle = pipeline.handle();

    // the dispatcher is now blocked inside a pull
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.submit("rm: a.txt", paths(&["a.txt"])).await.unwrap();
    handle.submit("rm: b.txt", paths(&["b.txt"])).await.unwrap();
    pipeline.shutdown().await.unwrap();

    {
        let state = backend.state();
        assert_eq!(state.staged, paths(&["a.txt", "b.txt"]));
        assert_eq!(state.commits, vec!["rm: a.txt".to_string(), "rm: b.txt".to_string()]);
        assert_eq!(state.pushes, 1);
    }
    assert!(matches!(
        handle.submit("rm: c.txt", paths(&["c.txt"])).await,
        Err(OperationError::PipelineClosed)
    ));
}

#[tokio::test]
async fn test_dropped_subscription_does_not_affect_others() {
    let backend = MockBackend::new();
    let pipeline = Pipeline::start(backend.clone(), &fast_options()).unwrap();
    let handle = pipeline.handle();

    let first = handle.submit("rm: a", paths(&["a"])).await.unwrap();
    drop(handle.listen(first).await.unwrap());
    let second = handle.submit("rm: b", paths(&["b"])).await.unwrap();

    let snapshots = collect(handle.listen(second).await.unwrap()).await;
    assert_eq!(snapshots.last().map(|op| op.status), Some(Status::Success));

    pipeline.shutdown().await.unwrap();
}

#[test]
fn test_start_fails_when_working_copy_cannot_open() {
    let backend = MockBackend::new();
    backend.state().open_error = Some("permission denied".to_string());
    let err = Pipeline::start(backend, &PipelineOptions::default()).unwrap_err();
    assert!(matches!(err, DriveError::Git(_)), "{err}");
}

#[test]
fn test_start_rejects_zero_capacity() {
    let options = PipelineOptions::builder().queue_capacity(0).build();
    let err = Pipeline::start(MockBackend::new(), &options).unwrap_err();
    assert!(matches!(err, DriveError::Queue(_)), "{err}");
}
