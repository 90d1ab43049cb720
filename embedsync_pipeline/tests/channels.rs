mod common;

use common::{MockSource, MockStore, channel, config, fid};
use embedsync_pipeline::{ChannelSync, MemoryCheckpointStore, RunOutcome};
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_channel_sync_writes_every_user_and_clears_checkpoint() {
    let store = MockStore::with_users(12);
    let source = MockSource::new();
    source.set_channels(&fid(1), vec![channel("rust"), channel("base")]);
    source.set_channels(&fid(12), vec![channel("memes")]);
    let checkpoints = MemoryCheckpointStore::new();

    let report = ChannelSync::new(store.clone(), source.clone(), checkpoints.clone(), config(5))
        .run()
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(store.page_calls(), vec![(0, 5), (5, 5), (10, 5)]);
    assert_eq!(report.users, 12);
    assert_eq!(report.updated, 12);
    assert_eq!(report.failed, 0);
    assert_eq!(source.calls().len(), 12);

    let names: Vec<_> = store
        .channels_of(&fid(1))
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["rust", "base"]);
    // An empty answer still replaces the stored list.
    assert_eq!(store.channels_of(&fid(2)), Some(Vec::new()));
    assert!(checkpoints.snapshot().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_api_failure_skips_one_user_after_retries() {
    let store = MockStore::with_users(3);
    let source = MockSource::new();
    source.fail_for(&fid(2));
    let mut cfg = config(10);
    cfg.max_retries = 2;

    let report = ChannelSync::new(store.clone(), source.clone(), MemoryCheckpointStore::new(), cfg)
        .run()
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.updated, 2);
    assert_eq!(report.failed, 1);
    let attempts = source.calls().iter().filter(|k| **k == fid(2)).count();
    assert_eq!(attempts, 3);
    assert!(store.channels_of(&fid(2)).is_none());
    assert!(store.channels_of(&fid(3)).is_some());
}

#[tokio::test(start_paused = true)]
async fn test_rejected_channel_write_is_counted_not_halting() {
    let store = MockStore::with_users(4);
    store.fail_channel_writes_for(&fid(1));

    let report = ChannelSync::new(store.clone(), MockSource::new(), MemoryCheckpointStore::new(), config(2))
        .run()
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.updated, 3);
    assert_eq!(report.failed, 1);
}

#[tokio::test(start_paused = true)]
async fn test_failing_page_reads_halt_and_resume_from_saved_offset() {
    let store = MockStore::with_users(12);
    store.fail_page_reads(5, 3);
    let source = MockSource::new();
    let checkpoints = MemoryCheckpointStore::new();

    let first = ChannelSync::new(store.clone(), source.clone(), checkpoints.clone(), config(5))
        .run()
        .await
        .unwrap();
    assert_eq!(first.outcome, RunOutcome::Halted);
    assert_eq!(first.users, 5);
    assert_eq!(store.page_calls(), vec![(0, 5), (5, 5), (5, 5), (5, 5)]);
    assert_eq!(checkpoints.snapshot().await.unwrap().last_processed_offset, 5);

    let second = ChannelSync::new(store.clone(), source.clone(), checkpoints.clone(), config(5))
        .run()
        .await
        .unwrap();
    assert_eq!(second.outcome, RunOutcome::Completed);
    assert_eq!(second.users, 7);
    assert_eq!(source.calls().len(), 12);
}

#[tokio::test(start_paused = true)]
async fn test_each_user_waits_half_the_delay() {
    let store = MockStore::with_users(4);
    let mut cfg = config(10);
    cfg.delay_between_requests_ms = 100;
    let start = Instant::now();

    ChannelSync::new(store, MockSource::new(), MemoryCheckpointStore::new(), cfg)
        .run()
        .await
        .unwrap();

    // Four users at 50ms each; a short page adds no page delay.
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_millis(250));
}
