#![allow(dead_code)]

use async_trait::async_trait;
use embedsync_core::{
    Cast, CastArchive, CastBundle, ChannelRef, ChannelStore, Checkpoint, CheckpointStore,
    EnrichedFields, EnrichmentUpdate, ProfileEnricher, SocialSource, StoreError, UserProfile,
    UserRecord, UserSeed, UserStore,
};
use embedsync_pipeline::{MemoryCheckpointStore, PipelineConfig};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn fid(n: usize) -> String {
    format!("u{n:03}")
}

pub fn config(page_size: u64) -> PipelineConfig {
    PipelineConfig {
        page_size,
        delay_between_requests_ms: 10,
        max_retries: 0,
        parallel_limit: 3,
        max_consecutive_errors: 3,
        progress_interval_secs: 5,
        reprocess_enriched: false,
    }
}

pub fn bundle_for(fid: &str) -> CastBundle {
    CastBundle::from_document(
        fid.to_string(),
        Some(&json!({
            "data": [
                { "hash": "0x1", "text": format!("gm from {fid}"), "author": { "username": fid, "follower_count": 10 } },
                { "hash": "0x2", "text": "shipping rust today" }
            ]
        })),
    )
}

#[derive(Default)]
struct StoreState {
    users: Vec<UserRecord>,
    casts: HashMap<String, CastBundle>,
    archive: Vec<CastBundle>,
    /// Remaining scripted failures for page reads, by offset
    page_failures: HashMap<u64, u32>,
    write_failures: HashSet<String>,
    count_fails: bool,
    page_calls: Vec<(u64, u64)>,
    cast_page_calls: Vec<(u64, u64)>,
    writes: Vec<EnrichmentUpdate>,
    seeds: Vec<UserSeed>,
    channels: HashMap<String, Vec<ChannelRef>>,
    channel_write_failures: HashSet<String>,
    cast_records: Vec<CastBundle>,
    cast_write_failures: HashSet<String>,
}

/// An in-memory record store. Clones share state.
#[derive(Clone, Default)]
pub struct MockStore {
    state: Arc<Mutex<StoreState>>,
}

impl MockStore {
    /// `n` users, all with cast data.
    pub fn with_users(n: usize) -> Self {
        let store = Self::default();
        {
            let mut state = store.state.lock().unwrap();
            for i in 1..=n {
                let key = fid(i);
                state.users.push(UserRecord {
                    fid: key.clone(),
                    user_name: format!("name{i}"),
                    follower_count: 100,
                    following_count: 50,
                    ..UserRecord::default()
                });
                state.casts.insert(key.clone(), bundle_for(&key));
            }
        }
        store
    }

    /// An archive of `n` cast records ordered by fid.
    pub fn with_archive(n: usize) -> Self {
        let store = Self::default();
        store.state.lock().unwrap().archive = (1..=n).map(|i| bundle_for(&fid(i))).collect();
        store
    }

    pub fn push_archive(&self, bundle: CastBundle) {
        let mut state = self.state.lock().unwrap();
        state.archive.push(bundle);
        state.archive.sort_by(|a, b| a.fid.cmp(&b.fid));
    }

    pub fn remove_casts(&self, key: &str) {
        self.state.lock().unwrap().casts.remove(key);
    }

    pub fn set_casts(&self, bundle: CastBundle) {
        self.state
            .lock()
            .unwrap()
            .casts
            .insert(bundle.fid.clone(), bundle);
    }

    pub fn mark_enriched(&self, key: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter_mut().find(|u| u.fid == key) {
            user.summary = Some("already-done".to_string());
            user.has_embedding = true;
        }
    }

    pub fn fail_page_reads(&self, offset: u64, times: u32) {
        self.state
            .lock()
            .unwrap()
            .page_failures
            .insert(offset, times);
    }

    pub fn fail_writes_for(&self, key: &str) {
        self.state
            .lock()
            .unwrap()
            .write_failures
            .insert(key.to_string());
    }

    pub fn fail_channel_writes_for(&self, key: &str) {
        self.state
            .lock()
            .unwrap()
            .channel_write_failures
            .insert(key.to_string());
    }

    pub fn fail_cast_writes_for(&self, key: &str) {
        self.state
            .lock()
            .unwrap()
            .cast_write_failures
            .insert(key.to_string());
    }

    pub fn channels_of(&self, key: &str) -> Option<Vec<ChannelRef>> {
        self.state.lock().unwrap().channels.get(key).cloned()
    }

    pub fn cast_records(&self) -> Vec<CastBundle> {
        self.state.lock().unwrap().cast_records.clone()
    }

    pub fn fail_count(&self) {
        self.state.lock().unwrap().count_fails = true;
    }

    pub fn page_calls(&self) -> Vec<(u64, u64)> {
        self.state.lock().unwrap().page_calls.clone()
    }

    pub fn cast_page_calls(&self) -> Vec<(u64, u64)> {
        self.state.lock().unwrap().cast_page_calls.clone()
    }

    pub fn written_fids(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .writes
            .iter()
            .map(|w| w.fid.clone())
            .collect()
    }

    pub fn seeds(&self) -> Vec<UserSeed> {
        self.state.lock().unwrap().seeds.clone()
    }

    fn take_scripted_failure(failures: &mut HashMap<u64, u32>, offset: u64) -> bool {
        match failures.get_mut(&offset) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

fn slice_page<T: Clone>(rows: &[T], offset: u64, limit: u64) -> Vec<T> {
    rows.iter()
        .skip(usize::try_from(offset).unwrap())
        .take(usize::try_from(limit).unwrap())
        .cloned()
        .collect()
}

#[async_trait]
impl UserStore for MockStore {
    async fn count_users(&self) -> Result<u64, StoreError> {
        let state = self.state.lock().unwrap();
        if state.count_fails {
            return Err(StoreError::Rejected("count not permitted".into()));
        }
        Ok(state.users.len() as u64)
    }

    async fn fetch_users(&self, offset: u64, limit: u64) -> Result<Vec<UserRecord>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.page_calls.push((offset, limit));
        if Self::take_scripted_failure(&mut state.page_failures, offset) {
            return Err(StoreError::Timeout("canceling statement due to statement timeout".into()));
        }
        Ok(slice_page(&state.users, offset, limit))
    }

    async fn fetch_casts(&self, fids: &[String]) -> Result<Vec<CastBundle>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(fids
            .iter()
            .filter_map(|f| state.casts.get(f).cloned())
            .collect())
    }

    async fn write_enrichments(&self, updates: &[EnrichmentUpdate]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(bad) = updates.iter().find(|u| state.write_failures.contains(&u.fid)) {
            return Err(StoreError::Rejected(format!("update refused for {}", bad.fid)));
        }
        state.writes.extend(updates.iter().cloned());
        Ok(())
    }
}

#[async_trait]
impl CastArchive for MockStore {
    async fn fetch_cast_page(&self, offset: u64, limit: u64) -> Result<Vec<CastBundle>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.cast_page_calls.push((offset, limit));
        if Self::take_scripted_failure(&mut state.page_failures, offset) {
            return Err(StoreError::Busy("database is locked".into()));
        }
        Ok(slice_page(&state.archive, offset, limit))
    }

    async fn upsert_users(&self, users: &[UserSeed]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        for seed in users {
            state.seeds.retain(|s| s.fid != seed.fid);
            state.seeds.push(seed.clone());
        }
        Ok(())
    }

    async fn upsert_casts(&self, records: &[CastBundle]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(bad) = records
            .iter()
            .find(|r| state.cast_write_failures.contains(&r.fid))
        {
            return Err(StoreError::Rejected(format!("casts refused for {}", bad.fid)));
        }
        for record in records {
            state.cast_records.retain(|r| r.fid != record.fid);
            state.cast_records.push(record.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelStore for MockStore {
    async fn fetch_fids(&self, offset: u64, limit: u64) -> Result<Vec<String>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.page_calls.push((offset, limit));
        if Self::take_scripted_failure(&mut state.page_failures, offset) {
            return Err(StoreError::Timeout("canceling statement due to statement timeout".into()));
        }
        let fids: Vec<String> = state.users.iter().map(|u| u.fid.clone()).collect();
        Ok(slice_page(&fids, offset, limit))
    }

    async fn write_channels(&self, fid: &str, channels: &[ChannelRef]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.channel_write_failures.contains(fid) {
            return Err(StoreError::Rejected(format!("update refused for {fid}")));
        }
        state.channels.insert(fid.to_string(), channels.to_vec());
        Ok(())
    }
}

pub fn channel(name: &str) -> ChannelRef {
    ChannelRef {
        name: name.to_string(),
        description: format!("all about {name}"),
        ..ChannelRef::default()
    }
}

pub fn cast(text: &str, parent_hash: Option<&str>) -> Cast {
    Cast {
        hash: format!("0x{}", text.len()),
        text: text.to_string(),
        parent_hash: parent_hash.map(ToString::to_string),
        ..Cast::default()
    }
}

#[derive(Default)]
struct SourceState {
    channels: HashMap<String, Vec<ChannelRef>>,
    casts: HashMap<String, Vec<Cast>>,
    power_users: Option<Vec<String>>,
    failing: HashSet<String>,
    calls: Vec<String>,
}

/// A scripted social graph API. Unknown fids have no channels and no casts.
#[derive(Clone, Default)]
pub struct MockSource {
    state: Arc<Mutex<SourceState>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_channels(&self, key: &str, channels: Vec<ChannelRef>) {
        self.state
            .lock()
            .unwrap()
            .channels
            .insert(key.to_string(), channels);
    }

    pub fn set_casts(&self, key: &str, casts: Vec<Cast>) {
        self.state
            .lock()
            .unwrap()
            .casts
            .insert(key.to_string(), casts);
    }

    pub fn set_power_users(&self, keys: &[&str]) {
        self.state.lock().unwrap().power_users =
            Some(keys.iter().map(ToString::to_string).collect());
    }

    /// Every lookup for `key` fails.
    pub fn fail_for(&self, key: &str) {
        self.state.lock().unwrap().failing.insert(key.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn lookup(&self, key: &str) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(key.to_string());
        if state.failing.contains(key) {
            anyhow::bail!("HTTP status server error (502 Bad Gateway) for fid {key}");
        }
        Ok(())
    }
}

#[async_trait]
impl SocialSource for MockSource {
    async fn user_channels(&self, fid: &str) -> anyhow::Result<Vec<ChannelRef>> {
        self.lookup(fid)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .channels
            .get(fid)
            .cloned()
            .unwrap_or_default())
    }

    async fn power_user_fids(&self) -> anyhow::Result<Vec<String>> {
        self.state
            .lock()
            .unwrap()
            .power_users
            .clone()
            .ok_or_else(|| anyhow::anyhow!("HTTP status client error (401 Unauthorized)"))
    }

    async fn user_casts(&self, fid: &str) -> anyhow::Result<Vec<Cast>> {
        self.lookup(fid)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .casts
            .get(fid)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct EnricherState {
    calls: Vec<String>,
    failing: HashSet<String>,
}

/// Deterministic enricher that records every call. Clones share state.
#[derive(Clone, Default)]
pub struct MockEnricher {
    state: Arc<Mutex<EnricherState>>,
    latency: Duration,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl MockEnricher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each call sleeps for `latency`, so overlapping calls can be observed.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn fail_for(&self, key: &str) {
        self.state.lock().unwrap().failing.insert(key.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileEnricher for MockEnricher {
    async fn enrich(&self, profile: &UserProfile) -> anyhow::Result<EnrichedFields> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let fails = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(profile.fid.clone());
            state.failing.contains(&profile.fid)
        };
        if fails {
            anyhow::bail!("model refused profile {}", profile.fid);
        }
        Ok(EnrichedFields {
            summary: format!("summary-of-{}", profile.fid),
            embedding: vec![0.1, 0.2, 0.3],
        })
    }
}

/// Wraps a memory slot and fails a scripted number of saves, or every load.
#[derive(Clone, Default)]
pub struct FlakyCheckpoints {
    pub inner: MemoryCheckpointStore,
    failing_saves: Arc<Mutex<u32>>,
    broken_load: bool,
}

impl FlakyCheckpoints {
    pub fn failing_saves(times: u32) -> Self {
        Self {
            failing_saves: Arc::new(Mutex::new(times)),
            ..Self::default()
        }
    }

    pub fn unreadable() -> Self {
        Self {
            broken_load: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl CheckpointStore for FlakyCheckpoints {
    async fn load(&self) -> anyhow::Result<Option<Checkpoint>> {
        if self.broken_load {
            anyhow::bail!("checkpoint document is corrupt");
        }
        self.inner.load().await
    }

    async fn save(&self, checkpoint: &Checkpoint) -> anyhow::Result<()> {
        {
            let mut remaining = self.failing_saves.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                anyhow::bail!("disk full");
            }
        }
        self.inner.save(checkpoint).await
    }

    async fn clear(&self) -> anyhow::Result<()> {
        self.inner.clear().await
    }
}
