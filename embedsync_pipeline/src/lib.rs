#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss
)]

//! Resumable, checkpointed batch enrichment.
//!
//! The [`Orchestrator`] pages through the user store, joins each page with
//! its cast records, enriches eligible users in bounded-parallel windows,
//! and persists a [`Checkpoint`](embedsync_core::Checkpoint) after every
//! page so an interrupted run resumes where it stopped.
//!
//! The maintenance jobs that fill the tables it reads ([`Backfill`],
//! [`ChannelSync`], [`CastIngest`]) share the same retry and halt policy.

pub mod adapter;
pub mod backfill;
pub mod backoff;
pub mod channels;
pub mod checkpoint;
pub mod config;
pub mod fetcher;
pub mod ingest;
pub mod orchestrator;
pub mod paging;
pub mod progress;

pub use adapter::{EnrichResult, EnrichStatus, EnrichmentAdapter};
pub use backfill::{Backfill, BackfillReport};
pub use backoff::{backoff_delay, pause};
pub use channels::{ChannelSync, ChannelSyncReport};
pub use checkpoint::{FileCheckpointStore, MemoryCheckpointStore};
pub use config::PipelineConfig;
pub use fetcher::{RetryPolicy, Retryable, RetryingFetcher};
pub use ingest::{CastIngest, IngestReport, keep_cast};
pub use orchestrator::{Orchestrator, RunOutcome, RunReport};
pub use paging::{PageCount, PagedRun, drive_pages, pause_after_failure};
pub use progress::{ProcessingStats, ProgressTracker};
