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
    clippy::missing_errors_doc
)]

//! sea-orm backed implementations of the record store and checkpoint slot.

mod checkpoint;
mod classify;
mod convert;
mod schema;
mod sql;

pub use checkpoint::DbCheckpointStore;
pub use classify::classify_db_err;
pub use schema::ensure_table;
pub use sql::SqlStore;
