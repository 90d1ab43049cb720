//! sea-orm entities for the tables the pipeline reads and writes.

pub mod casts;
pub mod pipeline_checkpoints;
pub mod users;
