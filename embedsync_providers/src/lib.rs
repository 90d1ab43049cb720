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

mod neynar;
mod openai;
mod profile;

pub use neynar::NeynarClient;
pub use openai::OpenAiProvider;
pub use profile::{MAX_PROMPT_CASTS, ProfileEmbedder, profile_prompt};
