//! Tiny worlds: configuration and seeded story generation.

mod config;
mod task;

pub use config::TinyWorldConfig;
pub use task::{Example, TinyWorldTask, SEP_TOKEN};
