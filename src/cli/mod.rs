//! Command-level workflows, separated from argument parsing in main.rs

pub mod orchestration;

pub use orchestration::{run_update, RunOptions, UpdateOutcome};
