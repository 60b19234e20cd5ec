//! Run orchestration

pub mod runner;

pub use runner::{DiffRunner, RunSummary};
