pub mod audit;
pub mod availability;
pub mod cache;
pub mod config;
pub mod db;
pub mod embeddings;
pub mod error;
pub mod graph;
pub mod grounding;
pub mod llm;
pub mod orchestrator;
pub mod retrieve;
pub mod text;

#[cfg(test)]
pub(crate) mod test_support;

pub use availability::Availability;
pub use config::Config;
pub use error::{RegassistError, Result};
pub use orchestrator::{Diagnostics, Orchestrator, RunOutcome, StepRecord};
