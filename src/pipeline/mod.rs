//! Batch processing pipeline

pub mod executor;
pub mod orchestrator;
pub mod writer;

pub use executor::{run_batch, BatchFailure, BatchSummary};
pub use orchestrator::{run, run_with_store, PipelineResult, RunContext};
pub use writer::Writer;
