// Fetch, normalize, collect and export

pub mod export;
pub mod processing;
pub mod runner;

pub use runner::{dedupe_events, sort_events, Pipeline, PipelineResult, SourceReport, SourceStatus};
