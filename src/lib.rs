pub mod apis;
pub mod coerce;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod types;

// Layered boundaries: ports the pipeline depends on, adapters implementing them
pub mod app;
pub mod infra;
