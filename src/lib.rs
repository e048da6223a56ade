pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod types;

// Destination ports and their adapters
pub mod app;
pub mod infra;
