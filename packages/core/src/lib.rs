// Library root. The binary in `src/main.rs` and the integration tests in
// `tests/` both build on these modules.

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod feeds;
pub mod logging;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod repository;
pub mod scheduler;
pub mod services;
