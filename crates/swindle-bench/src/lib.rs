pub mod analytics;
pub mod challenger;
pub mod config;
pub mod logging;
pub mod statistics;
pub mod telemetry;
pub mod tournament;
