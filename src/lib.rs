pub mod config;
pub mod error;
pub mod fetch;
pub mod grading;
pub mod infra;
pub mod output;
pub mod roster;
pub mod services;
pub mod telemetry;
