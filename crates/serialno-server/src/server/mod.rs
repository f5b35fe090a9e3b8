pub mod config;
pub mod seed;
pub mod service;
pub mod telemetry;
