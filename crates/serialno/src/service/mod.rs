mod admin;
mod backoff;
mod config;
mod generator;

pub use backoff::*;
pub use config::*;
pub use generator::*;
