//! HTTP surface of the serial number service.
//!
//! ## Structure
//!
//! - [`handler`] - axum routes and handlers.
//! - [`dto`] - request and response bodies.
//! - [`error`] - [`error::ApiError`] and its status mapping.
//! - [`oracle`] - the issued-ledger uniqueness oracle used by `generate`.

pub mod dto;
pub mod error;
pub mod handler;
pub mod oracle;
