#![doc = include_str!("../README.md")]

mod error;
mod format;
mod oracle;
mod pattern;
mod service;
mod store;
#[cfg(test)]
mod testing;
mod time;

pub use crate::error::*;
pub use crate::format::*;
pub use crate::oracle::*;
pub use crate::pattern::*;
pub use crate::service::*;
pub use crate::store::*;
pub use crate::time::*;
