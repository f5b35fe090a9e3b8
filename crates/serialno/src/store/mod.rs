mod error;
mod interface;
mod locks;
mod memory;
#[cfg(feature = "redb")]
mod redb;

pub use error::*;
pub use interface::*;
pub use memory::*;
#[cfg(feature = "redb")]
pub use self::redb::*;
