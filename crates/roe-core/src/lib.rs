pub mod config;
pub mod error;
pub mod types;

pub use error::{RoeError, RoeResult};
pub use types::{ByteRange, PartName};
