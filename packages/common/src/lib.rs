pub mod access_level;
pub mod storage;

pub use access_level::{AccessLevel, ParseAccessLevelError};
