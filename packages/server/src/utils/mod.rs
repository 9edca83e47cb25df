pub mod encoding;
pub mod filename;
