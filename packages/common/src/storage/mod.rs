mod compress;
mod error;
mod locator;
mod sniff;
mod traits;

pub mod filesystem;

pub use compress::{Compressor, GzipCompressor};
pub use error::StorageError;
pub use locator::{GZIP_SUFFIX, Locator, LocatorError};
pub use sniff::detect_mime;
pub use traits::{BoxReader, ContentStore, Representation, StoredContent};
