//! File records, their visibility rules and the bytes behind them.

mod caller;
mod delivery;
mod maintenance;
mod metadata;

pub use caller::{Caller, ROOT_IDENTITY, is_visible};
pub use delivery::{ContentDelivery, ServedContent, StoredFile};
pub use maintenance::{RecompressReport, recompress_all};
pub use metadata::{FileStore, FileStoreError, FileUpdate, NewFile, ResolvedContent};
