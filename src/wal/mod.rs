//! Append-only, crash-recoverable write-ahead log.

mod error;
mod file_wal;
mod record;
mod wal_trait;

pub use error::WalError;
pub use file_wal::FileWal;
pub use record::{WalPayload, WalRecord, WAL_FORMAT_VERSION};
pub use wal_trait::Wal;
