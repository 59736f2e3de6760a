//! Write-ahead log trait: the contract every durable backing store must meet.

use super::error::WalError;
use super::record::WalPayload;

/// An append-only, durable, LSN-ordered log of book-mutating events.
///
/// Implementations must guarantee write-ahead semantics: a record is
/// considered durable only after [`append`](Wal::append) returns `Ok`. The
/// intended usage pattern is single-writer (the Matching Engine) with the
/// occasional reader (replay during recovery).
pub trait Wal: Send {
    /// Append one record, assigning it the next LSN. Returns the assigned
    /// LSN once the record has been durably flushed to storage.
    ///
    /// # Errors
    /// Returns [`WalError::FullDisk`] or [`WalError::Io`] if the record
    /// could not be durably written.
    fn append(&mut self, payload: WalPayload) -> Result<u64, WalError>;

    /// Append several records as one flush unit: either all are durable or
    /// (on error) none of the later ones are considered durable. Used so a
    /// request's trade + order-update records share a single flush.
    fn append_batch(&mut self, payloads: Vec<WalPayload>) -> Result<Vec<u64>, WalError>;

    /// Read records in LSN order starting at `from_lsn` (inclusive).
    ///
    /// Stops at the first torn (checksum-mismatched or truncated) record;
    /// a checksum mismatch that is not at the physical tail of the log is
    /// reported as [`WalError::Corrupt`] instead of silently truncating.
    fn replay(&self, from_lsn: u64) -> Result<Vec<(u64, WalPayload)>, WalError>;

    /// The highest LSN durably written so far, or `0` if the log is empty.
    fn last_lsn(&self) -> u64;
}
