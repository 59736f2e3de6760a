//! WAL error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("disk is full, cannot append WAL record")]
    FullDisk,

    #[error("WAL record at LSN {lsn:?} is corrupt (checksum mismatch mid-log)")]
    Corrupt { lsn: Option<u64> },

    #[error("torn tail detected after LSN {last_good_lsn}, truncating")]
    TornTail { last_good_lsn: u64 },

    #[error("could not acquire exclusive WAL lock: {0}")]
    Lock(String),

    #[error("failed to encode WAL record: {0}")]
    Encode(String),

    #[error("failed to decode WAL record: {0}")]
    Decode(String),
}

impl From<std::io::Error> for WalError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::Other && e.raw_os_error() == Some(28) {
            WalError::FullDisk
        } else {
            WalError::Io {
                message: e.to_string(),
            }
        }
    }
}
