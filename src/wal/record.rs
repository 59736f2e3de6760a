//! WAL record kinds and framing.
//!
//! # On-disk frame format (little-endian)
//!
//! ```text
//! [4 bytes: len][4 bytes: crc32][len bytes: payload]
//! ```
//!
//! `len` is the byte length of `payload` only. `crc32` is the CRC32 checksum
//! of `payload`. `payload`'s first byte is [`WAL_FORMAT_VERSION`]; the
//! remaining bytes are a `serde_json` encoding of [`WalRecord`].

use crate::engine::order::{Order, OrderId};
use crate::engine::trade::Trade;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::WalError;

/// Current payload format version, written as the first byte of every frame.
pub const WAL_FORMAT_VERSION: u8 = 1;

/// One durable, LSN-ordered state-transition record.
///
/// Variants correspond exactly to the operation kinds of the book-mutating
/// pipeline: an inserted order, a re-seated (modified) order, a cancelled
/// order, an executed trade, and a per-order post-trade update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WalPayload {
    OrderInsert {
        order: Order,
    },
    OrderModify {
        id: OrderId,
        new_price: i64,
        new_arrival_seq: u64,
    },
    OrderCancel {
        id: OrderId,
    },
    Trade {
        trade: Trade,
    },
    OrderUpdate {
        id: OrderId,
        traded_qty: i64,
        notional: i64,
        status: crate::engine::order::OrderStatus,
    },
}

/// A record as it sits in the log: an LSN, a wall-clock timestamp, and the
/// typed payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalRecord {
    pub lsn: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: WalPayload,
}

impl WalRecord {
    /// Encode this record's payload (version byte + JSON body) for framing.
    pub fn encode_payload(&self) -> Result<Vec<u8>, WalError> {
        let mut buf = Vec::with_capacity(128);
        buf.push(WAL_FORMAT_VERSION);
        serde_json::to_writer(&mut buf, self).map_err(|e| WalError::Encode(e.to_string()))?;
        Ok(buf)
    }

    /// Decode a record from a payload produced by [`encode_payload`].
    pub fn decode_payload(bytes: &[u8]) -> Result<Self, WalError> {
        let (version, body) = bytes
            .split_first()
            .ok_or_else(|| WalError::Decode("empty payload".into()))?;
        if *version != WAL_FORMAT_VERSION {
            return Err(WalError::Decode(format!(
                "unsupported WAL payload version {version}"
            )));
        }
        serde_json::from_slice(body).map_err(|e| WalError::Decode(e.to_string()))
    }
}
