//! Convenience re-exports of the common types.

pub use crate::engine::{
    Book, Engine, EngineAck, EngineConfig, EngineError, IngressRequest, Order, OrderId,
    OrderStatus, RequestId, RequestOp, Side, Trade, TradeId,
};
pub use crate::events::{EngineEvent, EventEmitter, SnapshotEvent, TradeEvent};
pub use crate::money::{from_paise, to_paise, MoneyError};
pub use crate::recovery::{recover, RecoveredState};
pub use crate::wal::{FileWal, Wal, WalError, WalPayload};
