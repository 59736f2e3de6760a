//! Ingress request/ack wire types.

use super::order::{OrderId, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Idempotence key for an ingress message; re-delivery of the same
/// `request_id` is acknowledged without re-applying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

/// The operation an ingress message asks the engine to perform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RequestOp {
    Insert { id: Option<OrderId>, side: Side, price_paise: i64, qty: i64 },
    Modify { id: OrderId, price_paise: i64 },
    Cancel { id: OrderId },
}

/// One ordered, at-least-once ingress message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngressRequest {
    pub request_id: RequestId,
    pub ts: DateTime<Utc>,
    pub op: RequestOp,
}

/// The engine's reply to an ingress message, sent only after WAL flush.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EngineAck {
    Ok { request_id: RequestId },
    Rejected { request_id: RequestId, reason: String },
}

impl EngineAck {
    pub fn request_id(&self) -> RequestId {
        match self {
            EngineAck::Ok { request_id } | EngineAck::Rejected { request_id, .. } => *request_id,
        }
    }
}
