//! Error taxonomy for the book and the engine.

use super::order::OrderId;
use crate::wal::WalError;
use thiserror::Error;

/// Errors returned by [`crate::engine::book::Book`] operations.
#[derive(Debug, Error, PartialEq)]
pub enum BookError {
    /// `insert` was called with an id that is already live on the book.
    #[error("order {0} is already live")]
    AlreadyLive(OrderId),

    /// `cancel`/`modify` was called against an id not currently live.
    #[error("order {0} is not live")]
    UnknownOrder(OrderId),
}

/// Validation failures surfaced to the request producer without ever
/// touching the WAL or the Book.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("price must be positive, got {0}")]
    NonPositivePrice(i64),

    #[error("quantity must be positive, got {0}")]
    NonPositiveQty(i64),

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error("order {0} is not live")]
    OrderNotLive(OrderId),

    #[error("insert request must not reference an already-live order id {0}")]
    DuplicateInsert(OrderId),
}

/// Top-level engine error.
///
/// Validation variants are recoverable (they produce an `EngineAck::Rejected`
/// reply). `Fatal` variants mean the engine must halt without acknowledging
/// the in-flight request — a WAL flush failure or an internal invariant
/// violation, both of which are impossible to safely continue past.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("book error: {0}")]
    Book(#[from] BookError),

    #[error("fatal WAL error, engine must halt: {0}")]
    Fatal(#[from] WalError),

    #[error("book invariant violated: {0}")]
    InvariantViolation(String),
}
