//! Store error types.
//!
//! Structured errors using `exn` for automatic location tracking. The kinds
//! describe what the caller should *do* with the failure, not what went
//! wrong internally; in particular the batch-lookup kinds ([`NotFound`] vs
//! [`PartialResult`]) are the classification the service layer's status
//! selection is built on.
//!
//! [`NotFound`]: ErrorKind::NotFound
//! [`PartialResult`]: ErrorKind::PartialResult

use derive_more::{Display, Error};

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    /// A write collided with the `sha256` uniqueness constraint.
    #[display("content hash already present")]
    Conflict,
    /// A lookup (single id, or a batch where *no* id matched) found nothing.
    #[display("no matching record")]
    NotFound,
    /// A batch lookup resolved some ids but not the ones listed here.
    #[display("partial result; missing ids {_0:?}")]
    PartialResult(#[error(not(source))] Vec<i64>),
    #[display("invalid stored data ({_0})")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
