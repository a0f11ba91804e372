//! Service error types.
//!
//! The kinds mirror what a transport layer needs to pick a status code:
//! validation vs conflict vs missing vs partially-missing vs not-permitted,
//! with everything operational collapsed into [`Internal`].
//!
//! [`Internal`]: ErrorKind::Internal

use biblio_store::error::ErrorKind as StoreErrorKind;
use derive_more::{Display, Error};
use exn::ResultExt;
use std::ops::Deref;

/// A service error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The request itself is malformed; retrying it unchanged cannot help.
    #[display("validation failed: {_0}")]
    Validation(#[error(not(source))] String),
    /// An entity with the same content hash already exists.
    #[display("an entity with the same content already exists")]
    Conflict,
    #[display("no matching record")]
    NotFound,
    /// A batch lookup resolved some ids but not the ones listed here.
    #[display("partial result; missing ids {_0:?}")]
    PartialResult(#[error(not(source))] Vec<i64>),
    /// The request is well-formed but the catalogue's rules forbid it, e.g.
    /// detaching a book's only contributor.
    #[display("operation not permitted: {_0}")]
    InvalidOperation(#[error(not(source))] String),
    #[display("internal failure")]
    Internal,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Lifts store errors into service errors, preserving the classification
/// the transport layer's status selection depends on.
pub(crate) trait StoreResultExt<T> {
    fn lift(self) -> Result<T>;
}

impl<T> StoreResultExt<T> for biblio_store::error::Result<T> {
    fn lift(self) -> Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(e) => {
                let kind = match e.deref() {
                    StoreErrorKind::Conflict => ErrorKind::Conflict,
                    StoreErrorKind::NotFound => ErrorKind::NotFound,
                    StoreErrorKind::PartialResult(missing) => ErrorKind::PartialResult(missing.clone()),
                    _ => ErrorKind::Internal,
                };
                Err(e).or_raise(|| kind)
            },
        }
    }
}

/// Lifts model construction errors (blank text, unknown format) into
/// [`ErrorKind::Validation`] carrying the model's own message.
pub(crate) trait ModelResultExt<T> {
    fn lift_validation(self) -> Result<T>;
}

impl<T> ModelResultExt<T> for biblio_model::error::Result<T> {
    fn lift_validation(self) -> Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(e) => {
                let message = e.to_string();
                Err(e).or_raise(|| ErrorKind::Validation(message))
            },
        }
    }
}
