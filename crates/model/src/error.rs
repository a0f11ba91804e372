//! Model error types, following the workspace's `exn` conventions.

use derive_more::{Display, Error};

/// A model error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for entity construction.
pub type Result<T> = std::result::Result<T, Error>;

/// Why an entity could not be built from its input.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A required text field was missing, empty or whitespace-only.
    #[display("{_0} must be a non-blank string")]
    BlankText(#[error(not(source))] &'static str),
    /// The supplied book format string is not a recognized value.
    #[display("unknown book format [{_0}]")]
    UnknownFormat(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
