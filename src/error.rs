//! Error types for the CQL codec and result-set layer.

use std::panic::Location;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for CQL operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for codec, row access and paging operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed frame or value bytes.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Buffer too small.
    #[error("Buffer too small: need {needed} bytes, have {available} filed at {location}")]
    BufferTooSmall {
        needed: usize,
        available: usize,
        location: &'static Location<'static>,
    },

    /// Unknown wire type code.
    #[error("Invalid column info: unknown type code {code:#06x}")]
    InvalidTypeCode { code: u16 },

    /// Composite type info does not match its type code.
    #[error("Invalid column info for {type_name}: {message}")]
    InvalidColumnInfo { type_name: String, message: String },

    /// Stored value cannot be converted to the requested type.
    #[error("Cannot convert value of type {actual} to {expected}")]
    TypeMismatch { expected: String, actual: String },

    /// Value passed for encoding does not match the target wire type.
    #[error("Invalid argument: expected a value for {expected}, got {actual}")]
    InvalidArgument { expected: String, actual: String },

    /// NULL value requested as a non-nullable type.
    #[error(
        "Column '{column}' is NULL and cannot be returned as non-nullable type {requested}; \
         request Option<{requested}> instead"
    )]
    NullValue { column: String, requested: String },

    /// Column not found.
    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },

    /// Column index out of bounds.
    #[error("Column index {index} out of bounds (columns: {count})")]
    ColumnIndexOutOfBounds { index: usize, count: usize },

    /// Fetching the next page failed; shared by every waiter of that fetch.
    #[error("Page fetch failed: {source}")]
    PageFetch {
        #[source]
        source: Arc<Error>,
    },

    /// Waiting for a page fetch exceeded the configured timeout.
    #[error("Page fetch timed out after {timeout:?}")]
    FetchTimeout { timeout: Duration },

    /// API used in a way it does not support.
    #[error("Invalid use: {message}")]
    Misuse { message: String },

    /// Error reported by the server while executing a request.
    #[error("Server error {code:#06x}: {message}")]
    Server { code: i32, message: String },
}

impl Error {
    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a misuse error.
    pub fn misuse(message: impl Into<String>) -> Self {
        Self::Misuse {
            message: message.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::InvalidArgument {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an invalid column info error.
    pub fn invalid_column_info(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidColumnInfo {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Whether this error indicates a mismatch between this client and the wire format.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Protocol { .. }
                | Error::BufferTooSmall { .. }
                | Error::InvalidTypeCode { .. }
                | Error::InvalidColumnInfo { .. }
        )
    }
}
