// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for storage backend operations.

/// An error from a storage backend operation.
///
/// This is an opaque error type that can wrap any underlying error from a
/// backend implementation (a lost connection, a malformed stored payload, a
/// rejected command). Use [`std::error::Error::source()`] to access the
/// underlying cause if needed.
///
/// # Example
///
/// ```
/// use queryveil_store::Error;
///
/// let error = Error::from_message("connection refused");
/// assert!(error.to_string().contains("connection refused"));
/// ```
#[derive(Debug, thiserror::Error)]
#[error("storage backend operation failed: {source}")]
pub struct Error {
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl Error {
    /// Creates a new error from any type that can be converted to an error.
    pub fn caused_by(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self { source: cause.into() }
    }

    /// Creates a new error from a message or error value.
    ///
    /// This is the public API for creating backend errors from external crates.
    pub fn from_message(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(cause)
    }
}

/// A specialized [`Result`] type for storage backend operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_contains_cause_message() {
        let error = Error::caused_by("display test");
        assert!(
            error.to_string().contains("display test"),
            "display output should contain the cause message, got: {error}"
        );
    }

    #[test]
    fn source_exposes_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "down");
        let error = Error::caused_by(cause);
        let source = std::error::Error::source(&error).expect("source should be set");
        assert!(source.to_string().contains("down"));
    }

    #[test]
    fn result_type_alias_propagates_errors() {
        fn returns_err() -> Result<i32> {
            Err(Error::caused_by("expected failure"))
        }

        let err = returns_err().expect_err("should return an error");
        assert!(err.to_string().contains("expected failure"));
    }
}
