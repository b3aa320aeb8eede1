use std::fmt;

use thiserror::Error;

#[doc(hidden)]
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A list specifying categories of retrieval failures
///
/// used with the [`Error`] type
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The transport could not deliver a response (connection error, invalid locator, etc.)
    Transport,
    /// The response body could not be parsed into the requested payload type
    Parse,
}

impl ErrorKind {
    pub(crate) fn as_str(&self) -> &'static str {
        use ErrorKind::*;
        match *self {
            Transport => "transport failed",
            Parse => "parse failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    /// Shows a human-readable description of the `ErrorKind`.
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

/// The reason a retrieval failed
///
/// The error displays as the message of the wrapped error, so a transport failing with
/// `"Failed to fetch"` produces an `Error` that also displays as `"Failed to fetch"`. Use
/// [`Error::kind`] to tell transport failures from parse failures.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct Error {
    kind: ErrorKind,
    source: BoxError,
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::new(ErrorKind::Parse, e)
    }
}

impl Error {
    pub fn new<E: Into<BoxError>>(kind: ErrorKind, error: E) -> Self {
        Self {
            kind,
            source: error.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Create a transport error from any error type
    pub fn transport<E: Into<BoxError>>(error: E) -> Self {
        Self::new(ErrorKind::Transport, error)
    }

    /// Returns the wrapped error if it is of type `E`
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref::<E>()
    }
}
