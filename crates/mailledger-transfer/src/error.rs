//! Error types for transfer-encoding operations.

use std::fmt;
use std::io;

/// Result type alias for transfer-encoding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of an adapter an I/O failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading from the wrapped source.
    Read,
    /// Writing to the wrapped sink.
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Transfer-encoding error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The encoding name is not one the decoder knows.
    #[error("Unsupported transfer encoding: {0:?}")]
    UnsupportedEncoding(String),

    /// Encoded input does not conform to its claimed encoding.
    #[error("Malformed input{}: {reason}", .position.map(|p| format!(" at byte {p}")).unwrap_or_default())]
    MalformedInput {
        /// Offset of the offending byte in the encoded source, if known.
        position: Option<u64>,
        /// What was wrong.
        reason: String,
    },

    /// The wrapped source or sink failed.
    #[error("I/O error during {stage}: {source}")]
    Io {
        /// Side that failed.
        stage: Stage,
        /// Underlying error, unchanged.
        #[source]
        source: io::Error,
    },

    /// Finalizing an encode adapter failed.
    #[error("Failed to flush encoder: {0}")]
    Flush(#[source] io::Error),
}

impl Error {
    /// Creates a malformed-input error.
    #[must_use]
    pub fn malformed(position: Option<u64>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            position,
            reason: reason.into(),
        }
    }

    /// Returns true if this is a malformed-input error.
    #[must_use]
    pub const fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedInput { .. })
    }

    /// Converts an error returned by a decode adapter's `read`.
    ///
    /// Malformed input travels through `std::io::Read` as an
    /// [`io::ErrorKind::InvalidData`] error wrapping an [`Error`]; this
    /// recovers it. Anything else is a read failure of the source.
    #[must_use]
    pub fn from_read(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::InvalidData
            && err.get_ref().is_some_and(|inner| inner.is::<Self>())
        {
            if let Some(inner) = err.into_inner() {
                if let Ok(inner) = inner.downcast::<Self>() {
                    return *inner;
                }
            }
            return Self::malformed(None, "invalid data");
        }
        Self::Io {
            stage: Stage::Read,
            source: err,
        }
    }

    pub(crate) fn into_io(self) -> io::Error {
        match self {
            Self::Io { source, .. } | Self::Flush(source) => source,
            Self::MalformedInput { .. } => io::Error::new(io::ErrorKind::InvalidData, self),
            Self::UnsupportedEncoding(_) => io::Error::new(io::ErrorKind::Unsupported, self),
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        err.into_io()
    }
}

/// Failure while measuring an encoded size.
///
/// Carries the number of encoded bytes counted before the failure so callers
/// can tell "no progress" apart from "failed late". The count is not a valid
/// size.
#[derive(Debug, thiserror::Error)]
#[error("Encoded size measurement failed after {bytes} bytes: {source}")]
pub struct SizeError {
    /// Encoded bytes counted before the failure.
    pub bytes: u64,
    /// What went wrong.
    #[source]
    pub source: Error,
}
