use hex::FromHexError;
use thiserror::Error;

use crate::spec::ElementType;

pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur in the `bson_wire` crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,

    /// The document key associated with the error, if any.
    pub key: Option<String>,

    /// The array index associated with the error, if any.
    pub index: Option<usize>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(key) = self.key.as_deref() {
            write!(f, "Error at key \"{key}\": ")?;
        } else if let Some(index) = self.index {
            write!(f, "Error at array index {index}: ")?;
        }

        write!(f, "{}", self.kind)
    }
}

/// The types of errors that can occur in the `bson_wire` crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed BSON or wire bytes were encountered: a bad length prefix, a misplaced
    /// terminator or an unrecognized element type.
    #[error("Corrupt data: {message}")]
    #[non_exhaustive]
    CorruptData { message: String },

    /// The underlying stream ended in the middle of a value.
    #[error("Unexpected end of stream")]
    UnexpectedEndOfStream,

    /// Invalid UTF-8 bytes were encountered.
    #[error("Invalid UTF-8")]
    Utf8Encoding,

    /// A value could not be represented as any BSON type.
    #[error("Unsupported type: {message}")]
    #[non_exhaustive]
    UnsupportedType { message: String },

    /// A key, regex pattern or other cstring contained an interior null byte.
    #[error("cstring with interior null byte: {value:?}")]
    #[non_exhaustive]
    InvalidCString { value: String },

    /// A document exceeded the configured maximum size. Raised before any bytes are written.
    #[error("Document of {size} bytes exceeds the maximum of {max} bytes")]
    #[non_exhaustive]
    DocumentTooLarge { size: usize, max: usize },

    /// A key was appended to a document that already contains it, or the server reported a
    /// duplicate key violation.
    #[error("Duplicate key \"{key}\"")]
    #[non_exhaustive]
    DuplicateKey { key: String },

    /// An error occurred when attempting to access a value in a document.
    #[error("An error occurred when attempting to access a document value: {kind}")]
    #[non_exhaustive]
    ValueAccess {
        /// The kind of error that occurred.
        kind: ValueAccessErrorKind,
    },

    /// An error related to the [`ObjectId`](crate::oid::ObjectId) type occurred.
    #[error("An ObjectId-related error occurred: {kind}")]
    #[non_exhaustive]
    ObjectId { kind: ObjectIdErrorKind },

    /// An error related to the [`DateTime`](crate::DateTime) type occurred.
    #[error("A DateTime-related error occurred: {message}")]
    #[non_exhaustive]
    DateTime { message: String },

    /// Sending to or receiving from the server failed. The connection should be reconnected
    /// before the logical operation is reissued.
    #[error("Communication with {address} failed: {source}")]
    #[non_exhaustive]
    CommunicationFailure {
        /// The `host:port` of the peer.
        address: String,

        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A cursor's query parameters were modified after enumeration began.
    #[error("Cursor is not modifiable once enumeration has started")]
    CursorAlreadyStarted,

    /// The server no longer knows the cursor a `getMore` referred to.
    #[error("Cursor {cursor_id} was not found on the server")]
    #[non_exhaustive]
    CursorNotFound { cursor_id: i64 },

    /// A reply did not match the request it claims to answer, or carried an unexpected opcode.
    #[error("Protocol violation: {message}")]
    #[non_exhaustive]
    ProtocolViolation { message: String },

    /// The server reported a failure for a query or a checked mutation.
    #[error("Server error {code:?}: {message}")]
    #[non_exhaustive]
    Server { code: Option<i32>, message: String },

    /// A [`std::io::Error`] occurred.
    #[error("An IO error occurred: {0}")]
    Io(std::io::Error),
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            key: None,
            index: None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        match value.kind() {
            std::io::ErrorKind::UnexpectedEof => ErrorKind::UnexpectedEndOfStream.into(),
            _ => ErrorKind::Io(value).into(),
        }
    }
}

/// The types of errors that can occur when attempting to access a value in a document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValueAccessErrorKind {
    /// No value for the specified key was present in the document.
    #[error("The key was not present in the document")]
    NotPresent,

    /// The type of the value in the document did not match the requested type.
    #[error("Expected type {expected:?}, got type {actual:?}")]
    #[non_exhaustive]
    UnexpectedType {
        /// The actual type of the value.
        actual: ElementType,

        /// The expected type of the value.
        expected: ElementType,
    },
}

/// Why a string could not be parsed as an [`ObjectId`](crate::oid::ObjectId).
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ObjectIdErrorKind {
    /// The string is not exactly 24 characters long.
    #[error("expected 24 hex characters, got {length}")]
    InvalidLength { length: usize },

    /// A character outside `0-9`, `a-f` and `A-F` was found.
    #[error("invalid hex character {c:?} at index {index}")]
    InvalidCharacter { c: char, index: usize },
}

impl Error {
    pub(crate) fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub(crate) fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub(crate) fn value_access_not_present() -> Self {
        ErrorKind::ValueAccess {
            kind: ValueAccessErrorKind::NotPresent,
        }
        .into()
    }

    pub(crate) fn value_access_unexpected_type(actual: ElementType, expected: ElementType) -> Self {
        ErrorKind::ValueAccess {
            kind: ValueAccessErrorKind::UnexpectedType { actual, expected },
        }
        .into()
    }

    pub(crate) fn invalid_object_id(input: &str, error: FromHexError) -> Self {
        let kind = match error {
            FromHexError::InvalidHexCharacter { c, index } => {
                ObjectIdErrorKind::InvalidCharacter { c, index }
            }
            FromHexError::OddLength | FromHexError::InvalidStringLength => {
                ObjectIdErrorKind::InvalidLength {
                    length: input.len(),
                }
            }
        };
        ErrorKind::ObjectId { kind }.into()
    }

    pub(crate) fn corrupt_data(message: impl ToString) -> Self {
        ErrorKind::CorruptData {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn unsupported_type(message: impl ToString) -> Self {
        ErrorKind::UnsupportedType {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn protocol_violation(message: impl ToString) -> Self {
        ErrorKind::ProtocolViolation {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn communication_failure(address: impl Into<String>, source: std::io::Error) -> Self {
        ErrorKind::CommunicationFailure {
            address: address.into(),
            source,
        }
        .into()
    }

    pub(crate) fn datetime(message: impl ToString) -> Self {
        ErrorKind::DateTime {
            message: message.to_string(),
        }
        .into()
    }

    /// Whether this error was caused by malformed bytes.
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self.kind, ErrorKind::CorruptData { .. })
    }

    /// Whether this error was caused by the stream ending mid-value.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self.kind, ErrorKind::UnexpectedEndOfStream)
    }

    /// Whether this error requires the caller to reconnect before retrying.
    pub fn is_communication_failure(&self) -> bool {
        matches!(self.kind, ErrorKind::CommunicationFailure { .. })
    }

    /// Whether this error is a protocol violation in a reply.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self.kind, ErrorKind::ProtocolViolation { .. })
    }

    /// Whether this error reports a duplicate key, either client- or server-side.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self.kind, ErrorKind::DuplicateKey { .. })
    }

    /// Converts a premature end of stream inside a document into a [`ErrorKind::CorruptData`]
    /// error, since the declared document length promised more bytes.
    pub(crate) fn truncated_document(self, declared: i32) -> Self {
        if self.is_end_of_stream() {
            Self {
                kind: ErrorKind::CorruptData {
                    message: format!(
                        "stream ended before the declared document length of {declared} bytes"
                    ),
                },
                ..self
            }
        } else {
            self
        }
    }

    #[cfg(test)]
    pub(crate) fn is_value_access_not_present(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ValueAccess {
                kind: ValueAccessErrorKind::NotPresent,
                ..
            }
        )
    }

    #[cfg(test)]
    pub(crate) fn is_value_access_unexpected_type(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ValueAccess {
                kind: ValueAccessErrorKind::UnexpectedType { .. },
                ..
            }
        )
    }
}
