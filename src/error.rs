//! Error types for TT reading, writing and the typed object layer.
//!
//! Every fallible operation in this crate returns [`Result`], whose error side is
//! the single [`Error`] enum below.
//!
//! ## Error Categories
//!
//! - **Grammar errors**: malformed quotes with line/column information
//! - **Stream errors**: field count mismatches, empty records, I/O failures
//! - **Registry errors**: unknown or duplicate type identities, data before any type
//! - **Value errors**: unresolvable columns and scalar kind mismatches
//!
//! ## Examples
//!
//! ```rust
//! use serde_tt::{Error, Reader};
//!
//! let mut reader = Reader::new("`never closed".as_bytes());
//! let err = reader.read_record().unwrap_err();
//! assert!(matches!(err, Error::MalformedQuote { line: 1, .. }));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised by the TT codec.
///
/// Each error is scoped to the call that raised it; none of them poison the
/// underlying stream on their own.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Unterminated backtick/caret field, or a quote character after field content
    #[error("Malformed quote at line {line}, column {col}: {msg}")]
    MalformedQuote { line: usize, col: usize, msg: String },

    /// Record length disagrees with the established or declared count
    #[error("Wrong number of fields at line {line}: expected {expected}, found {found}")]
    FieldCountMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A reference control row names an identity that was never registered
    #[error("Type {namespace}.{name} referenced before registration")]
    UnknownTypeReference { namespace: String, name: String },

    /// A register control row names an identity that is already registered
    #[error("Type {namespace}.{name} registered twice")]
    DuplicateType { namespace: String, name: String },

    /// A control row without namespace and name fields
    #[error("Malformed control row: {0}")]
    MalformedControlRow(String),

    /// A data row was read before any type was registered or referenced
    #[error("Data row found before any type was registered")]
    MissingActiveType,

    /// A column has no matching field in the destination type
    #[error("Column `{column}` has no matching field in {type_name}")]
    FieldNotFound { column: String, type_name: String },

    /// Field text cannot be parsed as the destination's scalar kind
    #[error("Type mismatch in column `{column}`: expected {expected}, found {found:?}")]
    ScalarTypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    /// No free caret id between `^^` and `^999^`
    #[error("Cannot find a free ^id^ tag for field text")]
    QuoteIdExhausted,

    /// Attempted to write a record with no fields
    #[error("Record has no fields")]
    EmptyRecord,

    /// A forced field format cannot carry the given text
    #[error("Field {index} cannot be written as {format}: {msg}")]
    FormatConflict {
        index: usize,
        format: String,
        msg: String,
    },

    /// Delimiter or comment rune collides with the grammar
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Value shape that cannot be flattened into a row
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Custom error raised by a `Serialize`/`Deserialize` impl.
    ///
    /// Rejections of a single field's text are reported as
    /// [`Error::ScalarTypeMismatch`] instead. A bare `DateTime<Utc>` field
    /// rejects an empty field; use `#[serde(with = "serde_tt::timestamp")]`
    /// to read it as the Unix epoch.
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a malformed quote error at the given position.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tt::Error;
    ///
    /// let err = Error::malformed_quote(3, 7, "unterminated backtick field");
    /// assert!(err.to_string().contains("line 3, column 7"));
    /// ```
    pub fn malformed_quote(line: usize, col: usize, msg: &str) -> Self {
        Error::MalformedQuote {
            line,
            col,
            msg: msg.to_string(),
        }
    }

    /// Creates a scalar type mismatch for `column`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_tt::Error;
    ///
    /// let err = Error::type_mismatch("age", "integer", "ten");
    /// assert!(err.to_string().contains("expected integer"));
    /// ```
    pub fn type_mismatch(column: &str, expected: &str, found: &str) -> Self {
        Error::ScalarTypeMismatch {
            column: column.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn format_conflict(index: usize, format: impl fmt::Display, msg: &str) -> Self {
        Error::FormatConflict {
            index,
            format: format.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates an unsupported type error for shapes the row codec cannot flatten.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for stream failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "stream closed");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(ref msg) if msg.contains("stream closed")));
    }

    #[test]
    fn test_messages_name_the_culprit() {
        let err = Error::FieldNotFound {
            column: "Email".to_string(),
            type_name: "User".to_string(),
        };
        assert_eq!(err.to_string(), "Column `Email` has no matching field in User");

        let err = Error::UnknownTypeReference {
            namespace: "app".to_string(),
            name: "Order".to_string(),
        };
        assert!(err.to_string().contains("app.Order"));
    }
}
