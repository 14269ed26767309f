//! Configuration options for TT readers and writers.
//!
//! This module provides types to customize the record layer:
//!
//! - [`TtOptions`]: Main configuration struct
//! - [`Delimiter`]: Field delimiter rune (tab by default)
//! - [`FieldCount`]: Field-count policy applied by the reader
//!
//! ## Examples
//!
//! ```rust
//! use serde_tt::{Delimiter, FieldCount, Reader, TtOptions};
//!
//! let options = TtOptions::new()
//!     .with_delimiter(Delimiter::Comma)
//!     .with_comment('#')
//!     .with_fields_per_record(FieldCount::Unconstrained);
//!
//! let mut reader = Reader::with_options("# header\na,b\nc\n".as_bytes(), options).unwrap();
//! let records = reader.read_all().unwrap();
//! assert_eq!(records, vec![vec!["a", "b"], vec!["c"]]);
//! ```

use crate::{Error, Result};

/// Delimiter rune separating fields within a record.
///
/// # Examples
///
/// ```rust
/// use serde_tt::Delimiter;
///
/// assert_eq!(Delimiter::Tab.as_char(), '\t');
/// assert_eq!(Delimiter::Comma.as_char(), ',');
/// assert_eq!(Delimiter::Char(';').as_char(), ';');
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Tab,
    Comma,
    Pipe,
    Char(char),
}

impl Delimiter {
    /// Returns the rune this delimiter stands for.
    #[must_use]
    pub const fn as_char(&self) -> char {
        match self {
            Delimiter::Tab => '\t',
            Delimiter::Comma => ',',
            Delimiter::Pipe => '|',
            Delimiter::Char(c) => *c,
        }
    }
}

impl From<char> for Delimiter {
    fn from(c: char) -> Self {
        match c {
            '\t' => Delimiter::Tab,
            ',' => Delimiter::Comma,
            '|' => Delimiter::Pipe,
            other => Delimiter::Char(other),
        }
    }
}

/// Field-count policy enforced by the reader.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FieldCount {
    /// Records may have any number of fields.
    Unconstrained,
    /// The first record read fixes the count for the rest of the stream.
    #[default]
    Auto,
    /// Every record must have exactly this many fields.
    Fixed(usize),
}

impl FieldCount {
    /// Maps the integer convention: negative is unconstrained, zero is auto,
    /// positive is a fixed count.
    ///
    /// ```rust
    /// use serde_tt::FieldCount;
    ///
    /// assert_eq!(FieldCount::from_i64(-1), FieldCount::Unconstrained);
    /// assert_eq!(FieldCount::from_i64(0), FieldCount::Auto);
    /// assert_eq!(FieldCount::from_i64(5), FieldCount::Fixed(5));
    /// ```
    #[must_use]
    pub fn from_i64(n: i64) -> Self {
        match n {
            n if n < 0 => FieldCount::Unconstrained,
            0 => FieldCount::Auto,
            n => FieldCount::Fixed(n as usize),
        }
    }
}

/// Configuration options for TT reading and writing.
///
/// # Examples
///
/// ```rust
/// use serde_tt::{Delimiter, TtOptions};
///
/// let options = TtOptions::new();
/// assert_eq!(options.delimiter, Delimiter::Tab);
/// assert_eq!(options.comment, None);
///
/// let options = TtOptions::new().with_delimiter(Delimiter::Pipe).with_comment('#');
/// assert!(options.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub struct TtOptions {
    pub delimiter: Delimiter,
    pub comment: Option<char>,
    pub fields_per_record: FieldCount,
}

impl TtOptions {
    /// Creates default options (tab delimiter, no comments, auto field count).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<Delimiter>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Enables comment lines starting with `comment`.
    #[must_use]
    pub fn with_comment(mut self, comment: char) -> Self {
        self.comment = Some(comment);
        self
    }

    /// Sets the reader's field-count policy.
    #[must_use]
    pub fn with_fields_per_record(mut self, policy: FieldCount) -> Self {
        self.fields_per_record = policy;
        self
    }

    /// Checks that the delimiter and comment runes leave the grammar unambiguous.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] when either rune is CR, LF, backtick or
    /// caret, or when the comment rune equals the delimiter.
    pub fn validate(&self) -> Result<()> {
        let delimiter = self.delimiter.as_char();
        if is_reserved(delimiter) {
            return Err(Error::InvalidOptions(format!(
                "delimiter {:?} is reserved by the grammar",
                delimiter
            )));
        }
        if let Some(comment) = self.comment {
            if is_reserved(comment) {
                return Err(Error::InvalidOptions(format!(
                    "comment {:?} is reserved by the grammar",
                    comment
                )));
            }
            if comment == delimiter {
                return Err(Error::InvalidOptions(
                    "comment and delimiter must differ".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn is_reserved(c: char) -> bool {
    matches!(c, '\r' | '\n' | '`' | '^')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_runes_rejected() {
        for c in ['\r', '\n', '`', '^'] {
            let options = TtOptions::new().with_delimiter(c);
            assert!(matches!(options.validate(), Err(Error::InvalidOptions(_))));
        }
        let options = TtOptions::new().with_comment('\t');
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_delimiter_from_char() {
        assert_eq!(Delimiter::from('\t'), Delimiter::Tab);
        assert_eq!(Delimiter::from(';'), Delimiter::Char(';'));
    }
}
