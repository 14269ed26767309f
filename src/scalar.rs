//! Scalar values and their on-wire text.
//!
//! Every TT field is text; [`Scalar`] is the typed view of one field and
//! [`ScalarKind`] names the kinds a column may hold.
//!
//! | Kind | Tag | On the wire |
//! |------|-----|-------------|
//! | absent | - | empty field |
//! | text | `STR` | verbatim |
//! | integer | `INT` | decimal digits |
//! | float | `FLOAT` | shortest decimal that round-trips |
//! | timestamp | `TIME` | RFC 3339 |
//! | blob | `BLOB` | standard base64 |
//!
//! ```rust
//! use serde_tt::{Scalar, ScalarKind};
//!
//! assert_eq!(Scalar::Float(12.9).encode(), "12.9");
//! assert_eq!(Scalar::Blob(vec![1, 2, 3]).encode(), "AQID");
//! assert_eq!(Scalar::decode("AQID", ScalarKind::Blob, "c5").unwrap(), Scalar::Blob(vec![1, 2, 3]));
//! assert_eq!(Scalar::decode("", ScalarKind::Int, "c1").unwrap(), Scalar::Null);
//! ```

use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone};
use std::fmt;
use std::str::FromStr;

/// The kind of value a column carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int,
    Str,
    Float,
    Time,
    Blob,
}

impl ScalarKind {
    /// Header tag used by the flat table stream.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Int => "INT",
            ScalarKind::Str => "STR",
            ScalarKind::Float => "FLOAT",
            ScalarKind::Time => "TIME",
            ScalarKind::Blob => "BLOB",
        }
    }

    /// Human-readable name used in mismatch errors.
    pub(crate) const fn describe(&self) -> &'static str {
        match self {
            ScalarKind::Int => "integer",
            ScalarKind::Str => "text",
            ScalarKind::Float => "float",
            ScalarKind::Time => "RFC 3339 timestamp",
            ScalarKind::Blob => "base64 blob",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalarKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "INT" => Ok(ScalarKind::Int),
            "STR" => Ok(ScalarKind::Str),
            "FLOAT" => Ok(ScalarKind::Float),
            "TIME" => Ok(ScalarKind::Time),
            "BLOB" => Ok(ScalarKind::Blob),
            other => Err(Error::type_mismatch("type header", "INT|STR|FLOAT|TIME|BLOB", other)),
        }
    }
}

/// One typed field value.
///
/// `Null` writes an empty field. A zero-length blob writes an empty field too
/// and therefore reads back as `Null`.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Scalar {
    #[default]
    Null,
    Str(String),
    Int(i64),
    Float(f64),
    Time(DateTime<FixedOffset>),
    Blob(Vec<u8>),
}

impl Scalar {
    /// Returns the kind of this value, or `None` for `Null`.
    #[must_use]
    pub fn kind(&self) -> Option<ScalarKind> {
        match self {
            Scalar::Null => None,
            Scalar::Str(_) => Some(ScalarKind::Str),
            Scalar::Int(_) => Some(ScalarKind::Int),
            Scalar::Float(_) => Some(ScalarKind::Float),
            Scalar::Time(_) => Some(ScalarKind::Time),
            Scalar::Blob(_) => Some(ScalarKind::Blob),
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Renders the field text for this value.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Str(s) => s.clone(),
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Time(t) => t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Scalar::Blob(bytes) => BASE64_STANDARD.encode(bytes),
        }
    }

    /// Parses field text of the given kind. An empty field is `Null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScalarTypeMismatch`] naming `column` when the text is
    /// not a valid value of `kind`.
    pub fn decode(text: &str, kind: ScalarKind, column: &str) -> Result<Scalar> {
        if text.is_empty() {
            return Ok(Scalar::Null);
        }
        let mismatch = || Error::type_mismatch(column, kind.describe(), text);
        match kind {
            ScalarKind::Str => Ok(Scalar::Str(text.to_string())),
            ScalarKind::Int => text.parse().map(Scalar::Int).map_err(|_| mismatch()),
            ScalarKind::Float => text.parse().map(Scalar::Float).map_err(|_| mismatch()),
            ScalarKind::Time => DateTime::parse_from_rfc3339(text)
                .map(Scalar::Time)
                .map_err(|_| mismatch()),
            ScalarKind::Blob => BASE64_STANDARD
                .decode(text)
                .map(Scalar::Blob)
                .map_err(|_| mismatch()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Scalar::Int(n as i64)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<f32> for Scalar {
    fn from(f: f32) -> Self {
        Scalar::Float(f as f64)
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::Float(f)
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<Vec<u8>> for Scalar {
    fn from(bytes: Vec<u8>) -> Self {
        Scalar::Blob(bytes)
    }
}

impl From<&[u8]> for Scalar {
    fn from(bytes: &[u8]) -> Self {
        Scalar::Blob(bytes.to_vec())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Scalar {
    fn from(t: DateTime<Tz>) -> Self {
        Scalar::Time(t.fixed_offset())
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_kind_tags() {
        for kind in [
            ScalarKind::Int,
            ScalarKind::Str,
            ScalarKind::Float,
            ScalarKind::Time,
            ScalarKind::Blob,
        ] {
            assert_eq!(kind.as_str().parse::<ScalarKind>().unwrap(), kind);
        }
        assert!("BOOL".parse::<ScalarKind>().is_err());
    }

    #[test]
    fn test_timestamp_text() {
        let t = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        let scalar = Scalar::from(t);
        assert_eq!(scalar.encode(), "2024-01-15T10:30:00Z");
        assert_eq!(
            Scalar::decode("2024-01-15T10:30:00Z", ScalarKind::Time, "at").unwrap(),
            scalar
        );
    }

    #[test]
    fn test_mismatch_names_column() {
        match Scalar::decode("twelve", ScalarKind::Int, "count") {
            Err(Error::ScalarTypeMismatch { column, found, .. }) => {
                assert_eq!(column, "count");
                assert_eq!(found, "twelve");
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
        assert!(Scalar::decode("!!", ScalarKind::Blob, "b").is_err());
        assert!(Scalar::decode("yesterday", ScalarKind::Time, "t").is_err());
    }

    #[test]
    fn test_empty_blob_reads_back_null() {
        let text = Scalar::Blob(Vec::new()).encode();
        assert_eq!(text, "");
        assert_eq!(Scalar::decode(&text, ScalarKind::Blob, "b").unwrap(), Scalar::Null);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Scalar::from(None::<i64>), Scalar::Null);
        assert_eq!(Scalar::from(Some("x")), Scalar::Str("x".to_string()));
    }
}
