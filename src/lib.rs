//! # serde_tt
//!
//! A reader, writer and Serde-driven object codec for the tagged-tab (TT)
//! text format.
//!
//! ## What is TT?
//!
//! TT is a line-oriented, delimiter-separated record format in the spirit of
//! TSV. A field that would be ambiguous is wrapped in backticks, or, when its
//! text itself contains backticks, in a `^id^` tag chosen so the closing tag
//! cannot occur inside the text. Content is never escaped: whatever sits
//! between the opening and closing quote is the field, byte for byte.
//!
//! ```text
//! plain	`has	tab`	^1^has `backticks`^1^
//! ```
//!
//! On top of the record layer sits a typed object stream. Each structured type
//! is announced once with a register row, later rows of that type are bare
//! values, and switching back to an earlier type costs a short reference row.
//!
//! ## Key Features
//!
//! - **No escaping**: any text, including tabs, newlines, backticks and carets,
//!   round-trips exactly
//! - **Streaming**: [`Reader`] and [`Writer`] work record by record over any
//!   `io::Read` / `io::Write`
//! - **Serde Compatible**: [`Encoder`] and [`Decoder`] map columns to fields of
//!   `#[derive(Serialize, Deserialize)]` types, flattening nested structs
//! - **Flat tables**: [`TableWriter`] and [`TableReader`] carry a typed column
//!   header for schema-first data
//!
//! ## Quick Start
//!
//! ### Records
//!
//! ```rust
//! use serde_tt::{Reader, Writer};
//!
//! let mut writer = Writer::new(Vec::new());
//! writer.write_record(&["id", "note"]).unwrap();
//! writer.write_record(&["1", "line one\nline two"]).unwrap();
//! let bytes = writer.into_inner().unwrap();
//!
//! let mut reader = Reader::new(bytes.as_slice());
//! let records = reader.read_all().unwrap();
//! assert_eq!(records[1][1], "line one\nline two");
//! ```
//!
//! ### Typed values
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_tt::{from_str, to_string};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     active: bool,
//! }
//!
//! let users = vec![
//!     User { id: 1, name: "Alice".to_string(), active: true },
//!     User { id: 2, name: "Bob\tthe builder".to_string(), active: false },
//! ];
//!
//! let text = to_string(&users).unwrap();
//! assert!(text.ends_with("1\tAlice\ttrue\n2\t`Bob\tthe builder`\tfalse\n"));
//!
//! let back: Vec<User> = from_str(&text).unwrap();
//! assert_eq!(users, back);
//! ```
//!
//! ## Examples
//!
//! The `demos/` directory holds runnable programs:
//!
//! - **`records.rs`** - reading and writing raw records, quoting in action
//! - **`objects.rs`** - a mixed-type object stream
//! - **`table.rs`** - a flat typed table
//!
//! Run any example with: `cargo run --example <name>`

pub mod de;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod macros;
pub mod options;
pub mod quote;
pub mod reader;
pub mod registry;
pub mod scalar;
pub mod ser;
pub mod table;
pub mod timestamp;
pub mod writer;

pub use decoder::{DecodeIter, Decoder};
pub use encoder::Encoder;
pub use error::{Error, Result};
pub use options::{Delimiter, FieldCount, TtOptions};
pub use quote::FieldFormat;
pub use reader::{Reader, Records};
pub use registry::{ControlRow, Registry, TypeDescriptor, TypeKey};
pub use scalar::{Scalar, ScalarKind};
pub use ser::Row;
pub use table::{TableReader, TableWriter};
pub use writer::Writer;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;

/// Encodes a sequence of values of one type as a TT object stream.
///
/// # Examples
///
/// ```rust
/// use serde::Serialize;
/// use serde_tt::to_string;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let text = to_string(&[Point { x: 1, y: 2 }]).unwrap();
/// assert!(text.starts_with("`*`\t"));
/// assert!(text.ends_with("\tPoint\tx\ty\n1\t2\n"));
/// ```
///
/// # Errors
///
/// Returns an error if a value cannot be flattened into a row.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(values: &[T]) -> Result<String>
where
    T: Serialize,
{
    let mut buffer = Vec::new();
    to_writer(&mut buffer, values)?;
    String::from_utf8(buffer).map_err(Error::custom)
}

/// Encodes a sequence of values of one type to a writer.
///
/// # Errors
///
/// Returns an error if a value cannot be flattened into a row or writing fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, values: &[T]) -> Result<()>
where
    W: io::Write,
    T: Serialize,
{
    let mut encoder = Encoder::new(writer);
    for value in values {
        encoder.encode(value)?;
    }
    encoder.into_inner()?;
    Ok(())
}

/// Decodes every row of a TT object stream as a `T`.
///
/// # Examples
///
/// ```rust
/// use serde::Deserialize;
/// use serde_tt::from_str;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let points: Vec<Point> = from_str("`*`\tgeo\tPoint\ty\tx\n2\t1\n4\t3\n").unwrap();
/// assert_eq!(points, vec![Point { x: 1, y: 2 }, Point { x: 3, y: 4 }]);
/// ```
///
/// # Errors
///
/// Returns an error if the input is not valid TT, a control row is bad, or a
/// row cannot be decoded into `T`. Grammar errors include line and column.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
{
    from_reader(s.as_bytes())
}

/// Decodes every row of a TT object stream read from `reader`.
///
/// # Errors
///
/// Same as [`from_str`], plus I/O failures.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(reader: R) -> Result<Vec<T>>
where
    R: io::Read,
    T: DeserializeOwned,
{
    Decoder::new(reader).iter().collect()
}

/// Decodes every row of a TT object stream held in bytes.
///
/// # Errors
///
/// Same as [`from_str`]; invalid UTF-8 is reported as an I/O error.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(v: &[u8]) -> Result<Vec<T>>
where
    T: DeserializeOwned,
{
    from_reader(v)
}
