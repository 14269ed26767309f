//! Writing typed values to a TT stream.
//!
//! [`Encoder`] writes one data row per value. The first value of a type is
//! preceded by a register row carrying the type's columns; switching back to a
//! type seen earlier emits a short reference row instead.
//!
//! ```rust
//! use serde::Serialize;
//! use serde_tt::{Encoder, TypeKey};
//!
//! #[derive(Serialize)]
//! struct User { id: i64, name: String }
//!
//! let mut encoder = Encoder::new(Vec::new());
//! let key = TypeKey::new("app", "User");
//! encoder.encode_as(&key, &User { id: 1, name: "Alice".into() }).unwrap();
//! encoder.encode_as(&key, &User { id: 2, name: "Bob".into() }).unwrap();
//!
//! let text = String::from_utf8(encoder.into_inner().unwrap()).unwrap();
//! assert_eq!(text, "`*`\tapp\tUser\tid\tname\n1\tAlice\n2\tBob\n");
//! ```

use crate::quote::{self, FieldFormat};
use crate::registry::{ControlRow, Registry, TypeKey};
use crate::{ser, Error, Result, TtOptions, Writer};
use serde::Serialize;
use std::io;

/// Encodes structured values as rows of a typed TT stream.
pub struct Encoder<W: io::Write> {
    writer: Writer<W>,
    registry: Registry,
}

impl<W: io::Write> Encoder<W> {
    pub fn new(wtr: W) -> Self {
        Encoder {
            writer: Writer::new(wtr),
            registry: Registry::new(),
        }
    }

    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidOptions`] if the options fail validation.
    pub fn with_options(wtr: W, options: TtOptions) -> Result<Self> {
        Ok(Encoder {
            writer: Writer::with_options(wtr, options)?,
            registry: Registry::new(),
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes `value` under the identity derived from its Rust type path.
    ///
    /// # Errors
    ///
    /// See [`Encoder::encode_as`].
    pub fn encode<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.encode_as(&TypeKey::of::<T>(), value)
    }

    /// Encodes `value` under an explicit type identity, then flushes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedType`] when the value cannot be flattened
    /// into a row or its columns differ from those registered for `key`
    /// (for example a field skipped with `skip_serializing_if`), and any
    /// writer error. After a writer error the stream and the registry may
    /// disagree; the encoder should be dropped.
    pub fn encode_as<T>(&mut self, key: &TypeKey, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let row = ser::to_row(value)?;
        let columns: Vec<String> = row.keys().cloned().collect();

        // Every data row of a type must line up with its registered columns
        if let Some(descriptor) = self.registry.get(key) {
            if descriptor.columns() != columns.as_slice() {
                return Err(Error::UnsupportedType(format!(
                    "row columns [{}] differ from registered layout of {} [{}]",
                    columns.join(", "),
                    key,
                    descriptor.columns().join(", ")
                )));
            }
        }

        if let Some(control) = self.registry.prepare(key, &columns) {
            match &control {
                ControlRow::Register(_) => {
                    tracing::debug!(%key, columns = columns.len(), "registering type")
                }
                ControlRow::Reference(_) => tracing::debug!(%key, "switching to registered type"),
            }
            self.write_control(&control)?;
        }

        let values: Vec<String> = row.values().map(|s| s.encode()).collect();
        self.writer.write_record(&values)?;
        self.writer.flush()
    }

    /// Flushes and returns the underlying stream.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the final flush fails.
    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner()
    }

    fn write_control(&mut self, control: &ControlRow) -> Result<()> {
        let fields = control.to_fields();
        let mut formats = Vec::with_capacity(fields.len());
        formats.push(ControlRow::marker_format());
        for field in &fields[1..] {
            formats.push(quote::choose_format(field, self.writer.options(), false)?);
        }
        debug_assert_eq!(formats[0], FieldFormat::Backtick);
        self.writer.write_with_format(&fields, &formats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct A {
        x: i64,
    }

    #[derive(Serialize)]
    struct B {
        y: String,
    }

    fn lines(encoder: Encoder<Vec<u8>>) -> Vec<String> {
        let bytes = encoder.into_inner().unwrap();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_same_type_registers_once() {
        let mut encoder = Encoder::new(Vec::new());
        let key = TypeKey::new("t", "A");
        encoder.encode_as(&key, &A { x: 1 }).unwrap();
        encoder.encode_as(&key, &A { x: 2 }).unwrap();
        assert_eq!(lines(encoder), vec!["`*`\tt\tA\tx", "1", "2"]);
    }

    #[test]
    fn test_switching_back_references() {
        let mut encoder = Encoder::new(Vec::new());
        let a = TypeKey::new("t", "A");
        let b = TypeKey::new("t", "B");
        encoder.encode_as(&a, &A { x: 1 }).unwrap();
        encoder.encode_as(&b, &B { y: "*".into() }).unwrap();
        encoder.encode_as(&a, &A { x: 3 }).unwrap();
        assert_eq!(
            lines(encoder),
            vec!["`*`\tt\tA\tx", "1", "`*`\tt\tB\ty", "*", "`@`\tt\tA", "3"]
        );
    }

    #[test]
    fn test_layout_change_rejected() {
        #[derive(Serialize)]
        struct Sparse {
            id: i64,
            #[serde(skip_serializing_if = "Option::is_none")]
            email: Option<String>,
        }
        let mut encoder = Encoder::new(Vec::new());
        let key = TypeKey::new("t", "Sparse");
        encoder
            .encode_as(&key, &Sparse { id: 1, email: None })
            .unwrap();
        let err = encoder
            .encode_as(
                &key,
                &Sparse {
                    id: 2,
                    email: Some("x@y".into()),
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(ref msg) if msg.contains("t.Sparse")));
        assert_eq!(lines(encoder), vec!["`*`\tt\tSparse\tid", "1"]);
    }

    #[test]
    fn test_derived_key_uses_type_path() {
        let mut encoder = Encoder::new(Vec::new());
        encoder.encode(&A { x: 1 }).unwrap();
        let active = encoder.registry().active().unwrap();
        assert_eq!(active.key().name, "A");
        assert!(active.key().namespace.ends_with("encoder::tests"));
    }
}
