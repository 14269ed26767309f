//! Reading typed values from a TT stream.
//!
//! [`Decoder`] consumes register and reference rows as it meets them and
//! hands each data row to the destination type, matching columns to fields
//! by name. Callers reading a stream of several types can look at
//! [`Decoder::next_type`] before choosing what to decode into.
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_tt::Decoder;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct User { id: i64, name: String }
//!
//! let input = "`*`\tapp\tUser\tname\tid\nAlice\t1\n";
//! let mut decoder = Decoder::new(input.as_bytes());
//!
//! let user: User = decoder.decode().unwrap().unwrap();
//! assert_eq!(user, User { id: 1, name: "Alice".into() });
//! assert!(decoder.decode::<User>().unwrap().is_none());
//! ```

use crate::registry::{ControlRow, Registry, TypeDescriptor};
use crate::{de, Error, FieldCount, Reader, Result, TtOptions};
use serde::de::DeserializeOwned;
use std::io;
use std::marker::PhantomData;

/// Decodes structured values from the rows of a typed TT stream.
pub struct Decoder<R> {
    reader: Reader<R>,
    registry: Registry,
    pending: Option<Vec<String>>,
}

impl<R: io::Read> Decoder<R> {
    pub fn new(rdr: R) -> Self {
        let mut reader = Reader::new(rdr);
        reader.set_fields_per_record(FieldCount::Unconstrained);
        Decoder {
            reader,
            registry: Registry::new(),
            pending: None,
        }
    }

    /// Creates a decoder with custom delimiter/comment options. Rows of a
    /// typed stream differ in width, so the field-count policy is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] if the options fail validation.
    pub fn with_options(rdr: R, options: TtOptions) -> Result<Self> {
        let options = options.with_fields_per_record(FieldCount::Unconstrained);
        Ok(Decoder {
            reader: Reader::with_options(rdr, options)?,
            registry: Registry::new(),
            pending: None,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Consumes control rows up to the next data row and returns the type
    /// that governs it, or `None` at end of stream. The data row is kept for
    /// the following [`Decoder::decode`].
    ///
    /// # Errors
    ///
    /// Same as [`Decoder::decode`], minus the per-field errors.
    pub fn next_type(&mut self) -> Result<Option<&TypeDescriptor>> {
        if self.pending.is_none() {
            self.pending = self.next_data_row()?;
        }
        Ok(match self.pending {
            Some(_) => self.registry.active(),
            None => None,
        })
    }

    /// Decodes the next data row into a `T`. Returns `Ok(None)` at a clean
    /// end of stream.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownTypeReference`] / [`Error::DuplicateType`] for bad control rows
    /// - [`Error::MissingActiveType`] for a data row before any control row
    /// - [`Error::FieldCountMismatch`] when the row width differs from the active type
    /// - [`Error::FieldNotFound`] / [`Error::ScalarTypeMismatch`] from field resolution
    /// - grammar and I/O errors from the underlying [`Reader`]
    pub fn decode<T>(&mut self) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let values = match self.pending.take() {
            Some(values) => values,
            None => match self.next_data_row()? {
                Some(values) => values,
                None => return Ok(None),
            },
        };
        let descriptor = self.registry.active().ok_or(Error::MissingActiveType)?;
        if values.len() != descriptor.columns().len() {
            return Err(Error::FieldCountMismatch {
                line: self.reader.line(),
                expected: descriptor.columns().len(),
                found: values.len(),
            });
        }
        de::from_row(descriptor.columns(), values).map(Some)
    }

    /// Returns an iterator decoding every remaining row as a `T`.
    pub fn iter<T: DeserializeOwned>(&mut self) -> DecodeIter<'_, R, T> {
        DecodeIter {
            decoder: self,
            marker: PhantomData,
        }
    }

    fn next_data_row(&mut self) -> Result<Option<Vec<String>>> {
        loop {
            let (values, formats) = match self.reader.read_with_format()? {
                Some(record) => record,
                None => return Ok(None),
            };
            match ControlRow::parse(&values, &formats)? {
                Some(control) => {
                    let descriptor = self.registry.apply(control)?;
                    tracing::debug!(
                        key = %descriptor.key(),
                        columns = descriptor.columns().len(),
                        "active type changed"
                    );
                }
                None if self.registry.active().is_none() => return Err(Error::MissingActiveType),
                None => return Ok(Some(values)),
            }
        }
    }
}

/// Iterator over decoded values, created by [`Decoder::iter`].
pub struct DecodeIter<'d, R, T> {
    decoder: &'d mut Decoder<R>,
    marker: PhantomData<T>,
}

impl<R: io::Read, T: DeserializeOwned> Iterator for DecodeIter<'_, R, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.decoder.decode().transpose()
    }
}
