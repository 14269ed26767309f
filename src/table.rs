//! Flat typed tables.
//!
//! A table stream is a plain TT stream whose first two records declare the
//! column names and the column kinds. Every later record is one row:
//!
//! ```text
//! id	name	score
//! INT	STR	FLOAT
//! 1	Alice	9.5
//! 2		7
//! ```
//!
//! An empty field is an absent cell and reads back as [`Scalar::Null`],
//! whatever the column kind.
//!
//! ```rust
//! use serde_tt::{row, ScalarKind, Scalar, TableReader, TableWriter};
//!
//! let mut writer = TableWriter::new(
//!     Vec::new(),
//!     vec!["id".into(), "name".into()],
//!     vec![ScalarKind::Int, ScalarKind::Str],
//! ).unwrap();
//! writer.write_row(&row![1, "Alice"]).unwrap();
//! writer.write_row(&row![2, Scalar::Null]).unwrap();
//! let bytes = writer.into_inner().unwrap();
//!
//! let mut reader = TableReader::new(bytes.as_slice());
//! assert_eq!(reader.kinds().unwrap(), &[ScalarKind::Int, ScalarKind::Str]);
//! assert_eq!(reader.read_row().unwrap(), Some(row![1, "Alice"]));
//! assert_eq!(reader.read_row().unwrap(), Some(row![2, Scalar::Null]));
//! assert_eq!(reader.read_row().unwrap(), None);
//! ```

use crate::{Error, FieldCount, Reader, Result, Scalar, ScalarKind, TtOptions, Writer};
use std::io;

const HEADER_LINES: usize = 2;

/// Writes rows of a fixed column/kind layout.
pub struct TableWriter<W: io::Write> {
    writer: Writer<W>,
    columns: Vec<String>,
    kinds: Vec<ScalarKind>,
    rows: usize,
}

impl<W: io::Write> TableWriter<W> {
    /// Validates the header and writes both header records.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyRecord`] for an empty column list
    /// - [`Error::FieldCountMismatch`] when `kinds` and `columns` differ in length
    /// - [`Error::InvalidOptions`] for a column name containing the delimiter or a line break
    pub fn new(wtr: W, columns: Vec<String>, kinds: Vec<ScalarKind>) -> Result<Self> {
        Self::with_options(wtr, TtOptions::default(), columns, kinds)
    }

    pub fn with_options(
        wtr: W,
        options: TtOptions,
        columns: Vec<String>,
        kinds: Vec<ScalarKind>,
    ) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::EmptyRecord);
        }
        if columns.len() != kinds.len() {
            return Err(Error::FieldCountMismatch {
                line: HEADER_LINES,
                expected: columns.len(),
                found: kinds.len(),
            });
        }
        let delimiter = options.delimiter.as_char();
        if let Some(bad) = columns
            .iter()
            .find(|c| c.contains(|ch| ch == delimiter || ch == '\r' || ch == '\n'))
        {
            return Err(Error::InvalidOptions(format!(
                "column name {bad:?} contains the delimiter or a line break"
            )));
        }

        let mut writer = Writer::with_options(wtr, options)?;
        writer.write_record(&columns)?;
        let tags: Vec<&str> = kinds.iter().map(ScalarKind::as_str).collect();
        writer.write_record(&tags)?;
        writer.flush()?;

        Ok(TableWriter {
            writer,
            columns,
            kinds,
            rows: 0,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn kinds(&self) -> &[ScalarKind] {
        &self.kinds
    }

    /// Writes one row and flushes. `Scalar::Null` fits any column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldCountMismatch`] for a row of the wrong width and
    /// [`Error::ScalarTypeMismatch`] for a value of the wrong kind.
    pub fn write_row(&mut self, row: &[Scalar]) -> Result<()> {
        let line = HEADER_LINES + self.rows + 1;
        if row.len() != self.kinds.len() {
            return Err(Error::FieldCountMismatch {
                line,
                expected: self.kinds.len(),
                found: row.len(),
            });
        }
        for ((value, kind), column) in row.iter().zip(&self.kinds).zip(&self.columns) {
            match value.kind() {
                Some(found) if found != *kind => {
                    return Err(Error::type_mismatch(column, kind.as_str(), found.as_str()))
                }
                _ => {}
            }
        }
        let fields: Vec<String> = row.iter().map(Scalar::encode).collect();
        self.writer.write_record(&fields)?;
        self.rows += 1;
        self.writer.flush()
    }

    /// # Errors
    ///
    /// Returns [`Error::Io`] if the final flush fails.
    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner()
    }
}

/// Reads rows of a table stream, taking the layout from its header.
pub struct TableReader<R> {
    reader: Reader<R>,
    columns: Vec<String>,
    kinds: Vec<ScalarKind>,
    header_read: bool,
}

impl<R: io::Read> TableReader<R> {
    pub fn new(rdr: R) -> Self {
        let mut reader = Reader::new(rdr);
        reader.set_fields_per_record(FieldCount::Auto);
        TableReader {
            reader,
            columns: Vec::new(),
            kinds: Vec::new(),
            header_read: false,
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] if the options fail validation.
    pub fn with_options(rdr: R, options: TtOptions) -> Result<Self> {
        let options = options.with_fields_per_record(FieldCount::Auto);
        Ok(TableReader {
            reader: Reader::with_options(rdr, options)?,
            columns: Vec::new(),
            kinds: Vec::new(),
            header_read: false,
        })
    }

    /// Column names, reading the header if needed.
    ///
    /// # Errors
    ///
    /// See [`TableReader::read_row`].
    pub fn columns(&mut self) -> Result<&[String]> {
        self.read_header()?;
        Ok(&self.columns)
    }

    /// Column kinds, reading the header if needed.
    ///
    /// # Errors
    ///
    /// See [`TableReader::read_row`].
    pub fn kinds(&mut self) -> Result<&[ScalarKind]> {
        self.read_header()?;
        Ok(&self.kinds)
    }

    /// Reads the next row. Returns `Ok(None)` at a clean end of stream.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] when the stream ends inside the header
    /// - [`Error::ScalarTypeMismatch`] for an unknown kind tag or an unparsable cell
    /// - [`Error::FieldCountMismatch`] when a record's width differs from the header
    /// - grammar errors from the underlying [`Reader`]
    pub fn read_row(&mut self) -> Result<Option<Vec<Scalar>>> {
        self.read_header()?;
        let fields = match self.reader.read_record()? {
            Some(fields) => fields,
            None => return Ok(None),
        };
        fields
            .iter()
            .zip(&self.kinds)
            .zip(&self.columns)
            .map(|((text, kind), column)| Scalar::decode(text, *kind, column))
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    fn read_header(&mut self) -> Result<()> {
        if self.header_read {
            return Ok(());
        }
        let columns = self
            .reader
            .read_record()?
            .ok_or_else(|| Error::io("table stream ended before its column header"))?;
        let tags = self
            .reader
            .read_record()?
            .ok_or_else(|| Error::io("table stream ended before its kind header"))?;
        self.kinds = tags
            .iter()
            .map(|tag| tag.parse())
            .collect::<Result<Vec<ScalarKind>>>()?;
        self.columns = columns;
        self.header_read = true;
        tracing::trace!(columns = self.columns.len(), "read table header");
        Ok(())
    }
}
