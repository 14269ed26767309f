//! TT record writing.
//!
//! [`Writer`] encodes each field with the cheapest unambiguous form from
//! [`crate::quote`], joins fields with the delimiter and terminates every
//! record with LF. Output is buffered; call [`Writer::flush`] to push it to the
//! underlying stream.
//!
//! ## Usage
//!
//! ```rust
//! use serde_tt::Writer;
//!
//! let mut writer = Writer::new(Vec::new());
//! writer.write_record(&["id", "note"]).unwrap();
//! writer.write_record(&["1", "multi\nline"]).unwrap();
//! writer.write_record(&["2", "has `ticks`"]).unwrap();
//!
//! let bytes = writer.into_inner().unwrap();
//! assert_eq!(
//!     String::from_utf8(bytes).unwrap(),
//!     "id\tnote\n1\t`multi\nline`\n2\t^^has `ticks`^^\n"
//! );
//! ```

use crate::quote::{self, FieldFormat};
use crate::{Error, Result, TtOptions};
use std::io::{self, BufWriter, Write};

/// Writes TT records to an underlying byte stream.
pub struct Writer<W: io::Write> {
    wtr: BufWriter<W>,
    options: TtOptions,
    line: String,
}

impl<W: io::Write> Writer<W> {
    /// Creates a writer with default options (tab delimiter).
    pub fn new(wtr: W) -> Self {
        Writer {
            wtr: BufWriter::new(wtr),
            options: TtOptions::default(),
            // Sized for a typical short record
            line: String::with_capacity(256),
        }
    }

    /// Creates a writer with custom options. Only the delimiter and comment
    /// rune matter when writing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] if the options fail validation.
    pub fn with_options(wtr: W, options: TtOptions) -> Result<Self> {
        options.validate()?;
        let mut writer = Writer::new(wtr);
        writer.options = options;
        Ok(writer)
    }

    pub fn options(&self) -> &TtOptions {
        &self.options
    }

    /// Writes one record, choosing each field's encoding automatically.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyRecord`] for a record without fields,
    /// [`Error::QuoteIdExhausted`] if a field cannot be caret-quoted, and
    /// [`Error::Io`] if the underlying stream fails.
    pub fn write_record<S: AsRef<str>>(&mut self, record: &[S]) -> Result<()> {
        if record.is_empty() {
            return Err(Error::EmptyRecord);
        }
        self.line.clear();
        for (i, field) in record.iter().enumerate() {
            let text = field.as_ref();
            let format = if record.len() == 1 && text.is_empty() {
                // A bare empty line would be read back as blank and skipped
                FieldFormat::Backtick
            } else {
                quote::choose_format(text, &self.options, i == 0)?
            };
            self.push_field(i, text, &format);
        }
        self.finish_line()
    }

    /// Writes one record with a caller-chosen encoding per field.
    ///
    /// ```rust
    /// use serde_tt::quote::FieldFormat;
    /// use serde_tt::Writer;
    ///
    /// let mut writer = Writer::new(Vec::new());
    /// writer
    ///     .write_with_format(&["@", "app"], &[FieldFormat::Backtick, FieldFormat::Plain])
    ///     .unwrap();
    /// assert_eq!(writer.into_inner().unwrap(), b"`@`\tapp\n");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::FormatConflict`] when the slices differ in length or a
    /// format cannot carry its text unambiguously, plus the errors of
    /// [`Writer::write_record`].
    pub fn write_with_format<S: AsRef<str>>(
        &mut self,
        record: &[S],
        formats: &[FieldFormat],
    ) -> Result<()> {
        if record.is_empty() {
            return Err(Error::EmptyRecord);
        }
        if record.len() != formats.len() {
            return Err(Error::format_conflict(
                formats.len().min(record.len()),
                "format list",
                &format!("{} fields but {} formats", record.len(), formats.len()),
            ));
        }
        self.line.clear();
        for (i, (field, format)) in record.iter().zip(formats).enumerate() {
            let text = field.as_ref();
            if record.len() == 1 && text.is_empty() && *format == FieldFormat::Plain {
                return Err(Error::format_conflict(i, format, "a lone empty field needs quoting"));
            }
            quote::check_format(i, text, format, &self.options)?;
            self.push_field(i, text, format);
        }
        self.finish_line()
    }

    /// Writes every record, then flushes.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`Writer::write_record`] or
    /// [`Writer::flush`].
    pub fn write_all<S: AsRef<str>>(&mut self, records: &[Vec<S>]) -> Result<()> {
        for record in records {
            self.write_record(record)?;
        }
        self.flush()
    }

    /// Flushes buffered records to the underlying stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the underlying stream fails; the amount of
    /// data that reached it is then unspecified.
    pub fn flush(&mut self) -> Result<()> {
        self.wtr.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the final flush fails.
    pub fn into_inner(self) -> Result<W> {
        self.wtr
            .into_inner()
            .map_err(|e| Error::io(&e.error().to_string()))
    }

    fn push_field(&mut self, index: usize, text: &str, format: &FieldFormat) {
        if index > 0 {
            self.line.push(self.options.delimiter.as_char());
        }
        quote::write_field(&mut self.line, text, format);
    }

    fn finish_line(&mut self) -> Result<()> {
        self.line.push('\n');
        self.wtr.write_all(self.line.as_bytes())?;
        Ok(())
    }
}
