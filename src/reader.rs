//! TT record reading.
//!
//! [`Reader`] turns a byte stream into records, one `Vec<String>` per line of
//! fields. It applies the quoting grammar from [`crate::quote`] and the
//! stream-level rules:
//!
//! - **Blank lines**: a line holding nothing but its terminator is skipped
//! - **Comments**: with a comment rune configured, a line starting with it is skipped
//! - **Line endings**: CR before LF is dropped, a lone CR is field content
//! - **Field count**: unconstrained, fixed by the first record, or fixed up front
//!
//! ## Usage
//!
//! ```rust
//! use serde_tt::Reader;
//!
//! let input = "name\tnote\nAlice\t`multi\nline`\n\nBob\t\n";
//! let mut reader = Reader::new(input.as_bytes());
//!
//! let records = reader.read_all().unwrap();
//! assert_eq!(records, vec![
//!     vec!["name", "note"],
//!     vec!["Alice", "multi\nline"],
//!     vec!["Bob", ""],
//! ]);
//! ```

use crate::quote::{FieldFormat, BACKTICK, CARET};
use crate::{Error, FieldCount, Result, TtOptions};
use std::io::{self, BufRead, BufReader};

enum Parsed {
    Record(Vec<String>, Vec<FieldFormat>),
    Skip,
    Eof,
}

/// Reads TT records from an underlying byte stream.
///
/// The stream is read one physical line at a time; quoted fields may span
/// several lines.
pub struct Reader<R> {
    rdr: BufReader<R>,
    options: TtOptions,
    delimiter: char,
    line_buf: String,
    spare: String,
    position: usize,
    line: usize,
}

impl<R: io::Read> Reader<R> {
    /// Creates a reader with default options (tab delimiter, auto field count).
    pub fn new(rdr: R) -> Self {
        Reader {
            rdr: BufReader::new(rdr),
            delimiter: TtOptions::default().delimiter.as_char(),
            options: TtOptions::default(),
            line_buf: String::new(),
            spare: String::new(),
            position: 0,
            line: 0,
        }
    }

    /// Creates a reader with custom options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOptions`] if the options fail validation.
    pub fn with_options(rdr: R, options: TtOptions) -> Result<Self> {
        options.validate()?;
        let mut reader = Reader::new(rdr);
        reader.delimiter = options.delimiter.as_char();
        reader.options = options;
        Ok(reader)
    }

    pub fn options(&self) -> &TtOptions {
        &self.options
    }

    /// Replaces the field-count policy for the records still to be read.
    pub fn set_fields_per_record(&mut self, policy: FieldCount) {
        self.options.fields_per_record = policy;
    }

    /// Number of the physical line most recently read, starting at 1.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Reads the next record.
    ///
    /// Blank and comment lines are skipped. Returns `Ok(None)` at a clean end
    /// of stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedQuote`] for grammar violations and
    /// [`Error::FieldCountMismatch`] when the record breaks the field-count
    /// policy. A mismatched record is consumed; the caller may keep reading.
    pub fn read_record(&mut self) -> Result<Option<Vec<String>>> {
        Ok(self.read_with_format()?.map(|(values, _)| values))
    }

    /// Reads the next record together with the physical format of each field.
    ///
    /// ```rust
    /// use serde_tt::quote::FieldFormat;
    /// use serde_tt::Reader;
    ///
    /// let mut reader = Reader::new("`*`\t^1^a`b^1^\n".as_bytes());
    /// let (values, formats) = reader.read_with_format().unwrap().unwrap();
    /// assert_eq!(values, vec!["*", "a`b"]);
    /// assert_eq!(formats, vec![FieldFormat::Backtick, FieldFormat::Caret("1".into())]);
    /// ```
    ///
    /// # Errors
    ///
    /// Same as [`Reader::read_record`].
    pub fn read_with_format(&mut self) -> Result<Option<(Vec<String>, Vec<FieldFormat>)>> {
        let (values, formats) = loop {
            match self.parse_record()? {
                Parsed::Record(values, formats) => break (values, formats),
                Parsed::Skip => continue,
                Parsed::Eof => return Ok(None),
            }
        };

        match self.options.fields_per_record {
            FieldCount::Fixed(expected) if expected != values.len() => {
                return Err(Error::FieldCountMismatch {
                    line: self.line,
                    expected,
                    found: values.len(),
                });
            }
            FieldCount::Auto => {
                tracing::trace!(fields = values.len(), "field count fixed by first record");
                self.options.fields_per_record = FieldCount::Fixed(values.len());
            }
            _ => {}
        }
        Ok(Some((values, formats)))
    }

    /// Reads all remaining records.
    ///
    /// A clean end of stream is not an error; any other error aborts the read.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`Reader::read_record`].
    pub fn read_all(&mut self) -> Result<Vec<Vec<String>>> {
        self.records().collect()
    }

    /// Returns an iterator over the remaining records.
    pub fn records(&mut self) -> Records<'_, R> {
        Records { reader: self }
    }

    // The previous line stays in place at end of input so errors keep their column.
    fn fill_line(&mut self) -> Result<bool> {
        let n = self.rdr.read_line(&mut self.spare)?;
        if n == 0 {
            return Ok(false);
        }
        std::mem::swap(&mut self.line_buf, &mut self.spare);
        self.spare.clear();
        self.position = 0;
        self.line += 1;
        Ok(true)
    }

    fn next_char(&mut self) -> Result<Option<char>> {
        if self.position >= self.line_buf.len() && !self.fill_line()? {
            return Ok(None);
        }
        match self.line_buf[self.position..].chars().next() {
            Some(ch) => {
                self.position += ch.len_utf8();
                Ok(Some(ch))
            }
            None => Ok(None),
        }
    }

    fn peek_char(&mut self) -> Result<Option<char>> {
        if self.position >= self.line_buf.len() && !self.fill_line()? {
            return Ok(None);
        }
        Ok(self.line_buf[self.position..].chars().next())
    }

    fn column(&self) -> usize {
        self.line_buf[..self.position].chars().count()
    }

    fn error(&self, msg: &str) -> Error {
        Error::malformed_quote(self.line, self.column(), msg)
    }

    fn skip_line(&mut self) {
        self.position = self.line_buf.len();
    }

    fn parse_record(&mut self) -> Result<Parsed> {
        let mut values: Vec<String> = Vec::new();
        let mut formats: Vec<FieldFormat> = Vec::new();
        let mut field = String::new();

        loop {
            let at_line_start = values.is_empty() && field.is_empty();
            let ch = match self.next_char()? {
                Some(ch) => ch,
                None if at_line_start => return Ok(Parsed::Eof),
                None => {
                    values.push(field);
                    formats.push(FieldFormat::Plain);
                    return Ok(Parsed::Record(values, formats));
                }
            };

            match ch {
                c if at_line_start && Some(c) == self.options.comment => {
                    self.skip_line();
                    return Ok(Parsed::Skip);
                }
                c if c == self.delimiter => {
                    values.push(std::mem::take(&mut field));
                    formats.push(FieldFormat::Plain);
                }
                '\r' => {
                    if self.peek_char()? != Some('\n') {
                        field.push('\r');
                    }
                }
                '\n' => {
                    if at_line_start {
                        return Ok(Parsed::Skip);
                    }
                    values.push(field);
                    formats.push(FieldFormat::Plain);
                    return Ok(Parsed::Record(values, formats));
                }
                BACKTICK => {
                    if !field.is_empty() {
                        return Err(self.error("extraneous ` in field"));
                    }
                    let content = self.read_backtick()?;
                    values.push(content);
                    formats.push(FieldFormat::Backtick);
                    if self.after_quote()? {
                        return Ok(Parsed::Record(values, formats));
                    }
                }
                CARET if field.is_empty() => {
                    let (id, content) = self.read_caret()?;
                    values.push(content);
                    formats.push(FieldFormat::Caret(id));
                    if self.after_quote()? {
                        return Ok(Parsed::Record(values, formats));
                    }
                }
                other => field.push(other),
            }
        }
    }

    fn read_backtick(&mut self) -> Result<String> {
        let mut content = String::new();
        loop {
            match self.next_char()? {
                Some(BACKTICK) => return Ok(content),
                Some(ch) => content.push(ch),
                None => return Err(self.error("` not closed before end of input")),
            }
        }
    }

    fn read_caret(&mut self) -> Result<(String, String)> {
        let mut id = String::new();
        loop {
            match self.next_char()? {
                Some(CARET) => break,
                Some(ch) => id.push(ch),
                None => return Err(self.error("^ tag not closed before end of input")),
            }
        }

        let tag = format!("^{}^", id);
        let mut content = String::new();
        loop {
            match self.next_char()? {
                Some(ch) => {
                    content.push(ch);
                    if content.ends_with(&tag) {
                        content.truncate(content.len() - tag.len());
                        return Ok((id, content));
                    }
                }
                None => {
                    return Err(self.error(&format!("{} not found before end of input", tag)))
                }
            }
        }
    }

    /// Consumes what follows a closing quote. Returns true when the record ends.
    fn after_quote(&mut self) -> Result<bool> {
        match self.next_char()? {
            None | Some('\n') => Ok(true),
            Some(c) if c == self.delimiter => Ok(false),
            Some('\r') if self.peek_char()? == Some('\n') => {
                self.next_char()?;
                Ok(true)
            }
            Some(_) => Err(self.error("unexpected text after closing quote")),
        }
    }
}

/// Iterator over the records of a [`Reader`], created by [`Reader::records`].
pub struct Records<'r, R> {
    reader: &'r mut Reader<R>,
}

impl<R: io::Read> Iterator for Records<'_, R> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.read_record().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(input: &str) -> Result<Vec<Vec<String>>> {
        let options = TtOptions::new().with_fields_per_record(FieldCount::Unconstrained);
        Reader::with_options(input.as_bytes(), options)?.read_all()
    }

    #[test]
    fn test_plain_records() {
        let records = read_all("a\tb\tc\nd\te\tf").unwrap();
        assert_eq!(records, vec![vec!["a", "b", "c"], vec!["d", "e", "f"]]);
    }

    #[test]
    fn test_empty_input() {
        assert!(read_all("").unwrap().is_empty());
        assert!(read_all("\n\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_trailing_delimiter_keeps_empty_field() {
        assert_eq!(read_all("a\t\n").unwrap(), vec![vec!["a", ""]]);
        assert_eq!(read_all("\t\n").unwrap(), vec![vec!["", ""]]);
        assert_eq!(read_all("a\t").unwrap(), vec![vec!["a", ""]]);
    }

    #[test]
    fn test_carriage_returns() {
        let records = read_all("a\r\nb\rc\r\n").unwrap();
        assert_eq!(records, vec![vec!["a"], vec!["b\rc"]]);
    }

    #[test]
    fn test_backtick_field_spans_lines() {
        let records = read_all("`x\ty\nz`\tw\n").unwrap();
        assert_eq!(records, vec![vec!["x\ty\nz", "w"]]);
    }

    #[test]
    fn test_caret_field() {
        let records = read_all("^1^^^`foo\nbar`^1^\tend\n").unwrap();
        assert_eq!(records, vec![vec!["^^`foo\nbar`", "end"]]);
    }

    #[test]
    fn test_empty_caret_id() {
        let records = read_all("^^a`b^^\n").unwrap();
        assert_eq!(records, vec![vec!["a`b"]]);
    }

    #[test]
    fn test_mid_field_caret_is_literal() {
        assert_eq!(read_all("a^b\tc^\n").unwrap(), vec![vec!["a^b", "c^"]]);
    }

    #[test]
    fn test_mid_field_backtick_is_error() {
        let err = read_all("ok\nab`c`\n").unwrap_err();
        assert!(matches!(err, Error::MalformedQuote { line: 2, col: 3, .. }));
    }

    #[test]
    fn test_unterminated_quotes() {
        assert!(matches!(
            read_all("`open\nstill open"),
            Err(Error::MalformedQuote { line: 2, .. })
        ));
        assert!(matches!(
            read_all("^7^open^7"),
            Err(Error::MalformedQuote { .. })
        ));
        assert!(matches!(read_all("^7"), Err(Error::MalformedQuote { .. })));
    }

    #[test]
    fn test_text_after_closing_quote_is_error() {
        assert!(matches!(
            read_all("`a`b\n"),
            Err(Error::MalformedQuote { line: 1, col: 4, .. })
        ));
    }

    #[test]
    fn test_comments() {
        let options = TtOptions::new().with_comment('#');
        let mut reader = Reader::with_options("#c1\na\tb#x\n#c2\n".as_bytes(), options).unwrap();
        assert_eq!(reader.read_all().unwrap(), vec![vec!["a", "b#x"]]);
    }

    #[test]
    fn test_auto_field_count() {
        let mut reader = Reader::new("a\tb\nc\n".as_bytes());
        assert_eq!(reader.read_record().unwrap(), Some(vec!["a".into(), "b".into()]));
        match reader.read_record() {
            Err(Error::FieldCountMismatch {
                line,
                expected,
                found,
            }) => assert_eq!((line, expected, found), (2, 2, 1)),
            other => panic!("expected field count mismatch, got {:?}", other),
        }
        assert_eq!(reader.read_record().unwrap(), None);
    }

    #[test]
    fn test_fixed_field_count() {
        let options = TtOptions::new().with_fields_per_record(FieldCount::Fixed(3));
        let mut reader = Reader::with_options("a\tb\n".as_bytes(), options).unwrap();
        assert!(matches!(
            reader.read_record(),
            Err(Error::FieldCountMismatch { expected: 3, found: 2, .. })
        ));
    }

    #[test]
    fn test_formats_reported() {
        let mut reader = Reader::new("p\t`b`\t^^c`^^\n".as_bytes());
        let (_, formats) = reader.read_with_format().unwrap().unwrap();
        assert_eq!(
            formats,
            vec![
                FieldFormat::Plain,
                FieldFormat::Backtick,
                FieldFormat::Caret(String::new())
            ]
        );
    }

    #[test]
    fn test_custom_delimiter() {
        let options = TtOptions::new().with_delimiter(',');
        let mut reader = Reader::with_options("a,`b,c`\n".as_bytes(), options).unwrap();
        assert_eq!(reader.read_all().unwrap(), vec![vec!["a", "b,c"]]);
    }
}
