//! The TT quoting grammar.
//!
//! A field travels in one of three forms:
//!
//! | Form | On the wire | Used when |
//! |------|-------------|-----------|
//! | Plain | `text` | no delimiter, CR, LF or backtick, and no leading `^` |
//! | Backtick | `` `text` `` | quoting is needed but the text has no backtick |
//! | Caret | `^id^text^id^` | the text contains a backtick |
//!
//! A record is one line of fields joined by the delimiter and terminated by LF:
//!
//! ```text
//! record      := field (DELIM field)* TERM
//! field       := plain | backtick-field | caret-field
//! plain       := runes without {DELIM, CR, LF, '`', leading '^'}
//! backtick    := '`' runes-without-'`' '`'
//! caret-field := '^' id '^' content '^' id '^'      -- id: up to 9 digits or empty
//! TERM        := LF                                 -- a preceding CR is dropped
//! ```
//!
//! The caret id is the first of `""`, `"1"`, `"2"`, ... `"999"` that does not
//! already occur in the text as a `^digits^` tag and whose closing tag cannot be
//! found earlier than the true end of the field.
//!
//! ```rust
//! use serde_tt::quote::{choose_format, FieldFormat};
//! use serde_tt::TtOptions;
//!
//! let options = TtOptions::new();
//! assert_eq!(choose_format("plain", &options, false).unwrap(), FieldFormat::Plain);
//! assert_eq!(choose_format("two\nlines", &options, false).unwrap(), FieldFormat::Backtick);
//! assert_eq!(
//!     choose_format("^^`tick`", &options, false).unwrap(),
//!     FieldFormat::Caret("1".to_string())
//! );
//! ```

use crate::{Error, Result, TtOptions};
use std::fmt;

pub const BACKTICK: char = '`';
pub const CARET: char = '^';

/// Largest numeric caret id tried before giving up.
pub const MAX_CARET_ID: u32 = 999;

/// Longest digit run recognised as an existing `^digits^` tag.
const MAX_TAG_DIGITS: usize = 9;

/// Physical encoding of a single field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldFormat {
    Plain,
    Backtick,
    /// Wrapped in `^id^ ... ^id^`.
    Caret(String),
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldFormat::Plain => f.write_str("plain"),
            FieldFormat::Backtick => f.write_str("`"),
            FieldFormat::Caret(id) => write!(f, "^{}^", id),
        }
    }
}

/// Picks the encoding for `text`.
///
/// `leading` marks the first field of a record; with a comment rune configured,
/// a leading field starting with it is quoted so it is not read back as a comment.
///
/// # Errors
///
/// Returns [`Error::QuoteIdExhausted`] when the text needs caret quoting and
/// every candidate id collides.
pub fn choose_format(text: &str, options: &TtOptions, leading: bool) -> Result<FieldFormat> {
    if !needs_quotes(text, options, leading) {
        return Ok(FieldFormat::Plain);
    }
    if !text.contains(BACKTICK) {
        return Ok(FieldFormat::Backtick);
    }
    caret_id(text).map(FieldFormat::Caret)
}

#[inline]
fn needs_quotes(text: &str, options: &TtOptions, leading: bool) -> bool {
    let delimiter = options.delimiter.as_char();
    text.starts_with(CARET)
        || (leading && options.comment.is_some_and(|c| text.starts_with(c)))
        || text
            .chars()
            .any(|c| c == delimiter || c == '\r' || c == '\n' || c == BACKTICK)
}

/// Collects every `^digits^` tag already present in `text`.
///
/// Tags may share carets: `^1^^` yields both `1` and the empty tag.
pub fn existing_tags(text: &str) -> Vec<&str> {
    let carets: Vec<usize> = text.match_indices(CARET).map(|(i, _)| i).collect();
    carets
        .windows(2)
        .map(|pair| &text[pair[0] + 1..pair[1]])
        .filter(|between| between.len() <= MAX_TAG_DIGITS)
        .filter(|between| between.bytes().all(|b| b.is_ascii_digit()))
        .collect()
}

/// Chooses the caret id for `text`.
///
/// # Errors
///
/// Returns [`Error::QuoteIdExhausted`] if no id up to [`MAX_CARET_ID`] is free.
///
/// ```rust
/// use serde_tt::quote::caret_id;
///
/// assert_eq!(caret_id("a`b").unwrap(), "");
/// assert_eq!(caret_id("^^`").unwrap(), "1");
/// assert_eq!(caret_id("^1^^`").unwrap(), "2");
/// ```
pub fn caret_id(text: &str) -> Result<String> {
    let taken = existing_tags(text);
    std::iter::once(String::new())
        .chain((1..=MAX_CARET_ID).map(|n| n.to_string()))
        .find(|id| !taken.contains(&id.as_str()) && closes_at_end(text, id))
        .ok_or(Error::QuoteIdExhausted)
}

/// True when the closing tag for `id` is first found right after `text`.
fn closes_at_end(text: &str, id: &str) -> bool {
    let tag = format!("^{}^", id);
    let mut framed = String::with_capacity(text.len() + tag.len());
    framed.push_str(text);
    framed.push_str(&tag);
    framed.find(&tag) == Some(text.len())
}

/// Checks that `format` can carry `text` without ambiguity.
///
/// # Errors
///
/// Returns [`Error::FormatConflict`] naming the field index.
pub fn check_format(
    index: usize,
    text: &str,
    format: &FieldFormat,
    options: &TtOptions,
) -> Result<()> {
    let problem = match format {
        FieldFormat::Plain if needs_quotes(text, options, index == 0) => {
            Some("text needs quoting")
        }
        FieldFormat::Backtick if text.contains(BACKTICK) => Some("text contains a backtick"),
        FieldFormat::Caret(id) if id.contains(CARET) || id.contains('\n') => {
            Some("id contains a caret or newline")
        }
        FieldFormat::Caret(id) if !closes_at_end(text, id) => Some("id occurs inside the text"),
        _ => None,
    };
    match problem {
        Some(msg) => Err(Error::format_conflict(index, format, msg)),
        None => Ok(()),
    }
}

/// Appends `text` to `out` in the given encoding.
pub fn write_field(out: &mut String, text: &str, format: &FieldFormat) {
    match format {
        FieldFormat::Plain => out.push_str(text),
        FieldFormat::Backtick => {
            out.push(BACKTICK);
            out.push_str(text);
            out.push(BACKTICK);
        }
        FieldFormat::Caret(id) => {
            let tag = format!("^{}^", id);
            out.push_str(&tag);
            out.push_str(text);
            out.push_str(&tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format_of(text: &str) -> FieldFormat {
        choose_format(text, &TtOptions::new(), false).unwrap()
    }

    #[test]
    fn test_plain_fields() {
        assert_eq!(format_of(""), FieldFormat::Plain);
        assert_eq!(format_of("hello world"), FieldFormat::Plain);
        assert_eq!(format_of("a^b"), FieldFormat::Plain);
        assert_eq!(format_of("comma,is,fine"), FieldFormat::Plain);
    }

    #[test]
    fn test_backtick_fields() {
        assert_eq!(format_of("tab\there"), FieldFormat::Backtick);
        assert_eq!(format_of("cr\r"), FieldFormat::Backtick);
        assert_eq!(format_of("lf\n"), FieldFormat::Backtick);
        assert_eq!(format_of("^leading"), FieldFormat::Backtick);
    }

    #[test]
    fn test_caret_fields() {
        assert_eq!(format_of("`"), FieldFormat::Caret(String::new()));
        assert_eq!(format_of("^1^^`foo\nbar`"), FieldFormat::Caret("2".to_string()));
    }

    #[test]
    fn test_existing_tags_share_carets() {
        assert_eq!(existing_tags("^1^^`x"), vec!["1", ""]);
        assert_eq!(existing_tags("^abc^"), Vec::<&str>::new());
        assert_eq!(existing_tags("^1234567890^"), Vec::<&str>::new());
    }

    #[test]
    fn test_caret_id_avoids_tail_overlap() {
        // "`^" + "^^" would close one rune early
        assert_eq!(caret_id("`^").unwrap(), "1");
        // "^^`^1" + "^1^" would close two runes early
        assert_eq!(caret_id("^^`^1").unwrap(), "2");
        assert_eq!(caret_id("`^^^1").unwrap(), "2");
    }

    #[test]
    fn test_caret_id_exhausted() {
        let mut text = String::from("`^^");
        for n in 1..=MAX_CARET_ID {
            text.push_str(&format!("{}^", n));
        }
        assert!(matches!(caret_id(&text), Err(Error::QuoteIdExhausted)));
    }

    #[test]
    fn test_comment_rune_quoted_only_when_leading() {
        let options = TtOptions::new().with_comment('#');
        assert_eq!(choose_format("#tag", &options, true).unwrap(), FieldFormat::Backtick);
        assert_eq!(choose_format("#tag", &options, false).unwrap(), FieldFormat::Plain);
    }

    #[test]
    fn test_check_format() {
        let options = TtOptions::new();
        assert!(check_format(1, "a\tb", &FieldFormat::Plain, &options).is_err());
        assert!(check_format(1, "a`b", &FieldFormat::Backtick, &options).is_err());
        assert!(check_format(1, "x^7^y", &FieldFormat::Caret("7".into()), &options).is_err());
        assert!(check_format(1, "foo", &FieldFormat::Caret("1".into()), &options).is_ok());
        assert!(check_format(1, "foo", &FieldFormat::Backtick, &options).is_ok());
    }

    #[test]
    fn test_write_field() {
        let mut out = String::new();
        write_field(&mut out, "a`b", &FieldFormat::Caret("3".to_string()));
        assert_eq!(out, "^3^a`b^3^");
    }
}
