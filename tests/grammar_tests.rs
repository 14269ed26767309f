//! Line-grammar conformance tests
//!
//! Each test feeds raw text through [`Reader`] or checks exact [`Writer`]
//! output, covering field quoting, line endings and the reader's error cases.

use serde_tt::quote::{caret_id, choose_format};
use serde_tt::{Error, FieldCount, FieldFormat, Reader, TtOptions, Writer};

fn read(input: &str) -> Vec<Vec<String>> {
    Reader::new(input.as_bytes()).read_all().unwrap()
}

fn unconstrained(input: &str) -> Vec<Vec<String>> {
    let options = TtOptions::new().with_fields_per_record(FieldCount::Unconstrained);
    Reader::with_options(input.as_bytes(), options)
        .unwrap()
        .read_all()
        .unwrap()
}

fn write(record: &[&str]) -> String {
    let mut writer = Writer::new(Vec::new());
    writer.write_record(record).unwrap();
    String::from_utf8(writer.into_inner().unwrap()).unwrap()
}

mod reading {
    use super::*;

    #[test]
    fn test_plain_fields() {
        assert_eq!(read("a\tb\tc\n"), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn test_final_line_without_newline() {
        assert_eq!(read("a\tb\nc\td"), vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_crlf_line_endings() {
        assert_eq!(read("a\tb\r\nc\td\r\n"), vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn test_lone_cr_is_content() {
        assert_eq!(read("a\rb\n"), vec![vec!["a\rb"]]);
    }

    #[test]
    fn test_blank_lines_skipped() {
        assert_eq!(read("\n\na\n\r\n\nb\n"), vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn test_empty_fields() {
        assert_eq!(read("\t\tx\n"), vec![vec!["", "", "x"]]);
        assert_eq!(read("x\t\n"), vec![vec!["x", ""]]);
    }

    #[test]
    fn test_backtick_field_spans_lines() {
        assert_eq!(
            unconstrained("`one\ntwo\tthree`\tnext\nlast\n"),
            vec![vec!["one\ntwo\tthree", "next"], vec!["last"]]
        );
    }

    #[test]
    fn test_empty_backtick_field() {
        assert_eq!(read("``\n"), vec![vec![""]]);
    }

    #[test]
    fn test_caret_fields() {
        assert_eq!(read("^^has `ticks`^^\n"), vec![vec!["has `ticks`"]]);
        assert_eq!(read("^42^a^4^b^42^\tz\n"), vec![vec!["a^4^b", "z"]]);
    }

    #[test]
    fn test_caret_inside_plain_field_is_literal() {
        assert_eq!(read("2^10\tx^\n"), vec![vec!["2^10", "x^"]]);
    }

    #[test]
    fn test_comment_lines() {
        let options = TtOptions::new().with_comment('#');
        let mut reader = Reader::with_options("# header\na\t#b\n#\n".as_bytes(), options).unwrap();
        assert_eq!(reader.read_all().unwrap(), vec![vec!["a", "#b"]]);
    }

    #[test]
    fn test_records_iterator_and_line() {
        let mut reader = Reader::new("a\n\nb\n".as_bytes());
        let records: Vec<Vec<String>> = reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(records, vec![vec!["a"], vec!["b"]]);
        assert_eq!(reader.line(), 3);
    }

    #[test]
    fn test_formats_reported() {
        let mut reader = Reader::new("p\t`b`\t^7^c^7^\n".as_bytes());
        let (_, formats) = reader.read_with_format().unwrap().unwrap();
        assert_eq!(
            formats,
            vec![
                FieldFormat::Plain,
                FieldFormat::Backtick,
                FieldFormat::Caret("7".to_string())
            ]
        );
    }
}

mod errors {
    use super::*;

    fn first_error(input: &str) -> Error {
        Reader::new(input.as_bytes()).read_all().unwrap_err()
    }

    #[test]
    fn test_unterminated_backtick() {
        assert!(matches!(
            first_error("ok\n`never closed\n"),
            Error::MalformedQuote { line: 2, .. }
        ));
    }

    #[test]
    fn test_unterminated_caret() {
        assert!(matches!(
            first_error("^1^text^2^\n"),
            Error::MalformedQuote { line: 1, .. }
        ));
    }

    #[test]
    fn test_backtick_inside_field() {
        assert!(matches!(
            first_error("ab`c`\n"),
            Error::MalformedQuote { line: 1, col: 3, .. }
        ));
    }

    #[test]
    fn test_text_after_closing_quote() {
        assert!(matches!(
            first_error("`a`b\n"),
            Error::MalformedQuote { line: 1, col: 4, .. }
        ));
    }

    #[test]
    fn test_auto_field_count() {
        assert!(matches!(
            first_error("a\tb\nc\n"),
            Error::FieldCountMismatch { line: 2, expected: 2, found: 1 }
        ));
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
}

mod writing {
    use super::*;

    #[test]
    fn test_plain_output() {
        assert_eq!(write(&["a", "b c", "d^e"]), "a\tb c\td^e\n");
    }

    #[test]
    fn test_quoting_triggers() {
        assert_eq!(write(&["a\tb"]), "`a\tb`\n");
        assert_eq!(write(&["a\nb"]), "`a\nb`\n");
        assert_eq!(write(&["a\rb"]), "`a\rb`\n");
        assert_eq!(write(&["^lead"]), "`^lead`\n");
        assert_eq!(write(&["x", "`"]), "x\t^^`^^\n");
    }

    #[test]
    fn test_lone_empty_field_is_quoted() {
        assert_eq!(write(&[""]), "``\n");
        assert_eq!(write(&["", ""]), "\t\n");
    }

    #[test]
    fn test_leading_comment_rune_is_quoted() {
        let options = TtOptions::new().with_comment('#');
        let mut writer = Writer::with_options(Vec::new(), options).unwrap();
        writer.write_record(&["#a", "#b"]).unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(text, "`#a`\t#b\n");
    }

    #[test]
    fn test_empty_record_rejected() {
        let mut writer = Writer::new(Vec::new());
        let empty: [&str; 0] = [];
        assert!(matches!(writer.write_record(&empty), Err(Error::EmptyRecord)));
    }

    #[test]
    fn test_forced_format_conflicts() {
        let mut writer = Writer::new(Vec::new());
        assert!(matches!(
            writer.write_with_format(&["a`b"], &[FieldFormat::Backtick]),
            Err(Error::FormatConflict { index: 0, .. })
        ));
        assert!(matches!(
            writer.write_with_format(&["x", "a\tb"], &[FieldFormat::Plain, FieldFormat::Plain]),
            Err(Error::FormatConflict { index: 1, .. })
        ));
        assert!(matches!(
            writer.write_with_format(&["a^1^b"], &[FieldFormat::Caret("1".into())]),
            Err(Error::FormatConflict { .. })
        ));
    }
}

mod caret_ids {
    use super::*;

    #[test]
    fn test_smallest_free_id() {
        assert_eq!(caret_id("`").unwrap(), "");
        assert_eq!(caret_id("^^`").unwrap(), "1");
        assert_eq!(caret_id("^^`^1^").unwrap(), "2");
        // Adjacent tags share a caret, so "^^" is taken as well
        assert_eq!(caret_id("`^1^^2^").unwrap(), "3");
    }

    #[test]
    fn test_tail_overlap_avoided() {
        // With "^^" the trailing caret would close the field one rune early
        assert_eq!(caret_id("`^").unwrap(), "1");
    }

    #[test]
    fn test_choose_format() {
        let options = TtOptions::default();
        assert_eq!(choose_format("plain", &options, true).unwrap(), FieldFormat::Plain);
        assert_eq!(choose_format("a\tb", &options, true).unwrap(), FieldFormat::Backtick);
        assert_eq!(
            choose_format("a`b", &options, false).unwrap(),
            FieldFormat::Caret(String::new())
        );
    }
}
