use chrono::{DateTime, FixedOffset, Utc};
use serde_tt::{row, Scalar, ScalarKind};

#[test]
fn test_row_macro_empty() {
    let r = row![];
    assert!(r.is_empty());
}

#[test]
fn test_row_macro_numbers() {
    let r = row![42, -123, 3.5, 7i64];
    assert_eq!(
        r,
        vec![
            Scalar::Int(42),
            Scalar::Int(-123),
            Scalar::Float(3.5),
            Scalar::Int(7)
        ]
    );
}

#[test]
fn test_row_macro_text() {
    let owned = String::from("owned");
    let r = row!["borrowed", owned];
    assert_eq!(r[0].as_str(), Some("borrowed"));
    assert_eq!(r[1].as_str(), Some("owned"));
}

#[test]
fn test_row_macro_options() {
    let present: Option<i64> = Some(5);
    let absent: Option<String> = None;
    let r = row![present, absent];
    assert_eq!(r, vec![Scalar::Int(5), Scalar::Null]);
}

#[test]
fn test_row_macro_time_and_blob() {
    let at: DateTime<Utc> = DateTime::<Utc>::default();
    let r = row![at, vec![0u8, 1]];
    let expected: DateTime<FixedOffset> = at.fixed_offset();
    assert_eq!(r[0], Scalar::Time(expected));
    assert_eq!(r[1].kind(), Some(ScalarKind::Blob));
    assert_eq!(r[0].encode(), "1970-01-01T00:00:00Z");
}

#[test]
fn test_row_macro_expressions() {
    let base = 10;
    let r = row![base * 2, format!("n{}", base), Scalar::Null,];
    assert_eq!(r.len(), 3);
    assert_eq!(r[0].as_i64(), Some(20));
    assert_eq!(r[1].as_str(), Some("n10"));
    assert!(r[2].is_null());
}
