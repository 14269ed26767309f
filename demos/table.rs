//! A flat table with typed columns.
//!
//! Run with: cargo run --example table

use chrono::{TimeZone, Utc};
use serde_tt::{row, Scalar, ScalarKind, TableReader, TableWriter};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let columns = vec![
        "sensor".to_string(),
        "reading".to_string(),
        "taken_at".to_string(),
        "raw".to_string(),
    ];
    let kinds = vec![
        ScalarKind::Str,
        ScalarKind::Float,
        ScalarKind::Time,
        ScalarKind::Blob,
    ];

    let mut writer = TableWriter::new(Vec::new(), columns, kinds)?;
    let taken_at = Utc
        .with_ymd_and_hms(2024, 3, 1, 9, 30, 0)
        .single()
        .ok_or("invalid timestamp")?;
    writer.write_row(&row!["north", 21.5, taken_at, vec![0xde_u8, 0xad]])?;
    writer.write_row(&row!["south", Scalar::Null, taken_at, Scalar::Null])?;
    let bytes = writer.into_inner()?;
    println!("TT output:\n{}", String::from_utf8_lossy(&bytes));

    let mut reader = TableReader::new(bytes.as_slice());
    let columns = reader.columns()?.to_vec();
    while let Some(row) = reader.read_row()? {
        for (column, value) in columns.iter().zip(&row) {
            match value {
                Scalar::Null => println!("{:>8}: (absent)", column),
                other => println!("{:>8}: {}", column, other),
            }
        }
        println!();
    }

    Ok(())
}
