//! Reading and writing raw TT records.
//!
//! Run with: cargo run --example records

use serde_tt::{FieldCount, Reader, TtOptions, Writer};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let records = vec![
        vec!["id", "comment"],
        vec!["1", "plain text"],
        vec!["2", "tab\tand\nnewline"],
        vec!["3", "`backticks` and ^1^ tags"],
        vec!["4", ""],
    ];

    let mut writer = Writer::new(Vec::new());
    writer.write_all(&records)?;
    let bytes = writer.into_inner()?;
    println!("TT output:\n{}", String::from_utf8_lossy(&bytes));

    // Field count is fixed by the first record
    let options = TtOptions::new().with_fields_per_record(FieldCount::Auto);
    let mut reader = Reader::with_options(bytes.as_slice(), options)?;
    while let Some((values, formats)) = reader.read_with_format()? {
        let shown: Vec<String> = values
            .iter()
            .zip(&formats)
            .map(|(value, format)| format!("{:?} ({})", value, format))
            .collect();
        println!("line {:>2}: {}", reader.line(), shown.join(", "));
    }

    Ok(())
}
