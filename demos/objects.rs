//! A mixed-type object stream.
//!
//! Run with: cargo run --example objects

use serde::{Deserialize, Serialize};
use serde_tt::{Decoder, Encoder, TypeKey};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Address {
    city: String,
    zip: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Customer {
    id: u32,
    name: String,
    address: Address,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Invoice {
    number: i64,
    customer_id: u32,
    total: f64,
    paid: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let customer_key = TypeKey::new("billing", "Customer");
    let invoice_key = TypeKey::new("billing", "Invoice");

    let mut encoder = Encoder::new(Vec::new());
    encoder.encode_as(
        &customer_key,
        &Customer {
            id: 1,
            name: "Ada".into(),
            address: Address {
                city: "London".into(),
                zip: "N1".into(),
            },
        },
    )?;
    for number in 100..103 {
        encoder.encode_as(
            &invoice_key,
            &Invoice {
                number,
                customer_id: 1,
                total: number as f64 * 1.5,
                paid: number % 2 == 0,
            },
        )?;
    }
    encoder.encode_as(
        &customer_key,
        &Customer {
            id: 2,
            name: "Grace".into(),
            address: Address {
                city: "New York".into(),
                zip: "10001".into(),
            },
        },
    )?;
    let bytes = encoder.into_inner()?;
    println!("TT output:\n{}", String::from_utf8_lossy(&bytes));

    // Pick the destination type from the active registration
    let mut decoder = Decoder::new(bytes.as_slice());
    while let Some(descriptor) = decoder.next_type()? {
        let name = descriptor.key().name.clone();
        match name.as_str() {
            "Customer" => {
                if let Some(customer) = decoder.decode::<Customer>()? {
                    println!("customer: {:?}", customer);
                }
            }
            "Invoice" => {
                if let Some(invoice) = decoder.decode::<Invoice>()? {
                    println!("invoice:  {:?}", invoice);
                }
            }
            other => return Err(format!("unexpected type {}", other).into()),
        }
    }

    Ok(())
}
