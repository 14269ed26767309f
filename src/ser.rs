//! Flattening Rust values into rows.
//!
//! [`to_row`] walks a `Serialize` struct in declaration order and produces its
//! columns and scalar values:
//!
//! - **Embedded structs**: a struct-typed field is recursed into depth-first and
//!   its fields are spliced in at that position
//! - **First name wins**: a field whose name was already seen earlier in the
//!   walk is skipped
//! - **Hidden fields**: `#[serde(skip)]` fields never become columns
//! - **Scalars**: integers, floats, text, `Option`, unit enum variants, `bool`
//!   and byte vectors map onto [`Scalar`]
//! - **Optional structs**: `Some` around a struct or map is
//!   [`Error::UnsupportedType`](crate::Error::UnsupportedType), since its
//!   columns would differ from those of `None`
//!
//! ```rust
//! use serde::Serialize;
//! use serde_tt::{ser::to_row, Scalar};
//!
//! #[derive(Serialize)]
//! struct Audit { id: i64, by: String }
//!
//! #[derive(Serialize)]
//! struct Doc { audit: Audit, id: i64, title: Option<String> }
//!
//! let doc = Doc { audit: Audit { id: 1, by: "ann".into() }, id: 99, title: None };
//! let row = to_row(&doc).unwrap();
//!
//! let columns: Vec<_> = row.keys().map(String::as_str).collect();
//! assert_eq!(columns, vec!["id", "by", "title"]);
//! assert_eq!(row["id"], Scalar::Int(1));
//! assert_eq!(row["title"], Scalar::Null);
//! ```

use crate::{Error, Result, Scalar};
use indexmap::IndexMap;
use serde::{ser, Serialize};

/// Columns of one value in discovery order, each with its scalar.
pub type Row = IndexMap<String, Scalar>;

/// Flattens `value` into a [`Row`].
///
/// # Errors
///
/// Returns [`Error::UnsupportedType`] when `value` is not a struct (or map),
/// or when a field holds a shape with no scalar form such as a tuple or a
/// data-carrying enum variant.
pub fn to_row<T>(value: &T) -> Result<Row>
where
    T: ?Sized + Serialize,
{
    value.serialize(RowSerializer)
}

macro_rules! reject {
    ($msg:expr; $($method:ident($($arg:ident : $ty:ty),*) -> $ret:ty;)*) => {
        $(
            fn $method(self, $($arg: $ty),*) -> Result<$ret> {
                $(let _ = $arg;)*
                Err(Error::unsupported_type($msg))
            }
        )*
    };
}

/// Entry point serializer: accepts structs and maps only.
struct RowSerializer;

impl ser::Serializer for RowSerializer {
    type Ok = Row;
    type Error = Error;

    type SerializeSeq = ser::Impossible<Row, Error>;
    type SerializeTuple = ser::Impossible<Row, Error>;
    type SerializeTupleStruct = ser::Impossible<Row, Error>;
    type SerializeTupleVariant = ser::Impossible<Row, Error>;
    type SerializeMap = StructCollector;
    type SerializeStruct = StructCollector;
    type SerializeStructVariant = ser::Impossible<Row, Error>;

    reject! {
        "only structs can be written as rows";
        serialize_bool(v: bool) -> Row;
        serialize_i8(v: i8) -> Row;
        serialize_i16(v: i16) -> Row;
        serialize_i32(v: i32) -> Row;
        serialize_i64(v: i64) -> Row;
        serialize_u8(v: u8) -> Row;
        serialize_u16(v: u16) -> Row;
        serialize_u32(v: u32) -> Row;
        serialize_u64(v: u64) -> Row;
        serialize_f32(v: f32) -> Row;
        serialize_f64(v: f64) -> Row;
        serialize_char(v: char) -> Row;
        serialize_str(v: &str) -> Row;
        serialize_bytes(v: &[u8]) -> Row;
        serialize_none() -> Row;
        serialize_unit() -> Row;
        serialize_unit_struct(name: &'static str) -> Row;
        serialize_unit_variant(name: &'static str, index: u32, variant: &'static str) -> Row;
        serialize_seq(len: Option<usize>) -> Self::SerializeSeq;
        serialize_tuple(len: usize) -> Self::SerializeTuple;
        serialize_tuple_struct(name: &'static str, len: usize) -> Self::SerializeTupleStruct;
        serialize_tuple_variant(
            name: &'static str,
            index: u32,
            variant: &'static str,
            len: usize
        ) -> Self::SerializeTupleVariant;
        serialize_struct_variant(
            name: &'static str,
            index: u32,
            variant: &'static str,
            len: usize
        ) -> Self::SerializeStructVariant;
    }

    fn serialize_some<T>(self, value: &T) -> Result<Row>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Row>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Row>
    where
        T: ?Sized + Serialize,
    {
        Err(Error::unsupported_type("only structs can be written as rows"))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<StructCollector> {
        Ok(StructCollector::new(len.unwrap_or(0)))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<StructCollector> {
        Ok(StructCollector::new(len))
    }
}

/// Collects the top-level struct's fields.
struct StructCollector {
    row: Row,
    pending_key: Option<String>,
}

impl StructCollector {
    fn new(len: usize) -> Self {
        StructCollector {
            row: IndexMap::with_capacity(len),
            pending_key: None,
        }
    }
}

impl ser::SerializeStruct for StructCollector {
    type Ok = Row;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(FieldSerializer::new(key, &mut self.row))
    }

    fn end(self) -> Result<Row> {
        Ok(self.row)
    }
}

impl ser::SerializeMap for StructCollector {
    type Ok = Row;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.pending_key = Some(key_string(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        value.serialize(FieldSerializer::new(&key, &mut self.row))
    }

    fn end(self) -> Result<Row> {
        Ok(self.row)
    }
}

fn key_string<T: ?Sized + Serialize>(key: &T) -> Result<String> {
    let mut scratch = Row::new();
    key.serialize(FieldSerializer::new("", &mut scratch))?;
    match scratch.swap_remove("") {
        Some(Scalar::Str(s)) => Ok(s),
        _ => Err(Error::unsupported_type("map keys must be strings")),
    }
}

/// Serializes one field's value into the shared row under `key`.
struct FieldSerializer<'a> {
    key: &'a str,
    row: &'a mut Row,
    optional: bool,
}

impl<'a> FieldSerializer<'a> {
    fn new(key: &'a str, row: &'a mut Row) -> Self {
        FieldSerializer {
            key,
            row,
            optional: false,
        }
    }

    fn put(self, scalar: Scalar) -> Result<()> {
        if !self.row.contains_key(self.key) {
            self.row.insert(self.key.to_string(), scalar);
        }
        Ok(())
    }

    fn unsupported(&self, shape: &str) -> Error {
        Error::unsupported_type(&format!("field `{}` is a {}", self.key, shape))
    }
}

impl<'a> ser::Serializer for FieldSerializer<'a> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = ByteCollector<'a>;
    type SerializeTuple = ser::Impossible<(), Error>;
    type SerializeTupleStruct = ser::Impossible<(), Error>;
    type SerializeTupleVariant = ser::Impossible<(), Error>;
    type SerializeMap = EmbeddedSerializer<'a>;
    type SerializeStruct = EmbeddedSerializer<'a>;
    type SerializeStructVariant = ser::Impossible<(), Error>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.put(Scalar::Str(v.to_string()))
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.put(Scalar::Int(v))
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.serialize_i64(v as i64)
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        match i64::try_from(v) {
            Ok(n) => self.put(Scalar::Int(n)),
            // Same decimal digits on the wire
            Err(_) => self.put(Scalar::Str(v.to_string())),
        }
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        // Shortest f32 digits, not the widened f64 expansion
        let widened = v.to_string().parse().unwrap_or(f64::from(v));
        self.serialize_f64(widened)
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.put(Scalar::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<()> {
        self.put(Scalar::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.put(Scalar::Str(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.put(Scalar::Blob(v.to_vec()))
    }

    fn serialize_none(self) -> Result<()> {
        self.put(Scalar::Null)
    }

    // An optional struct would change the column layout between Some and None
    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(FieldSerializer {
            optional: true,
            ..self
        })
    }

    fn serialize_unit(self) -> Result<()> {
        self.put(Scalar::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.put(Scalar::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.put(Scalar::Str(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        Err(self.unsupported("data-carrying enum variant"))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<ByteCollector<'a>> {
        Ok(ByteCollector {
            field: self,
            bytes: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(self.unsupported("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(self.unsupported("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(self.unsupported("data-carrying enum variant"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<EmbeddedSerializer<'a>> {
        if self.optional {
            return Err(self.unsupported("map inside an Option"));
        }
        Ok(EmbeddedSerializer {
            row: self.row,
            pending_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<EmbeddedSerializer<'a>> {
        if self.optional {
            return Err(self.unsupported("struct inside an Option"));
        }
        Ok(EmbeddedSerializer {
            row: self.row,
            pending_key: None,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(self.unsupported("data-carrying enum variant"))
    }
}

/// Splices an embedded struct's fields into the enclosing row.
struct EmbeddedSerializer<'a> {
    row: &'a mut Row,
    pending_key: Option<String>,
}

impl ser::SerializeStruct for EmbeddedSerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(FieldSerializer::new(key, self.row))
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeMap for EmbeddedSerializer<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.pending_key = Some(key_string(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        value.serialize(FieldSerializer::new(&key, self.row))
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

/// Turns a sequence of bytes (`Vec<u8>`, `[u8; N]`) into a blob field.
struct ByteCollector<'a> {
    field: FieldSerializer<'a>,
    bytes: Vec<u8>,
}

impl ser::SerializeSeq for ByteCollector<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let mut scratch = Row::new();
        value.serialize(FieldSerializer::new("", &mut scratch))?;
        match scratch.swap_remove("") {
            Some(Scalar::Int(n)) if (0..=255).contains(&n) => {
                self.bytes.push(n as u8);
                Ok(())
            }
            _ => Err(self.field.unsupported("sequence of non-byte values")),
        }
    }

    fn end(self) -> Result<()> {
        self.field.put(Scalar::Blob(self.bytes))
    }
}
