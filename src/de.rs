//! Filling Rust values from rows.
//!
//! [`from_row`] is the mirror of [`crate::ser::to_row`]: it walks the
//! destination's fields in declaration order, descending into struct-typed
//! fields depth-first, and hands each field the column of the same name.
//!
//! - **First name wins**: only the first field with a given name receives the
//!   column; later fields with that name get their zero value
//! - **Missing columns**: a field with no column gets its zero value
//! - **Unknown columns**: a column no field claims is [`Error::FieldNotFound`]
//! - **Empty text**: numbers read as zero, `Option` as `None`, byte vectors as empty
//!
//! ```rust
//! use serde::Deserialize;
//! use serde_tt::de::from_row;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Point { x: i32, y: i32, label: Option<String> }
//!
//! let columns = vec!["y".to_string(), "x".to_string(), "label".to_string()];
//! let values = vec!["2".to_string(), "1".to_string(), String::new()];
//! let point: Point = from_row(&columns, values).unwrap();
//! assert_eq!(point, Point { x: 1, y: 2, label: None });
//! ```

use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use serde::de::value::SeqDeserializer;
use serde::de::{self, DeserializeOwned, IntoDeserializer};
use serde::{forward_to_deserialize_any, Deserializer as _};
use std::collections::HashSet;

/// Builds a `T` from one row.
///
/// `values` must be aligned with `columns`.
///
/// # Errors
///
/// Returns [`Error::FieldNotFound`] when a column matches no field of `T`,
/// [`Error::ScalarTypeMismatch`] when a field's text does not parse as the
/// field's kind, and [`Error::UnsupportedType`] when `T` is not a struct.
pub fn from_row<T>(columns: &[String], values: Vec<String>) -> Result<T>
where
    T: DeserializeOwned,
{
    let mut state = RowState::new(columns, values);
    let value = T::deserialize(RowDeserializer { state: &mut state })?;
    state.finish(std::any::type_name::<T>())?;
    Ok(value)
}

struct RowState<'s> {
    columns: &'s [String],
    values: Vec<Option<String>>,
    matched: Vec<bool>,
    seen: HashSet<String>,
}

impl<'s> RowState<'s> {
    fn new(columns: &'s [String], values: Vec<String>) -> Self {
        RowState {
            columns,
            matched: vec![false; values.len()],
            values: values.into_iter().map(Some).collect(),
            seen: HashSet::new(),
        }
    }

    /// Gives the column text to the first field named `name`; later fields with
    /// the same name, and fields without a column, get `None`.
    fn claim(&mut self, name: &str) -> Option<String> {
        if !self.seen.insert(name.to_string()) {
            return None;
        }
        let mut text = None;
        for (i, column) in self.columns.iter().enumerate() {
            if column == name && i < self.values.len() {
                self.matched[i] = true;
                // A repeated column name overwrites, as if assigned in order
                text = self.values[i].take();
            }
        }
        text
    }

    fn finish(&self, type_name: &str) -> Result<()> {
        match self.matched.iter().position(|m| !m) {
            Some(i) => Err(Error::FieldNotFound {
                column: self.columns[i].clone(),
                type_name: type_name.to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Entry point deserializer: accepts structs and string maps.
struct RowDeserializer<'a, 's> {
    state: &'a mut RowState<'s>,
}

impl<'de> de::Deserializer<'de> for RowDeserializer<'_, '_> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_map(ColumnsAccess {
            state: self.state,
            index: 0,
        })
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_map(StructAccess {
            state: self.state,
            fields,
            index: 0,
        })
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

/// Walks a struct's declared fields.
struct StructAccess<'a, 's> {
    state: &'a mut RowState<'s>,
    fields: &'static [&'static str],
    index: usize,
}

impl<'de> de::MapAccess<'de> for StructAccess<'_, '_> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.fields.get(self.index) {
            Some(name) => seed.deserialize((*name).into_deserializer()).map(Some),
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        let name = self
            .fields
            .get(self.index)
            .copied()
            .ok_or_else(|| Error::custom("next_value_seed called without next_key_seed"))?;
        self.index += 1;
        seed.deserialize(FieldDeserializer {
            state: &mut *self.state,
            name,
        })
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.fields.len() - self.index)
    }
}

/// Walks the columns no field has claimed yet, for map destinations.
struct ColumnsAccess<'a, 's> {
    state: &'a mut RowState<'s>,
    index: usize,
}

impl ColumnsAccess<'_, '_> {
    fn next_unclaimed(&mut self) -> Option<usize> {
        while self.index < self.state.columns.len() {
            if !self.state.seen.contains(&self.state.columns[self.index]) {
                return Some(self.index);
            }
            self.index += 1;
        }
        None
    }
}

impl<'de> de::MapAccess<'de> for ColumnsAccess<'_, '_> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.next_unclaimed() {
            Some(i) => {
                let name = self.state.columns[i].as_str();
                seed.deserialize(name.into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        let i = self
            .next_unclaimed()
            .ok_or_else(|| Error::custom("next_value_seed called without next_key_seed"))?;
        self.index += 1;
        let columns = self.state.columns;
        seed.deserialize(FieldDeserializer {
            state: &mut *self.state,
            name: &columns[i],
        })
    }
}

/// Deserializes one named field: embedded structs recurse, scalars claim
/// their column.
struct FieldDeserializer<'a, 's> {
    state: &'a mut RowState<'s>,
    name: &'a str,
}

impl<'a, 's> FieldDeserializer<'a, 's> {
    fn into_scalar(self) -> ScalarDeserializer<'a> {
        let text = self.state.claim(self.name).unwrap_or_default();
        ScalarDeserializer {
            column: self.name,
            text,
        }
    }
}

macro_rules! forward_to_scalar {
    ($($method:ident)*) => {
        $(
            fn $method<V>(self, visitor: V) -> Result<V::Value>
            where
                V: de::Visitor<'de>,
            {
                self.into_scalar().$method(visitor)
            }
        )*
    };
}

impl<'de> de::Deserializer<'de> for FieldDeserializer<'_, '_> {
    type Error = Error;

    forward_to_scalar! {
        deserialize_any deserialize_bool deserialize_i8 deserialize_i16 deserialize_i32
        deserialize_i64 deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64
        deserialize_f32 deserialize_f64 deserialize_char deserialize_str deserialize_string
        deserialize_bytes deserialize_byte_buf deserialize_unit deserialize_seq
        deserialize_identifier deserialize_ignored_any
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let scalar = self.into_scalar();
        if scalar.text.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(scalar)
        }
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.into_scalar().deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_tuple<V>(self, _len: usize, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(self.into_scalar().unsupported("tuple"))
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(self.into_scalar().unsupported("tuple struct"))
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.state.seen.insert(self.name.to_string());
        visitor.visit_map(ColumnsAccess {
            state: self.state,
            index: 0,
        })
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_map(StructAccess {
            state: self.state,
            fields,
            index: 0,
        })
    }

    fn deserialize_enum<V>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.into_scalar().deserialize_enum(name, variants, visitor)
    }
}

/// Deserializes one field's text according to the kind the destination asks for.
struct ScalarDeserializer<'a> {
    column: &'a str,
    text: String,
}

impl ScalarDeserializer<'_> {
    fn mismatch(&self, expected: &str) -> Error {
        Error::type_mismatch(self.column, expected, &self.text)
    }

    fn unsupported(&self, shape: &str) -> Error {
        Error::unsupported_type(&format!("field `{}` is a {}", self.column, shape))
    }

    fn parse_i64(&self) -> Result<i64> {
        if self.text.is_empty() {
            return Ok(0);
        }
        self.text.parse().map_err(|_| self.mismatch("integer"))
    }

    fn parse_int<N: TryFrom<i64>>(&self, expected: &str) -> Result<N> {
        N::try_from(self.parse_i64()?).map_err(|_| self.mismatch(expected))
    }

    fn parse_uint<N: TryFrom<u64>>(&self, expected: &str) -> Result<N> {
        N::try_from(self.parse_u64()?).map_err(|_| self.mismatch(expected))
    }

    fn parse_u64(&self) -> Result<u64> {
        if self.text.is_empty() {
            return Ok(0);
        }
        self.text.parse().map_err(|_| self.mismatch("unsigned integer"))
    }

    fn parse_f64(&self) -> Result<f64> {
        if self.text.is_empty() {
            return Ok(0.0);
        }
        self.text.parse().map_err(|_| self.mismatch("float"))
    }

    /// Re-labels a rejection raised by the destination type's own parser.
    fn rejected(&self, err: Error) -> Error {
        match err {
            Error::Custom(msg) => self.mismatch(&format!("a value the field accepts ({})", msg)),
            other => other,
        }
    }

    fn visit_text<'de, V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor
            .visit_str(&self.text)
            .map_err(|err| self.rejected(err))
    }

    fn decode_blob(&self) -> Result<Vec<u8>> {
        if self.text.is_empty() {
            return Ok(Vec::new());
        }
        BASE64_STANDARD
            .decode(&self.text)
            .map_err(|_| self.mismatch("base64 blob"))
    }
}

impl<'de> de::Deserializer<'de> for ScalarDeserializer<'_> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.visit_text(visitor)
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.text.as_str() {
            "" | "false" => visitor.visit_bool(false),
            "true" => visitor.visit_bool(true),
            _ => Err(self.mismatch("boolean")),
        }
    }

    fn deserialize_i8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_i8(self.parse_int("8-bit integer")?)
    }

    fn deserialize_i16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_i16(self.parse_int("16-bit integer")?)
    }

    fn deserialize_i32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_i32(self.parse_int("32-bit integer")?)
    }

    fn deserialize_i64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_i64(self.parse_i64()?)
    }

    fn deserialize_u8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_u8(self.parse_uint("8-bit unsigned integer")?)
    }

    fn deserialize_u16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_u16(self.parse_uint("16-bit unsigned integer")?)
    }

    fn deserialize_u32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_u32(self.parse_uint("32-bit unsigned integer")?)
    }

    fn deserialize_u64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_u64(self.parse_u64()?)
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_f32(self.parse_f64()? as f32)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_f64(self.parse_f64()?)
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let mut chars = self.text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(self.mismatch("single character")),
        }
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.visit_text(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        self.visit_text(visitor)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_byte_buf(self.decode_blob()?)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_byte_buf(self.decode_blob()?)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        if self.text.is_empty() {
            visitor.visit_none()
        } else {
            visitor.visit_some(self)
        }
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        let mut bytes = SeqDeserializer::<_, Error>::new(self.decode_blob()?.into_iter());
        let value = visitor.visit_seq(&mut bytes)?;
        bytes.end()?;
        Ok(value)
    }

    fn deserialize_tuple<V>(self, _len: usize, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(self.unsupported("tuple"))
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(self.unsupported("tuple struct"))
    }

    fn deserialize_map<V>(self, _visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(self.unsupported("map"))
    }

    fn deserialize_struct<V>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        Err(self.unsupported("struct inside an Option"))
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor
            .visit_enum(self.text.as_str().into_deserializer())
            .map_err(|err| self.rejected(err))
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_string(self.text)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_unit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[derive(Deserialize, Debug, PartialEq, Default)]
    struct Base {
        id: i64,
        name: String,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Shadowed {
        base: Base,
        name: String,
        payload: Vec<u8>,
        kind: Kind,
        flag: bool,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    enum Kind {
        Draft,
        Final,
    }

    #[test]
    fn test_first_field_receives_shadowed_column() {
        let columns = strings(&["id", "name", "payload", "kind", "flag"]);
        let values = strings(&["5", "inner", "AQID", "Final", "true"]);
        let value: Shadowed = from_row(&columns, values).unwrap();
        assert_eq!(
            value,
            Shadowed {
                base: Base {
                    id: 5,
                    name: "inner".to_string()
                },
                name: String::new(),
                payload: vec![1, 2, 3],
                kind: Kind::Final,
                flag: true,
            }
        );
    }

    #[test]
    fn test_unknown_column() {
        let columns = strings(&["id", "name", "email"]);
        let values = strings(&["1", "a", "a@example.com"]);
        match from_row::<Base>(&columns, values) {
            Err(Error::FieldNotFound { column, .. }) => assert_eq!(column, "email"),
            other => panic!("expected FieldNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_text_is_zero() {
        let columns = strings(&["id", "name"]);
        let value: Base = from_row(&columns, strings(&["", ""])).unwrap();
        assert_eq!(value, Base::default());
    }

    #[test]
    fn test_mismatch_names_column() {
        let columns = strings(&["id", "name"]);
        match from_row::<Base>(&columns, strings(&["seven", "x"])) {
            Err(Error::ScalarTypeMismatch { column, found, .. }) => {
                assert_eq!(column, "id");
                assert_eq!(found, "seven");
            }
            other => panic!("expected mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_narrow_integer_overflow() {
        #[derive(Deserialize, Debug)]
        #[allow(dead_code)]
        struct Narrow {
            small: i8,
            n: i32,
            count: u32,
        }
        let columns = strings(&["small", "n", "count"]);
        for (values, column) in [
            (["128", "0", "0"], "small"),
            (["0", "99999999999", "0"], "n"),
            (["0", "0", "-1"], "count"),
            (["0", "0", "4294967296"], "count"),
        ] {
            match from_row::<Narrow>(&columns, strings(&values)) {
                Err(Error::ScalarTypeMismatch { column: c, .. }) => assert_eq!(c, column),
                other => panic!("expected mismatch in {}, got {:?}", column, other),
            }
        }
        let edge: Narrow = from_row(&columns, strings(&["-128", "2147483647", "4294967295"])).unwrap();
        assert_eq!((edge.small, edge.n, edge.count), (-128, i32::MAX, u32::MAX));
    }

    #[test]
    fn test_unknown_variant_is_mismatch() {
        #[derive(Deserialize, Debug)]
        struct Doc {
            #[allow(dead_code)]
            kind: Kind,
        }
        let columns = strings(&["kind"]);
        assert!(matches!(
            from_row::<Doc>(&columns, strings(&["Archived"])),
            Err(Error::ScalarTypeMismatch { ref found, .. }) if found == "Archived"
        ));
    }

    #[test]
    fn test_bare_timestamp_rejection_is_mismatch() {
        #[derive(Deserialize, Debug)]
        struct Stamp {
            #[allow(dead_code)]
            at: chrono::DateTime<chrono::Utc>,
        }
        let columns = strings(&["at"]);
        for text in ["", "yesterday"] {
            match from_row::<Stamp>(&columns, strings(&[text])) {
                Err(Error::ScalarTypeMismatch { column, found, .. }) => {
                    assert_eq!(column, "at");
                    assert_eq!(found, text);
                }
                other => panic!("expected mismatch, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_map_destination() {
        let columns = strings(&["b", "a"]);
        let map: std::collections::BTreeMap<String, String> =
            from_row(&columns, strings(&["2", "1"])).unwrap();
        assert_eq!(map.get("a").map(String::as_str), Some("1"));
        assert_eq!(map.get("b").map(String::as_str), Some("2"));
    }
}
