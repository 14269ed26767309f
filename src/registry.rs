//! Type registration for typed streams.
//!
//! A typed stream carries rows of several structured types. Each type's
//! column layout is registered once, and later rows refer back to it:
//!
//! ```text
//! `*`	app	User	id	name		register app.User, make it active
//! 1	Alice					app.User row
//! `*`	app	Order	id	total		register app.Order, make it active
//! 7	9.5					app.Order row
//! `@`	app	User				reference app.User again
//! 2	Bob					app.User row
//! ```
//!
//! The marker field of a control row is always backtick-quoted, so a data
//! row whose first value is `*` or `@` is never mistaken for one.

use crate::quote::FieldFormat;
use crate::{Error, Result};
use indexmap::IndexMap;
use std::fmt;

pub const REGISTER_MARKER: &str = "*";
pub const REFERENCE_MARKER: &str = "@";

/// Identity of a structured type: namespace plus name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    pub namespace: String,
    pub name: String,
}

impl TypeKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        TypeKey {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Derives the identity of `T` from its Rust type path: the module path is
    /// the namespace and the final segment (with any generic arguments) the name.
    ///
    /// ```rust
    /// use serde_tt::TypeKey;
    ///
    /// struct Point;
    /// let key = TypeKey::of::<Point>();
    /// assert_eq!(key.name, "Point");
    /// assert!(!key.namespace.is_empty());
    /// ```
    #[must_use]
    pub fn of<T: ?Sized>() -> Self {
        Self::from_path(std::any::type_name::<T>())
    }

    fn from_path(path: &str) -> Self {
        let path = path.trim_start_matches('&');
        let head = path.find('<').map_or(path, |i| &path[..i]);
        match head.rfind("::") {
            Some(i) => TypeKey::new(&path[..i], &path[i + 2..]),
            None => TypeKey::new("", path),
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// A registered type: its identity and ordered column names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDescriptor {
    key: TypeKey,
    columns: Vec<String>,
}

impl TypeDescriptor {
    pub fn new(key: TypeKey, columns: Vec<String>) -> Self {
        TypeDescriptor { key, columns }
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// A protocol record: register a new type or reference a known one.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlRow {
    Register(TypeDescriptor),
    Reference(TypeKey),
}

impl ControlRow {
    /// Recognises a control row. Returns `Ok(None)` for data rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedControlRow`] when a marker is present but the
    /// namespace or name field is missing.
    pub fn parse(values: &[String], formats: &[FieldFormat]) -> Result<Option<ControlRow>> {
        let marker = match (values.first(), formats.first()) {
            (Some(marker), Some(FieldFormat::Backtick)) => marker.as_str(),
            _ => return Ok(None),
        };
        if marker != REGISTER_MARKER && marker != REFERENCE_MARKER {
            return Ok(None);
        }
        if values.len() < 3 {
            return Err(Error::MalformedControlRow(format!(
                "`{}` row needs namespace and name, found {} fields",
                marker,
                values.len()
            )));
        }
        let key = TypeKey::new(&values[1], &values[2]);
        if marker == REGISTER_MARKER {
            Ok(Some(ControlRow::Register(TypeDescriptor::new(
                key,
                values[3..].to_vec(),
            ))))
        } else {
            Ok(Some(ControlRow::Reference(key)))
        }
    }

    /// Renders the row's field values; the first field must be written with
    /// [`ControlRow::marker_format`].
    #[must_use]
    pub fn to_fields(&self) -> Vec<String> {
        match self {
            ControlRow::Register(descriptor) => {
                let key = descriptor.key();
                let mut fields = Vec::with_capacity(3 + descriptor.columns().len());
                fields.push(REGISTER_MARKER.to_string());
                fields.push(key.namespace.clone());
                fields.push(key.name.clone());
                fields.extend(descriptor.columns().iter().cloned());
                fields
            }
            ControlRow::Reference(key) => vec![
                REFERENCE_MARKER.to_string(),
                key.namespace.clone(),
                key.name.clone(),
            ],
        }
    }

    pub const fn marker_format() -> FieldFormat {
        FieldFormat::Backtick
    }
}

/// Session-scoped table of registered types plus the active type.
///
/// Entries are never removed; the registry lives as long as its encoder or
/// decoder.
#[derive(Debug, Default)]
pub struct Registry {
    types: IndexMap<TypeKey, TypeDescriptor>,
    active: Option<usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, key: &TypeKey) -> Option<&TypeDescriptor> {
        self.types.get(key)
    }

    /// The descriptor governing the next data rows, if any.
    pub fn active(&self) -> Option<&TypeDescriptor> {
        self.active
            .and_then(|i| self.types.get_index(i))
            .map(|(_, descriptor)| descriptor)
    }

    /// Encode side: makes `key` active and returns the control row that has to
    /// be written first, if any.
    ///
    /// - unknown key: registers it with `columns` and returns a register row
    /// - known but inactive: returns a reference row
    /// - already active: returns `None`
    pub fn prepare(&mut self, key: &TypeKey, columns: &[String]) -> Option<ControlRow> {
        match self.types.get_index_of(key) {
            Some(i) if self.active == Some(i) => None,
            Some(i) => {
                self.active = Some(i);
                Some(ControlRow::Reference(key.clone()))
            }
            None => {
                let descriptor = TypeDescriptor::new(key.clone(), columns.to_vec());
                let (i, _) = self.types.insert_full(key.clone(), descriptor.clone());
                self.active = Some(i);
                Some(ControlRow::Register(descriptor))
            }
        }
    }

    /// Decode side: applies a control row read from the stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateType`] when registering a known identity and
    /// [`Error::UnknownTypeReference`] when referencing an unknown one.
    pub fn apply(&mut self, row: ControlRow) -> Result<&TypeDescriptor> {
        let index = match row {
            ControlRow::Register(descriptor) => {
                if self.types.contains_key(descriptor.key()) {
                    return Err(Error::DuplicateType {
                        namespace: descriptor.key.namespace,
                        name: descriptor.key.name,
                    });
                }
                let (i, _) = self
                    .types
                    .insert_full(descriptor.key().clone(), descriptor);
                i
            }
            ControlRow::Reference(key) => match self.types.get_index_of(&key) {
                Some(i) => i,
                None => {
                    return Err(Error::UnknownTypeReference {
                        namespace: key.namespace,
                        name: key.name,
                    })
                }
            },
        };
        self.active = Some(index);
        Ok(&self.types[index])
    }
}
