//! Declarative field/record framework.
//!
//! A record type is a const table of [`FieldSpec`]s attached to a marker type
//! through [`RecordSchema`]. [`Record<K>`] stores one optional value per slot
//! and drives every codec generically off that table:
//!
//! - floats: [`Record::decode`] / [`Record::encode`] over a [`FloatStream`],
//!   including prefix forms for partially-populated records
//! - JSON: a map of visible field names in declaration order
//!
//! Constant and reserved slots never appear in JSON, and absent optional
//! fields are omitted.

mod field;
mod stream;

use std::fmt;
use std::marker::PhantomData;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as Json};

pub use field::{EnumDomain, FieldKind, FieldValue};
pub use stream::{FloatStream, float_to_int};

use crate::error::RecordError;

/// One named slot of a record schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn value(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Value,
        }
    }

    pub const fn int(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Int,
        }
    }

    pub const fn bool(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Bool,
        }
    }

    pub const fn constant(name: &'static str, value: f64) -> Self {
        Self {
            name,
            kind: FieldKind::Constant(value),
        }
    }

    pub const fn reserved(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::AnyReserved,
        }
    }

    pub const fn optional(name: &'static str, inner: &'static FieldKind) -> Self {
        Self {
            name,
            kind: FieldKind::Optional(inner),
        }
    }
}

/// Static schema of a record type.
pub trait RecordSchema {
    /// Record type name used in error messages
    const NAME: &'static str;
    /// Fields in wire order
    const FIELDS: &'static [FieldSpec];
}

/// A record of schema `K`: one optional value per schema slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<K> {
    values: Vec<Option<FieldValue>>,
    _schema: PhantomData<K>,
}

impl<K: RecordSchema> Default for Record<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: RecordSchema> Record<K> {
    /// Create a record with every field absent
    pub fn new() -> Self {
        Self {
            values: vec![None; K::FIELDS.len()],
            _schema: PhantomData,
        }
    }

    /// Number of slots in the full schema
    pub fn schema_len() -> usize {
        K::FIELDS.len()
    }

    fn index(name: &str) -> Result<usize, RecordError> {
        K::FIELDS
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| RecordError::UnknownField {
                record: K::NAME,
                name: name.to_string(),
            })
    }

    pub fn get(&self, name: &str) -> Option<FieldValue> {
        Self::index(name).ok().and_then(|i| self.values[i])
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).map(FieldValue::to_f64)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            FieldValue::Int(i) => Some(i),
            FieldValue::Float(f) => float_to_int(f),
            FieldValue::Bool(_) => None,
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            FieldValue::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Store a value, coercing it to the field's kind.
    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), RecordError> {
        let i = Self::index(name)?;
        let spec = &K::FIELDS[i];
        let value = spec
            .kind
            .coerce(value.into())
            .map_err(|e| e.in_field("set", K::NAME, spec.name))?;
        self.values[i] = Some(value);
        Ok(())
    }

    /// Mark a field absent
    pub fn clear(&mut self, name: &str) -> Result<(), RecordError> {
        let i = Self::index(name)?;
        self.values[i] = None;
        Ok(())
    }

    /// Present visible fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, FieldValue)> + '_ {
        K::FIELDS
            .iter()
            .zip(&self.values)
            .filter(|(spec, _)| !spec.kind.is_hidden())
            .filter_map(|(spec, v)| v.map(|v| (spec.name, v)))
    }

    /// Decode the full schema from `stream`.
    pub fn decode(stream: &mut FloatStream) -> Result<Self, RecordError> {
        Self::decode_prefix(stream, K::FIELDS.len())
    }

    /// Decode only the first `count` fields; the rest stay absent.
    pub fn decode_prefix(stream: &mut FloatStream, count: usize) -> Result<Self, RecordError> {
        let specs = Self::prefix(count)?;
        let mut record = Self::new();
        for (slot, spec) in record.values.iter_mut().zip(specs) {
            *slot = spec
                .kind
                .decode(stream)
                .map_err(|e| e.in_field("decode", K::NAME, spec.name))?;
        }
        Ok(record)
    }

    /// Encode the full schema onto `stream`.
    pub fn encode(&self, stream: &mut FloatStream) -> Result<(), RecordError> {
        self.encode_prefix(stream, K::FIELDS.len())
    }

    /// Encode only the first `count` fields.
    pub fn encode_prefix(&self, stream: &mut FloatStream, count: usize) -> Result<(), RecordError> {
        let specs = Self::prefix(count)?;
        for (spec, value) in specs.iter().zip(&self.values) {
            spec.kind
                .encode(stream, *value)
                .map_err(|e| e.in_field("encode", K::NAME, spec.name))?;
        }
        Ok(())
    }

    fn prefix(count: usize) -> Result<&'static [FieldSpec], RecordError> {
        K::FIELDS.get(..count).ok_or(RecordError::TooManyFields {
            record: K::NAME,
            given: count as i64,
            max: K::FIELDS.len(),
        })
    }

    pub fn to_floats(&self) -> Result<Vec<f64>, RecordError> {
        let mut stream = FloatStream::new();
        self.encode(&mut stream)?;
        Ok(stream.into_vec())
    }

    /// Decode the full schema from the front of `values`; extra values are ignored.
    pub fn from_floats(values: &[f64]) -> Result<Self, RecordError> {
        Self::decode(&mut FloatStream::from_vec(values.to_vec()))
    }

    /// Read fields from a JSON object.
    ///
    /// Keys that are not visible fields of the schema are ignored; `null`
    /// means absent.
    pub fn read_json(map: &Map<String, Json>) -> Result<Self, RecordError> {
        let mut record = Self::new();
        for (slot, spec) in record.values.iter_mut().zip(K::FIELDS) {
            if spec.kind.is_hidden() {
                continue;
            }
            match map.get(spec.name) {
                None | Some(Json::Null) => {}
                Some(json) => {
                    let value = spec
                        .kind
                        .from_json(json)
                        .map_err(|e| e.in_field("read", K::NAME, spec.name))?;
                    *slot = Some(value);
                }
            }
        }
        Ok(record)
    }
}

impl<K: RecordSchema> Serialize for Record<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (spec, value) in K::FIELDS.iter().zip(&self.values) {
            if spec.kind.is_hidden() {
                continue;
            }
            if let Some(v) = value {
                map.serialize_entry(spec.name, &spec.kind.to_json(*v))?;
            }
        }
        map.end()
    }
}

impl<'de, K: RecordSchema> Deserialize<'de> for Record<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Json>::deserialize(deserializer)?;
        Self::read_json(&map).map_err(D::Error::custom)
    }
}

impl<K: RecordSchema> fmt::Display for Record<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", K::NAME)?;
        for (i, (name, value)) in self.fields().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{sep}{name}: {}", value.to_f64())?;
        }
        write!(f, " }}")
    }
}
