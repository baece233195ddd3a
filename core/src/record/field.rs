//! Field kinds and their float/JSON contracts.

use serde_json::Value as Json;

use super::stream::{FloatStream, float_to_int};
use crate::error::RecordError;

/// A named closed set of integer codes.
#[derive(Debug, PartialEq)]
pub struct EnumDomain {
    pub name: &'static str,
    pub variants: &'static [(i64, &'static str)],
}

impl EnumDomain {
    pub fn label(&self, code: i64) -> Option<&'static str> {
        self.variants
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| *label)
    }

    pub fn code(&self, label: &str) -> Option<i64> {
        self.variants
            .iter()
            .find(|(_, l)| *l == label)
            .map(|(c, _)| *c)
    }
}

/// How one schema slot maps to the float stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Pass-through float.
    Value,
    /// Float that must equal its own truncation.
    Int,
    /// `1.0` is true, anything else is false.
    Bool,
    /// Pass-through float tagged with a closed domain of codes.
    Enum(&'static EnumDomain),
    /// Fixed wire slot; decoding checks it, encoding always writes it.
    Constant(f64),
    /// One slot whose value is ignored both ways (written as zero).
    AnyReserved,
    /// Zero means absent; anything else is decoded by the inner kind.
    Optional(&'static FieldKind),
}

/// A decoded field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Int(i64),
    Bool(bool),
}

impl FieldValue {
    /// The float written to the wire for this value
    pub fn to_f64(self) -> f64 {
        match self {
            FieldValue::Float(f) => f,
            FieldValue::Int(i) => i as f64,
            FieldValue::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    fn describe(self) -> String {
        match self {
            FieldValue::Float(f) => format!("float {f}"),
            FieldValue::Int(i) => format!("integer {i}"),
            FieldValue::Bool(b) => format!("bool {b}"),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl FieldKind {
    /// Whether the field is left out of the JSON form
    pub fn is_hidden(&self) -> bool {
        match self {
            FieldKind::Constant(_) | FieldKind::AnyReserved => true,
            FieldKind::Optional(inner) => inner.is_hidden(),
            _ => false,
        }
    }

    /// Consume this field's slot(s). `None` means the field carries no value.
    pub fn decode(&self, stream: &mut FloatStream) -> Result<Option<FieldValue>, RecordError> {
        match *self {
            FieldKind::Value | FieldKind::Enum(_) => Ok(Some(FieldValue::Float(stream.read()?))),
            FieldKind::Int => Ok(Some(FieldValue::Int(stream.read_int()?))),
            FieldKind::Bool => Ok(Some(FieldValue::Bool(stream.read()? == 1.0))),
            FieldKind::Constant(expected) => {
                let found = stream.read()?;
                if found != expected {
                    return Err(RecordError::ConstantMismatch { expected, found });
                }
                Ok(None)
            }
            FieldKind::AnyReserved => {
                stream.read()?;
                Ok(None)
            }
            FieldKind::Optional(inner) => {
                if stream.peek()? == 0.0 {
                    stream.read()?;
                    return Ok(None);
                }
                inner.decode(stream)
            }
        }
    }

    /// Append this field's slot(s) for `value`.
    pub fn encode(
        &self,
        stream: &mut FloatStream,
        value: Option<FieldValue>,
    ) -> Result<(), RecordError> {
        match *self {
            FieldKind::Constant(expected) => {
                if let Some(found) = value.map(FieldValue::to_f64)
                    && found != expected
                {
                    return Err(RecordError::ConstantMismatch { expected, found });
                }
                stream.write(expected);
            }
            FieldKind::AnyReserved => stream.write(0.0),
            FieldKind::Optional(inner) => match value {
                None => stream.write(0.0),
                Some(v) => inner.encode(stream, Some(v))?,
            },
            _ => {
                let v = value.ok_or(RecordError::MissingValue)?;
                stream.write(v.to_f64());
            }
        }
        Ok(())
    }

    /// Normalize a caller-supplied value to the representation this kind stores.
    pub fn coerce(&self, value: FieldValue) -> Result<FieldValue, RecordError> {
        let mismatch = |expected| RecordError::TypeMismatch {
            expected,
            found: value.describe(),
        };
        match *self {
            FieldKind::Value
            | FieldKind::Enum(_)
            | FieldKind::Constant(_)
            | FieldKind::AnyReserved => match value {
                FieldValue::Bool(_) => Err(mismatch("a number")),
                v => Ok(FieldValue::Float(v.to_f64())),
            },
            FieldKind::Int => match value {
                FieldValue::Int(i) => Ok(FieldValue::Int(i)),
                FieldValue::Float(f) => float_to_int(f)
                    .map(FieldValue::Int)
                    .ok_or(RecordError::NonInteger(f)),
                FieldValue::Bool(_) => Err(mismatch("an integer")),
            },
            FieldKind::Bool => match value {
                FieldValue::Bool(b) => Ok(FieldValue::Bool(b)),
                _ => Err(mismatch("a bool")),
            },
            FieldKind::Optional(inner) => inner.coerce(value),
        }
    }

    /// JSON rendering of a stored value
    pub fn to_json(&self, value: FieldValue) -> Json {
        match (self.innermost(), value) {
            (FieldKind::Enum(domain), FieldValue::Float(f)) => {
                match float_to_int(f).and_then(|code| domain.label(code)) {
                    Some(label) => Json::from(label),
                    None => Json::from(f),
                }
            }
            (_, FieldValue::Float(f)) => Json::from(f),
            (_, FieldValue::Int(i)) => Json::from(i),
            (_, FieldValue::Bool(b)) => Json::from(b),
        }
    }

    /// Parse the JSON rendering back into a stored value.
    pub fn from_json(&self, json: &Json) -> Result<FieldValue, RecordError> {
        let value = match (self.innermost(), json) {
            (FieldKind::Enum(domain), Json::String(label)) => {
                let code = domain.code(label).ok_or_else(|| RecordError::TypeMismatch {
                    expected: "an enum label",
                    found: format!("'{label}'"),
                })?;
                FieldValue::Float(code as f64)
            }
            (_, Json::Bool(b)) => FieldValue::Bool(*b),
            (_, Json::Number(n)) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            (_, other) => {
                return Err(RecordError::TypeMismatch {
                    expected: "a number or bool",
                    found: other.to_string(),
                });
            }
        };
        self.coerce(value)
    }

    fn innermost(&self) -> &FieldKind {
        match self {
            FieldKind::Optional(inner) => inner.innermost(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static FLAVOURS: EnumDomain = EnumDomain {
        name: "flavour",
        variants: &[(1, "spruce"), (2, "pine")],
    };

    fn decode(kind: FieldKind, values: &[f64]) -> (Result<Option<FieldValue>, RecordError>, usize) {
        let mut stream = FloatStream::from_vec(values.to_vec());
        let result = kind.decode(&mut stream);
        (result, stream.remaining())
    }

    fn encode(kind: FieldKind, value: Option<FieldValue>) -> Result<Vec<f64>, RecordError> {
        let mut stream = FloatStream::new();
        kind.encode(&mut stream, value)?;
        Ok(stream.into_vec())
    }

    #[test]
    fn test_int_rejects_fraction() {
        assert_eq!(
            decode(FieldKind::Int, &[3.0]).0,
            Ok(Some(FieldValue::Int(3)))
        );
        assert_eq!(
            decode(FieldKind::Int, &[3.5]).0,
            Err(RecordError::NonInteger(3.5))
        );
    }

    #[test]
    fn test_bool_decodes_only_one_as_true() {
        assert_eq!(
            decode(FieldKind::Bool, &[1.0]).0,
            Ok(Some(FieldValue::Bool(true)))
        );
        assert_eq!(
            decode(FieldKind::Bool, &[2.0]).0,
            Ok(Some(FieldValue::Bool(false)))
        );
        assert_eq!(encode(FieldKind::Bool, Some(true.into())), Ok(vec![1.0]));
        assert_eq!(encode(FieldKind::Bool, Some(false.into())), Ok(vec![0.0]));
    }

    #[test]
    fn test_constant_checks_both_ways() {
        assert_eq!(decode(FieldKind::Constant(1000.0), &[1000.0]).0, Ok(None));
        assert_eq!(
            decode(FieldKind::Constant(1000.0), &[0.0]).0,
            Err(RecordError::ConstantMismatch {
                expected: 1000.0,
                found: 0.0
            })
        );
        assert_eq!(encode(FieldKind::Constant(1.0), None), Ok(vec![1.0]));
        assert_eq!(
            encode(FieldKind::Constant(1.0), Some(FieldValue::Float(1.0))),
            Ok(vec![1.0])
        );
        assert!(encode(FieldKind::Constant(1.0), Some(FieldValue::Float(2.0))).is_err());
    }

    #[test]
    fn test_any_reserved_consumes_one_slot() {
        assert_eq!(decode(FieldKind::AnyReserved, &[42.0, 7.0]), (Ok(None), 1));
        assert_eq!(encode(FieldKind::AnyReserved, Some(FieldValue::Float(5.0))), Ok(vec![0.0]));
    }

    #[test]
    fn test_optional_zero_is_absent() {
        const OPT: FieldKind = FieldKind::Optional(&FieldKind::Int);
        assert_eq!(decode(OPT, &[0.0, 9.0]), (Ok(None), 1));
        assert_eq!(decode(OPT, &[4.0]), (Ok(Some(FieldValue::Int(4))), 0));
        assert_eq!(decode(OPT, &[4.5]).0, Err(RecordError::NonInteger(4.5)));
        assert_eq!(encode(OPT, None), Ok(vec![0.0]));
        assert_eq!(encode(OPT, Some(FieldValue::Int(4))), Ok(vec![4.0]));
    }

    #[test]
    fn test_required_value_missing() {
        assert_eq!(
            encode(FieldKind::Value, None),
            Err(RecordError::MissingValue)
        );
    }

    #[test]
    fn test_enum_domain() {
        let kind = FieldKind::Enum(&FLAVOURS);
        // decodes like a plain value, domain or not
        assert_eq!(decode(kind, &[2.0]).0, Ok(Some(FieldValue::Float(2.0))));
        assert_eq!(decode(kind, &[3.5]).0, Ok(Some(FieldValue::Float(3.5))));
        assert_eq!(encode(kind, Some(FieldValue::Int(3))), Ok(vec![3.0]));

        assert_eq!(kind.to_json(FieldValue::Float(1.0)), Json::from("spruce"));
        assert_eq!(kind.to_json(FieldValue::Float(3.5)), Json::from(3.5));
        assert_eq!(
            kind.from_json(&Json::from("pine")),
            Ok(FieldValue::Float(2.0))
        );
        assert_eq!(kind.from_json(&Json::from(1)), Ok(FieldValue::Float(1.0)));
    }

    #[test]
    fn test_json_coercion() {
        assert_eq!(
            FieldKind::Int.from_json(&Json::from(12.0)),
            Ok(FieldValue::Int(12))
        );
        assert_eq!(
            FieldKind::Value.from_json(&Json::from(12)),
            Ok(FieldValue::Float(12.0))
        );
        assert!(FieldKind::Bool.from_json(&Json::from(1)).is_err());
        assert!(FieldKind::Value.from_json(&Json::from("x")).is_err());
    }

    #[test]
    fn test_hidden_kinds() {
        assert!(FieldKind::Constant(0.0).is_hidden());
        assert!(FieldKind::AnyReserved.is_hidden());
        assert!(!FieldKind::Optional(&FieldKind::Value).is_hidden());
        assert!(!FieldKind::Bool.is_hidden());
    }
}
