//! Physical and logical MSB record types.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as Json;

use crate::error::RecordError;
use crate::rsd::{INITIAL_DATA_RECORD_TYPE, InitialData};

/// Physical record identifier. Its wire type is configurable, so it keeps
/// whichever representation it was read or written as.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Uid {
    Int(i64),
    Float(f64),
}

impl Uid {
    pub fn as_f64(self) -> f64 {
        match self {
            Uid::Int(i) => i as f64,
            Uid::Float(f) => f,
        }
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uid::Int(i) => write!(f, "{i}"),
            Uid::Float(x) => write!(f, "{x}"),
        }
    }
}

/// One length-delimited block of logical records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalRecord {
    pub uid: Uid,
    pub records: Vec<LogicalRecord>,
}

/// A typed payload inside a physical record.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalRecord {
    /// Record type 1
    InitialData(InitialData),
    /// Any other record type, kept verbatim
    Opaque { record_type: i64, values: Vec<f64> },
}

impl LogicalRecord {
    pub fn record_type(&self) -> i64 {
        match self {
            LogicalRecord::InitialData(_) => INITIAL_DATA_RECORD_TYPE,
            LogicalRecord::Opaque { record_type, .. } => *record_type,
        }
    }

    /// Decode a payload according to its type tag.
    pub fn from_floats(record_type: i64, values: Vec<f64>) -> Result<Self, RecordError> {
        if record_type == INITIAL_DATA_RECORD_TYPE {
            return InitialData::from_floats(&values).map(LogicalRecord::InitialData);
        }
        Ok(LogicalRecord::Opaque {
            record_type,
            values,
        })
    }

    /// Encode the payload (without the type/count header).
    pub fn to_floats(&self) -> Result<Vec<f64>, RecordError> {
        match self {
            LogicalRecord::InitialData(data) => data.to_floats(),
            LogicalRecord::Opaque { values, .. } => Ok(values.clone()),
        }
    }
}

#[derive(Serialize)]
struct TaggedInitialData<'a> {
    record_type: i64,
    #[serde(flatten)]
    data: &'a InitialData,
}

#[derive(Serialize, Deserialize)]
struct OpaqueJson {
    record_type: i64,
    buf: Vec<f64>,
}

impl Serialize for LogicalRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LogicalRecord::InitialData(data) => TaggedInitialData {
                record_type: INITIAL_DATA_RECORD_TYPE,
                data,
            }
            .serialize(serializer),
            LogicalRecord::Opaque {
                record_type,
                values,
            } => OpaqueJson {
                record_type: *record_type,
                buf: values.clone(),
            }
            .serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for LogicalRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = Json::deserialize(deserializer)?;
        let record_type = json
            .get("record_type")
            .and_then(Json::as_i64)
            .ok_or_else(|| D::Error::custom("logical record needs an integer record_type"))?;

        if record_type == INITIAL_DATA_RECORD_TYPE {
            InitialData::deserialize(json)
                .map(LogicalRecord::InitialData)
                .map_err(D::Error::custom)
        } else {
            let opaque = OpaqueJson::deserialize(json).map_err(D::Error::custom)?;
            Ok(LogicalRecord::Opaque {
                record_type: opaque.record_type,
                values: opaque.buf,
            })
        }
    }
}
