//! Machine-dependent numeric layout of MSB streams.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MsbError;

/// A machine number type used for one MSB slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumType {
    F32,
    F64,
    I32,
    U32,
    I64,
    U64,
}

impl NumType {
    /// Width in bytes
    pub fn size(self) -> usize {
        match self {
            NumType::F32 | NumType::I32 | NumType::U32 => 4,
            NumType::F64 | NumType::I64 | NumType::U64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, NumType::F32 | NumType::F64)
    }

    pub fn name(self) -> &'static str {
        match self {
            NumType::F32 => "f32",
            NumType::F64 => "f64",
            NumType::I32 => "i32",
            NumType::U32 => "u32",
            NumType::I64 => "i64",
            NumType::U64 => "u64",
        }
    }
}

impl fmt::Display for NumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NumType {
    type Err = MsbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "f32" => Ok(NumType::F32),
            "f64" => Ok(NumType::F64),
            "i32" => Ok(NumType::I32),
            "u32" => Ok(NumType::U32),
            "i64" => Ok(NumType::I64),
            "u64" => Ok(NumType::U64),
            _ => Err(MsbError::InvalidFormat(format!("unknown number type '{s}'"))),
        }
    }
}

/// Byte order of every slot in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Byte order of the running machine
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        }
    }
}

impl Default for Endian {
    fn default() -> Self {
        Self::native()
    }
}

impl FromStr for Endian {
    type Err = MsbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "little" | "le" => Ok(Endian::Little),
            "big" | "be" => Ok(Endian::Big),
            "native" => Ok(Endian::native()),
            _ => Err(MsbError::InvalidFormat(format!("unknown byte order '{s}'"))),
        }
    }
}

/// Numeric layout of an MSB stream.
///
/// The same logical data may come from different compilers and machines, so
/// widths and byte order are chosen per conversion rather than fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MsbFormat {
    pub uid_type: NumType,
    pub float_type: NumType,
    pub int_type: NumType,
    pub endian: Endian,
}

impl Default for MsbFormat {
    fn default() -> Self {
        Self {
            uid_type: NumType::F64,
            float_type: NumType::F32,
            int_type: NumType::U32,
            endian: Endian::native(),
        }
    }
}

impl MsbFormat {
    /// Check that float and int slots have sensible types.
    pub fn validate(&self) -> Result<(), MsbError> {
        if !self.float_type.is_float() {
            return Err(MsbError::InvalidFormat(format!(
                "float type must be f32 or f64, got {}",
                self.float_type
            )));
        }
        if self.int_type.is_float() {
            return Err(MsbError::InvalidFormat(format!(
                "int type must be an integer type, got {}",
                self.int_type
            )));
        }
        Ok(())
    }
}

impl fmt::Display for MsbFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "uid={} float={} int={} endian={:?}",
            self.uid_type, self.float_type, self.int_type, self.endian
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format() {
        let fmt = MsbFormat::default();
        assert_eq!(fmt.uid_type, NumType::F64);
        assert_eq!(fmt.float_type, NumType::F32);
        assert_eq!(fmt.int_type, NumType::U32);
        assert!(fmt.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_swapped_types() {
        let fmt = MsbFormat {
            float_type: NumType::I32,
            ..Default::default()
        };
        assert!(fmt.validate().is_err());

        let fmt = MsbFormat {
            int_type: NumType::F64,
            ..Default::default()
        };
        assert!(fmt.validate().is_err());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("u64".parse::<NumType>().unwrap(), NumType::U64);
        assert!("f16".parse::<NumType>().is_err());
        assert_eq!("be".parse::<Endian>().unwrap(), Endian::Big);
        assert_eq!(NumType::I32.to_string(), "i32");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let fmt: MsbFormat =
            serde_json::from_str(r#"{ "int_type": "i64", "endian": "big" }"#).unwrap();
        assert_eq!(fmt.int_type, NumType::I64);
        assert_eq!(fmt.endian, Endian::Big);
        assert_eq!(fmt.float_type, NumType::F32);
    }
}
