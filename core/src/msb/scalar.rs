//! Byte-level encoding of single MSB slots.

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};

use super::format::{Endian, NumType};
use crate::error::MsbError;
use crate::record::float_to_int;

/// A slot value before it is narrowed to its wire type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Scalar {
    Float(f64),
    Int(i128),
}

impl Scalar {
    /// Read as an integer, requiring integral floats.
    pub(crate) fn to_int(self) -> Result<i128, MsbError> {
        match self {
            Scalar::Int(i) => Ok(i),
            Scalar::Float(f) => float_to_int(f)
                .map(i128::from)
                .ok_or(MsbError::NonInteger(f)),
        }
    }

    pub(crate) fn to_float(self) -> Result<f64, MsbError> {
        match self {
            Scalar::Float(f) if f.is_finite() => Ok(f),
            Scalar::Float(f) => Err(MsbError::NonFinite(f)),
            Scalar::Int(i) => Ok(i as f64),
        }
    }
}

pub(crate) fn decode(ty: NumType, endian: Endian, bytes: &[u8]) -> Scalar {
    match endian {
        Endian::Little => decode_with::<LittleEndian>(ty, bytes),
        Endian::Big => decode_with::<BigEndian>(ty, bytes),
    }
}

fn decode_with<B: ByteOrder>(ty: NumType, bytes: &[u8]) -> Scalar {
    match ty {
        NumType::F32 => Scalar::Float(f64::from(B::read_f32(bytes))),
        NumType::F64 => Scalar::Float(B::read_f64(bytes)),
        NumType::I32 => Scalar::Int(i128::from(B::read_i32(bytes))),
        NumType::U32 => Scalar::Int(i128::from(B::read_u32(bytes))),
        NumType::I64 => Scalar::Int(i128::from(B::read_i64(bytes))),
        NumType::U64 => Scalar::Int(i128::from(B::read_u64(bytes))),
    }
}

/// Append `value` as `ty`, failing if it is not representable.
pub(crate) fn encode(
    out: &mut Vec<u8>,
    ty: NumType,
    endian: Endian,
    value: Scalar,
) -> Result<(), MsbError> {
    match endian {
        Endian::Little => encode_with::<LittleEndian>(out, ty, value),
        Endian::Big => encode_with::<BigEndian>(out, ty, value),
    }
}

fn encode_with<B: ByteOrder>(out: &mut Vec<u8>, ty: NumType, value: Scalar) -> Result<(), MsbError> {
    let out_of_range = || MsbError::OutOfRange {
        value: match value {
            Scalar::Float(f) => f.to_string(),
            Scalar::Int(i) => i.to_string(),
        },
        ty,
    };

    match ty {
        NumType::F32 => {
            let f = value.to_float()?;
            if f.abs() > f64::from(f32::MAX) {
                return Err(out_of_range());
            }
            out.write_f32::<B>(f as f32)?;
        }
        NumType::F64 => out.write_f64::<B>(value.to_float()?)?,
        NumType::I32 => {
            let i = i32::try_from(value.to_int()?).map_err(|_| out_of_range())?;
            out.write_i32::<B>(i)?;
        }
        NumType::U32 => {
            let i = u32::try_from(value.to_int()?).map_err(|_| out_of_range())?;
            out.write_u32::<B>(i)?;
        }
        NumType::I64 => {
            let i = i64::try_from(value.to_int()?).map_err(|_| out_of_range())?;
            out.write_i64::<B>(i)?;
        }
        NumType::U64 => {
            let i = u64::try_from(value.to_int()?).map_err(|_| out_of_range())?;
            out.write_u64::<B>(i)?;
        }
    }
    Ok(())
}
