//! MSB writer

use std::io::Write;

use tracing::debug;

use super::format::MsbFormat;
use super::scalar::{self, Scalar};
use super::types::{PhysicalRecord, Uid};
use crate::error::MsbError;

/// Writer for MSB physical records
pub struct MsbWriter<W: Write> {
    writer: W,
    format: MsbFormat,
}

impl<W: Write> MsbWriter<W> {
    pub fn new(writer: W, format: MsbFormat) -> Result<Self, MsbError> {
        format.validate()?;
        Ok(Self { writer, format })
    }

    /// Encode one physical record.
    ///
    /// The record is assembled in memory first, so a record that fails to
    /// encode leaves nothing behind in the output.
    pub fn write_physical_record(&mut self, record: &PhysicalRecord) -> Result<(), MsbError> {
        let fmt = self.format;

        let payloads = record
            .records
            .iter()
            .map(|r| {
                r.to_floats().map_err(|source| MsbError::Record {
                    record_type: r.record_type(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let total: usize = payloads.iter().map(|p| p.len() + 2).sum();
        let length = fmt.uid_type.size() + fmt.int_type.size() + total * fmt.float_type.size();

        let mut out = Vec::with_capacity(length + 2 * fmt.int_type.size());
        let int = |out: &mut Vec<u8>, v: usize| {
            scalar::encode(out, fmt.int_type, fmt.endian, Scalar::Int(v as i128))
        };
        let float = |out: &mut Vec<u8>, v: Scalar| scalar::encode(out, fmt.float_type, fmt.endian, v);

        int(&mut out, length)?;
        let uid = match record.uid {
            Uid::Int(i) => Scalar::Int(i128::from(i)),
            Uid::Float(f) => Scalar::Float(f),
        };
        scalar::encode(&mut out, fmt.uid_type, fmt.endian, uid)?;
        int(&mut out, total)?;

        for (r, payload) in record.records.iter().zip(&payloads) {
            float(&mut out, Scalar::Int(i128::from(r.record_type())))?;
            float(&mut out, Scalar::Int(payload.len() as i128))?;
            for &v in payload {
                float(&mut out, Scalar::Float(v))?;
            }
        }

        int(&mut out, length)?;

        self.writer.write_all(&out)?;
        debug!(uid = %record.uid, logical = record.records.len(), bytes = out.len(), "wrote physical record");
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), MsbError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Write every physical record to `writer`
pub fn write_msb<W: Write>(
    writer: W,
    records: &[PhysicalRecord],
    format: MsbFormat,
) -> Result<(), MsbError> {
    let mut msb = MsbWriter::new(writer, format)?;
    for record in records {
        msb.write_physical_record(record)?;
    }
    msb.flush()
}
