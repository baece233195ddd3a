//! Streaming MSB reader
//!
//! Physical record layout:
//!
//! ```text
//! length        : int
//! uid           : uid
//! total values  : int
//!   record type : float   \
//!   value count : float    | repeated until total values are consumed
//!   payload     : [float] /
//! length again  : int
//! ```

use std::io::{self, Read};

use tracing::debug;

use super::format::{MsbFormat, NumType};
use super::scalar::{self, Scalar};
use super::types::{LogicalRecord, PhysicalRecord, Uid};
use crate::error::MsbError;

/// Reader for MSB physical records
pub struct MsbReader<R: Read> {
    reader: R,
    format: MsbFormat,
    count: usize,
}

impl<R: Read> MsbReader<R> {
    /// Create a reader, rejecting unusable formats up front
    pub fn new(reader: R, format: MsbFormat) -> Result<Self, MsbError> {
        format.validate()?;
        Ok(Self {
            reader,
            format,
            count: 0,
        })
    }

    pub fn format(&self) -> &MsbFormat {
        &self.format
    }

    /// Read the next physical record.
    ///
    /// Returns `Ok(None)` only when the input ends exactly where the next
    /// record would start. A short read anywhere else is
    /// [`MsbError::Truncated`].
    pub fn read_physical_record(&mut self) -> Result<Option<PhysicalRecord>, MsbError> {
        let Some(length) = self.read_leading_length()? else {
            debug!(records = self.count, "end of MSB stream");
            return Ok(None);
        };

        let uid = self.read_uid()?;
        let total = self.read_int("value count")?;
        if total < 0 {
            return Err(MsbError::Malformed(format!("negative value count {total}")));
        }

        let mut consumed: i128 = 0;
        let mut records = Vec::new();
        while consumed < total {
            let record_type = self.read_fpint("record type")?;
            let size = self.read_fpint("record size")?;
            if size < 0 {
                return Err(MsbError::Malformed(format!(
                    "negative size {size} for logical record of type {record_type}"
                )));
            }
            if consumed + 2 + size > total {
                return Err(MsbError::Malformed(format!(
                    "logical record of type {record_type} overruns the value count {total}"
                )));
            }

            let count = usize::try_from(size).map_err(|_| {
                MsbError::Malformed(format!(
                    "size {size} for logical record of type {record_type} is too large"
                ))
            })?;
            let values = self.read_floats(count)?;
            let record = LogicalRecord::from_floats(record_type as i64, values).map_err(
                |source| MsbError::Record {
                    record_type: record_type as i64,
                    source,
                },
            )?;
            records.push(record);
            consumed += size + 2;
        }

        let trailing = self.read_int("trailing length")?;
        if trailing != length {
            return Err(MsbError::LengthMismatch {
                leading: length,
                trailing,
            });
        }

        self.count += 1;
        debug!(uid = %uid, logical = records.len(), "read physical record");
        Ok(Some(PhysicalRecord { uid, records }))
    }

    /// Iterate over the remaining physical records. Iteration stops after the
    /// first error.
    pub fn records(&mut self) -> Records<'_, R> {
        Records {
            reader: self,
            done: false,
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn read_leading_length(&mut self) -> Result<Option<i128>, MsbError> {
        let ty = self.format.int_type;
        let mut buf = [0u8; 8];
        let buf = &mut buf[..ty.size()];

        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        match filled {
            0 => Ok(None),
            n if n < buf.len() => Err(MsbError::Truncated("record length")),
            _ => Ok(Some(scalar::decode(ty, self.format.endian, buf).to_int()?)),
        }
    }

    fn read_scalar(&mut self, ty: NumType, what: &'static str) -> Result<Scalar, MsbError> {
        let mut buf = [0u8; 8];
        let buf = &mut buf[..ty.size()];
        self.fill(buf, what)?;
        Ok(scalar::decode(ty, self.format.endian, buf))
    }

    fn fill(&mut self, buf: &mut [u8], what: &'static str) -> Result<(), MsbError> {
        self.reader.read_exact(buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                MsbError::Truncated(what)
            } else {
                MsbError::Io(e)
            }
        })
    }

    fn read_uid(&mut self) -> Result<Uid, MsbError> {
        match self.read_scalar(self.format.uid_type, "uid")? {
            Scalar::Float(f) if f.is_finite() => Ok(Uid::Float(f)),
            Scalar::Float(f) => Err(MsbError::NonFinite(f)),
            Scalar::Int(i) => i64::try_from(i).map(Uid::Int).map_err(|_| MsbError::OutOfRange {
                value: i.to_string(),
                ty: NumType::I64,
            }),
        }
    }

    fn read_int(&mut self, what: &'static str) -> Result<i128, MsbError> {
        self.read_scalar(self.format.int_type, what)?.to_int()
    }

    fn read_float(&mut self, what: &'static str) -> Result<f64, MsbError> {
        self.read_scalar(self.format.float_type, what)?.to_float()
    }

    /// Read an integer stored in a float slot
    fn read_fpint(&mut self, what: &'static str) -> Result<i128, MsbError> {
        Scalar::Float(self.read_float(what)?).to_int()
    }

    fn read_floats(&mut self, n: usize) -> Result<Vec<f64>, MsbError> {
        let ty = self.format.float_type;
        let size = ty.size();
        let len = n.checked_mul(size).ok_or_else(|| {
            MsbError::Malformed(format!("payload of {n} values is too large"))
        })?;

        // grow with the data actually present rather than trusting the header
        let mut buf = Vec::new();
        (&mut self.reader).take(len as u64).read_to_end(&mut buf)?;
        if buf.len() < len {
            return Err(MsbError::Truncated("record payload"));
        }

        buf.chunks_exact(size)
            .map(|chunk| scalar::decode(ty, self.format.endian, chunk).to_float())
            .collect()
    }
}

/// Iterator over physical records, see [`MsbReader::records`]
pub struct Records<'a, R: Read> {
    reader: &'a mut MsbReader<R>,
    done: bool,
}

impl<R: Read> Iterator for Records<'_, R> {
    type Item = Result<PhysicalRecord, MsbError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_physical_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Read every physical record from `reader`
pub fn read_msb<R: Read>(reader: R, format: MsbFormat) -> Result<Vec<PhysicalRecord>, MsbError> {
    MsbReader::new(reader, format)?.records().collect()
}
