//! Cursor over a flat sequence of floats.

use crate::error::RecordError;

/// Ordered float buffer with a read cursor.
///
/// Decoding consumes values from the front; encoding appends to the back.
/// Reads past the end fail with [`RecordError::BufferOverrun`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloatStream {
    buf: Vec<f64>,
    pos: usize,
}

impl FloatStream {
    /// Create an empty stream for encoding
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stream positioned at the start of `buf`
    pub fn from_vec(buf: Vec<f64>) -> Self {
        Self { buf, pos: 0 }
    }

    /// Consume the next value
    pub fn read(&mut self) -> Result<f64, RecordError> {
        let v = self.peek()?;
        self.pos += 1;
        Ok(v)
    }

    /// Look at the next value without consuming it
    pub fn peek(&self) -> Result<f64, RecordError> {
        self.buf
            .get(self.pos)
            .copied()
            .ok_or(RecordError::BufferOverrun)
    }

    /// Consume the next value, which must be integral
    pub fn read_int(&mut self) -> Result<i64, RecordError> {
        let f = self.peek()?;
        let i = float_to_int(f).ok_or(RecordError::NonInteger(f))?;
        self.pos += 1;
        Ok(i)
    }

    /// Append one value
    pub fn write(&mut self, v: f64) {
        self.buf.push(v);
    }

    /// Append a slice of values
    pub fn write_all(&mut self, values: &[f64]) {
        self.buf.extend_from_slice(values);
    }

    /// Number of values not yet consumed
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Unconsumed values
    pub fn as_slice(&self) -> &[f64] {
        &self.buf[self.pos..]
    }

    /// Take the whole underlying buffer (consumed values included)
    pub fn into_vec(self) -> Vec<f64> {
        self.buf
    }
}

/// Convert a float to an integer only if it has no fractional part.
pub fn float_to_int(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
    if f.is_finite() && f.trunc() == f && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
