//! Error types for the record, MSB and PAR codecs.

use std::io;

use thiserror::Error;

use crate::msb::NumType;
use crate::par::EventKey;

/// Coarse classification shared by every codec error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input breaks a rule of the format (bad length, bad value, bad name).
    FormatViolation,
    /// The input ended in the middle of a record.
    TruncatedInput,
    /// The same event id was defined twice.
    DuplicateEvent,
    /// The underlying reader or writer failed.
    Io,
}

/// Errors raised by the field/record framework.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    /// Read past the end of a float stream.
    #[error("buffer overrun")]
    BufferOverrun,

    /// A value that must be an integer has a fractional part.
    #[error("non-integer floating point: {0}")]
    NonInteger(f64),

    /// A constant slot holds something other than its fixed value.
    #[error("expected {expected}, found {found}")]
    ConstantMismatch { expected: f64, found: f64 },

    /// A required field has no value at encode time.
    #[error("missing value")]
    MissingValue,

    /// A value of the wrong type was stored in a field.
    #[error("expected {expected}, got {found}")]
    TypeMismatch { expected: &'static str, found: String },

    /// A field name that the record schema does not declare.
    #[error("{record} has no field '{name}'")]
    UnknownField { record: &'static str, name: String },

    /// A field count header that is negative or larger than the schema.
    #[error("given {given} {record} fields but only have {max}")]
    TooManyFields {
        record: &'static str,
        given: i64,
        max: usize,
    },

    /// A negative element count header.
    #[error("invalid {what} count: {count}")]
    InvalidCount { what: &'static str, count: i64 },

    /// Values left over after a complete record was decoded.
    #[error("{count} unread values after {record}")]
    TrailingValues { record: &'static str, count: usize },

    /// A single field failed; wraps the cause with the field's identity.
    #[error("failed to {action} {record} field {field}")]
    Field {
        action: &'static str,
        record: &'static str,
        field: &'static str,
        #[source]
        source: Box<RecordError>,
    },
}

impl RecordError {
    /// Record payloads arrive whole, so running short is a format violation
    /// rather than truncated input.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::FormatViolation
    }

    pub(crate) fn in_field(
        self,
        action: &'static str,
        record: &'static str,
        field: &'static str,
    ) -> Self {
        RecordError::Field {
            action,
            record,
            field,
            source: Box::new(self),
        }
    }
}

/// Errors raised while reading or writing MSB binary streams.
#[derive(Debug, Error)]
pub enum MsbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stream ended inside a physical record.
    #[error("truncated physical record: unexpected end of input while reading {0}")]
    Truncated(&'static str),

    /// Leading and trailing length fields disagree.
    #[error("length mismatch: {trailing} != {leading}")]
    LengthMismatch { leading: i128, trailing: i128 },

    #[error("non-finite floating point: {0}")]
    NonFinite(f64),

    #[error("unexpected non-integer floating point: {0}")]
    NonInteger(f64),

    /// A value cannot be represented in the configured machine type.
    #[error("{value} does not fit in {ty}")]
    OutOfRange { value: String, ty: NumType },

    /// The numeric type triple is unusable (e.g. an integer float type).
    #[error("invalid MSB format: {0}")]
    InvalidFormat(String),

    /// Any other structural violation of the physical record layout.
    #[error("malformed physical record: {0}")]
    Malformed(String),

    /// A logical record payload failed to encode or decode.
    #[error("logical record of type {record_type}")]
    Record {
        record_type: i64,
        #[source]
        source: RecordError,
    },
}

impl MsbError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MsbError::Io(_) => ErrorKind::Io,
            MsbError::Truncated(_) => ErrorKind::TruncatedInput,
            _ => ErrorKind::FormatViolation,
        }
    }
}

/// Errors raised by the PAR model, text codec and JSON form.
#[derive(Debug, Error)]
pub enum ParError {
    #[error("duplicate event: {0}")]
    DuplicateEvent(EventKey),

    /// The token front end could not make sense of a line.
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// A recognized attribute name that events do not accept.
    #[error("unexpected event parameter '{name}' in event {event}")]
    UnexpectedAttribute { event: EventKey, name: String },

    /// A command whose parameters do not have the required shape.
    #[error("invalid {command}: {message}")]
    Invalid {
        command: &'static str,
        message: String,
    },

    /// A DNF condition float sequence is malformed.
    #[error("invalid condition: {0}")]
    Condition(String),

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// A single token is wider than the configured line.
    #[error("parameter is too long to be line-wrapped: {0}")]
    TooLong(String),

    /// Wraps a fatal failure with the statement it came from.
    #[error("parser failed at line {line} ({command})")]
    Command {
        command: String,
        line: usize,
        #[source]
        source: Box<ParError>,
    },

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ParError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParError::DuplicateEvent(_) => ErrorKind::DuplicateEvent,
            ParError::Command { source, .. } => source.kind(),
            _ => ErrorKind::FormatViolation,
        }
    }

    pub(crate) fn invalid(command: &'static str, message: impl Into<String>) -> Self {
        ParError::Invalid {
            command,
            message: message.into(),
        }
    }
}
