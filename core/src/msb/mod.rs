//! MELA Standard Binary (MSB) record streams.
//!
//! An MSB file is a sequence of physical records, each holding one or more
//! logical records. Slot widths and byte order depend on the machine and
//! compiler that produced the file and are described by [`MsbFormat`].

mod format;
mod reader;
mod scalar;
mod types;
mod writer;

pub use format::{Endian, MsbFormat, NumType};
pub use reader::{MsbReader, Records, read_msb};
pub use types::{LogicalRecord, PhysicalRecord, Uid};
pub use writer::{MsbWriter, write_msb};
