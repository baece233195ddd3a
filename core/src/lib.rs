//! MELA tools core - record codecs for forest simulation data
//!
//! This crate reads and writes the data files of the MELA forest simulator
//! and converts them to and from a JSON interchange form.
//!
//! # Architecture
//!
//! - [`record`] - Declarative field/record framework over a float stream
//! - [`rsd`] - Initial-data records: sample plots and their trees
//! - [`msb`] - MELA Standard Binary physical/logical record streams
//! - [`par`] - Simulation definitions in PAR text and JSON
//! - [`error`] - Error types shared by every codec

pub mod error;
pub mod msb;
pub mod par;
pub mod record;
pub mod rsd;
pub mod var;

pub use error::{ErrorKind, MsbError, ParError, RecordError};
pub use msb::{LogicalRecord, MsbFormat, MsbReader, MsbWriter, PhysicalRecord, read_msb, write_msb};
pub use par::{Par, SymbolTable, Vocabulary, parse_par};
pub use rsd::{InitialData, SamplePlot, Tree};
