//! Simulation definitions: the PAR text format and its JSON form.
//!
//! [`parse_par`] scans and interprets PAR text into a [`Par`];
//! [`Par::to_par_string`] renders it back with line wrapping. The same
//! model serializes to and from JSON through serde.

mod condition;
mod interpreter;
mod json;
mod lexer;
mod links;
mod model;
mod records;
mod symbols;
mod writer;

pub use condition::{Constraint, ConstraintValue, DnfCondition};
pub use interpreter::{
    CommandHandler, CommandTable, Interpreted, Interpreter, ParseState, Warning, parse_par,
};
pub use lexer::{CommandKind, Param, ParCommand, tokenize};
pub use links::EventLinks;
pub use model::{
    Event, EventAttributes, EventDef, EventDefaults, EventKey, EventRef, Par, RoutineCall,
};
pub use records::{Control, ControlSchema, Output, OutputSchema};
pub use symbols::{Keyword, SymbolTable, Vocabulary};
pub use writer::{DEFAULT_LINE_WIDTH, ParWriter, StatementKind};
