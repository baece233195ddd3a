//! PAR command interpreter.
//!
//! Commands from the scanner are dispatched through a [`CommandTable`] keyed by
//! canonical keyword. Unknown vocabulary is skipped with a [`Warning`];
//! structural problems abort with a [`ParError`] that names the command and
//! line. Event cross-references are collected in an [`EventLinks`] table and
//! resolved after the last command.

use std::fmt;

use hashbrown::HashMap;
use tracing::{debug, warn};

use super::condition::DnfCondition;
use super::lexer::{self, ParCommand, Param};
use super::links::EventLinks;
use super::model::{Event, EventDef, EventDefaults, EventKey, Par, RoutineCall};
use super::records::{Control, Output};
use super::symbols::{Keyword, SymbolTable};
use crate::error::ParError;
use crate::record::{FloatStream, Record, RecordSchema, float_to_int};

/// Recoverable problem found while interpreting.
#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// A command word with no handler
    UnknownCommand { name: String, line: usize },
    /// An event attribute that is not `name numbers...` in a known name
    InvalidAttribute { event: EventKey, text: String },
    /// Values beyond the end of a fixed-size record
    ExtraValues { command: &'static str, count: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnknownCommand { name, line } => {
                write!(f, "skipping unknown command '{name}' at line {line}")
            }
            Warning::InvalidAttribute { event, text } => {
                write!(f, "skipping invalid argument list in event {event}: {text}")
            }
            Warning::ExtraValues { command, count } => {
                write!(f, "ignoring {count} extra values of {command}")
            }
        }
    }
}

/// Result of interpreting a document.
#[derive(Debug, Clone)]
pub struct Interpreted {
    pub par: Par,
    pub warnings: Vec<Warning>,
}

/// Mutable state threaded through command handlers.
pub struct ParseState<'a> {
    pub par: Par,
    pub links: EventLinks,
    pub warnings: Vec<Warning>,
    symbols: &'a dyn SymbolTable,
}

impl ParseState<'_> {
    fn warn(&mut self, warning: Warning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }
}

pub type CommandHandler = fn(&mut ParseState<'_>, &ParCommand) -> Result<(), ParError>;

/// Mapping from keyword to handler.
#[derive(Clone)]
pub struct CommandTable {
    handlers: HashMap<Keyword, CommandHandler>,
}

impl CommandTable {
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Handlers for every top-level command of the format
    pub fn standard() -> Self {
        let mut table = Self::empty();
        table.register(Keyword::Event, cmd_event);
        table.register(Keyword::EventDefaults, cmd_event_defaults);
        table.register(Keyword::Years, cmd_years);
        table.register(Keyword::Output, cmd_output);
        table.register(Keyword::Control, cmd_control);
        table.register(Keyword::Include, cmd_include);
        table
    }

    pub fn register(&mut self, keyword: Keyword, handler: CommandHandler) {
        self.handlers.insert(keyword, handler);
    }

    pub fn get(&self, keyword: Keyword) -> Option<CommandHandler> {
        self.handlers.get(&keyword).copied()
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::standard()
    }
}

pub struct Interpreter<'a> {
    symbols: &'a dyn SymbolTable,
    table: CommandTable,
}

impl<'a> Interpreter<'a> {
    pub fn new(symbols: &'a dyn SymbolTable, table: CommandTable) -> Self {
        Self { symbols, table }
    }

    /// Interpret commands in order, then link event references.
    pub fn run(&self, commands: &[ParCommand]) -> Result<Interpreted, ParError> {
        let mut state = ParseState {
            par: Par::new(),
            links: EventLinks::new(),
            warnings: Vec::new(),
            symbols: self.symbols,
        };

        for cmd in commands {
            let keyword = match cmd.kind {
                lexer::CommandKind::Include => Some(Keyword::Include),
                _ => self.symbols.lookup(&cmd.name),
            };
            let Some(handler) = keyword.and_then(|kw| self.table.get(kw)) else {
                state.warn(Warning::UnknownCommand {
                    name: cmd.name.clone(),
                    line: cmd.line,
                });
                continue;
            };

            debug!(command = %cmd.name, line = cmd.line, "interpreting");
            handler(&mut state, cmd).map_err(|source| ParError::Command {
                command: cmd.name.clone(),
                line: cmd.line,
                source: Box::new(source),
            })?;
        }

        let ParseState {
            mut par,
            links,
            warnings,
            ..
        } = state;
        links.link(&mut par);
        Ok(Interpreted { par, warnings })
    }
}

/// Scan and interpret PAR source text.
pub fn parse_par(src: &str, symbols: &dyn SymbolTable) -> Result<Interpreted, ParError> {
    let include_name = symbols.name(Keyword::Include);
    let mut include_words = vec!["LUE", "INCLUDE"];
    if !include_words.contains(&include_name) {
        include_words.push(include_name);
    }

    let commands = lexer::tokenize(src, &include_words)?;
    Interpreter::new(symbols, CommandTable::standard()).run(&commands)
}

fn numbers(cmd: &ParCommand, command: &'static str) -> Result<Vec<f64>, ParError> {
    cmd.params
        .iter()
        .map(|p| {
            p.as_number()
                .ok_or_else(|| ParError::invalid(command, "expected numbers only"))
        })
        .collect()
}

fn cmd_years(state: &mut ParseState<'_>, cmd: &ParCommand) -> Result<(), ParError> {
    state.par.years = Some(numbers(cmd, "years")?);
    Ok(())
}

/// Decode a fixed-size record; values past its end are warned about.
fn fixed_record<K: RecordSchema>(
    state: &mut ParseState<'_>,
    cmd: &ParCommand,
) -> Result<Record<K>, ParError> {
    let mut stream = FloatStream::from_vec(numbers(cmd, K::NAME)?);
    let record = Record::<K>::decode(&mut stream)?;
    if !stream.is_exhausted() {
        state.warn(Warning::ExtraValues {
            command: K::NAME,
            count: stream.remaining(),
        });
    }
    Ok(record)
}

fn cmd_output(state: &mut ParseState<'_>, cmd: &ParCommand) -> Result<(), ParError> {
    let output: Output = fixed_record(state, cmd)?;
    state.par.output = Some(output);
    Ok(())
}

fn cmd_control(state: &mut ParseState<'_>, cmd: &ParCommand) -> Result<(), ParError> {
    let control: Control = fixed_record(state, cmd)?;
    state.par.control = Some(control);
    Ok(())
}

fn cmd_include(state: &mut ParseState<'_>, cmd: &ParCommand) -> Result<(), ParError> {
    let path = cmd
        .params
        .first()
        .and_then(Param::as_text)
        .ok_or_else(|| ParError::invalid("include", "missing file name"))?;
    state.par.includes.push(path.to_string());
    Ok(())
}

fn cmd_event(state: &mut ParseState<'_>, cmd: &ParCommand) -> Result<(), ParError> {
    let ident = cmd
        .params
        .first()
        .and_then(Param::as_text)
        .ok_or_else(|| ParError::invalid("event", "missing '<id> <name>' header"))?;
    let (id, name) = ident
        .split_once(char::is_whitespace)
        .map(|(id, name)| (id, name.trim()))
        .filter(|(_, name)| !name.is_empty())
        .ok_or_else(|| ParError::invalid("event", format!("missing name in '{ident}'")))?;
    let id = id
        .parse::<i64>()
        .map_err(|_| ParError::invalid("event", format!("bad event id '{id}'")))?;

    let mut def = EventDef::Event(Event::new(id, name));
    for param in &cmd.params[1..] {
        event_attribute(state, &mut def, param)?;
    }
    state.par.add_event(def)
}

fn cmd_event_defaults(state: &mut ParseState<'_>, cmd: &ParCommand) -> Result<(), ParError> {
    let mut def = EventDef::Defaults(EventDefaults::default());
    for param in &cmd.params {
        event_attribute(state, &mut def, param)?;
    }
    state.par.add_event(def)
}

/// Parse one `name values...` event attribute.
fn event_attribute(
    state: &mut ParseState<'_>,
    def: &mut EventDef,
    param: &Param,
) -> Result<(), ParError> {
    let key = def.key();
    let text = match param {
        Param::Text(t) => t.as_str(),
        Param::Number(n) => {
            state.warn(Warning::InvalidAttribute {
                event: key,
                text: n.to_string(),
            });
            return Ok(());
        }
    };

    let mut words = text.split_whitespace();
    let parsed = words.next().and_then(|name| {
        let keyword = state.symbols.lookup(name)?;
        let values = words
            .map(|w| w.parse::<f64>().ok().filter(|v| v.is_finite()))
            .collect::<Option<Vec<_>>>()?;
        Some((name, keyword, values))
    });
    let Some((name, keyword, values)) = parsed else {
        state.warn(Warning::InvalidAttribute {
            event: key,
            text: text.to_string(),
        });
        return Ok(());
    };

    let ids = |what: &'static str| {
        values
            .iter()
            .map(|&v| {
                float_to_int(v).ok_or_else(|| ParError::invalid(what, format!("bad event id {v}")))
            })
            .collect::<Result<Vec<_>, _>>()
    };

    match keyword {
        Keyword::EventYears => {
            let (&repeat, years) = values
                .split_last()
                .ok_or_else(|| ParError::invalid("event years", "no values"))?;
            let attrs = def.attributes_mut();
            attrs.years = years.to_vec();
            attrs.repeat_interval = Some(repeat);
        }
        Keyword::MinIntervals => def.attributes_mut().min_intervals = values,
        Keyword::Branching => def.attributes_mut().branching = values,
        Keyword::Probability => def.attributes_mut().probability = values,
        Keyword::Condition => {
            def.attributes_mut().condition = Some(DnfCondition::from_floats(&values)?)
        }
        Keyword::ComparableEvents => state.links.add_comparable(key, ids("comparable events")?),
        Keyword::FeasiblePredecessors => {
            state.links.add_predecessors(key, ids("feasible predecessors")?)
        }
        Keyword::RoutineCall => match def {
            EventDef::Event(ev) => ev.calls.push(RoutineCall::from_floats(&values)?),
            EventDef::Defaults(_) => {
                return Err(ParError::invalid(
                    "event defaults",
                    "routine calls are not allowed",
                ));
            }
        },
        _ => {
            return Err(ParError::UnexpectedAttribute {
                event: key,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}
