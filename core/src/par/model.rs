//! Simulation-definition model shared by the PAR, JSON and binary paths.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::condition::DnfCondition;
use super::records::{Control, Output};
use crate::error::ParError;

/// Key of an entry in the event table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKey {
    /// The single event-defaults entry
    Defaults,
    Id(i64),
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKey::Defaults => f.write_str("default"),
            EventKey::Id(id) => write!(f, "{id}"),
        }
    }
}

impl FromStr for EventKey {
    type Err = ParError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "default" {
            return Ok(EventKey::Defaults);
        }
        s.trim()
            .parse()
            .map(EventKey::Id)
            .map_err(|_| ParError::invalid("event", format!("bad event id '{s}'")))
    }
}

/// A weak reference to another event by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventRef {
    /// The id names an event of the same document
    Resolved(i64),
    /// Dangling id, kept as data
    Unresolved(i64),
}

impl EventRef {
    pub fn id(self) -> i64 {
        match self {
            EventRef::Resolved(id) | EventRef::Unresolved(id) => id,
        }
    }

    pub fn is_resolved(self) -> bool {
        matches!(self, EventRef::Resolved(_))
    }
}

/// Attributes shared by events and event defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventAttributes {
    pub years: Vec<f64>,
    pub repeat_interval: Option<f64>,
    pub branching: Vec<f64>,
    pub probability: Vec<f64>,
    pub condition: Option<DnfCondition>,
    pub min_intervals: Vec<f64>,
    pub comparable_events: Vec<EventRef>,
    pub feasible_predecessors: Vec<EventRef>,
}

/// Call of a simulator routine with numeric arguments.
///
/// On the wire a call is `[routine, 1, args...]`; the second slot is a fixed
/// marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineCall {
    pub routine: f64,
    #[serde(default)]
    pub args: Vec<f64>,
}

impl RoutineCall {
    pub fn new(routine: f64, args: Vec<f64>) -> Self {
        Self { routine, args }
    }

    pub fn to_floats(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.args.len() + 2);
        out.push(self.routine);
        out.push(1.0);
        out.extend_from_slice(&self.args);
        out
    }

    pub fn from_floats(values: &[f64]) -> Result<Self, ParError> {
        let (&routine, rest) = values
            .split_first()
            .ok_or_else(|| ParError::invalid("routine call", "missing routine number"))?;
        Ok(Self {
            routine,
            args: rest.get(1..).unwrap_or_default().to_vec(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub attributes: EventAttributes,
    pub calls: Vec<RoutineCall>,
}

impl Event {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            attributes: EventAttributes::default(),
            calls: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDefaults {
    pub attributes: EventAttributes,
}

/// An entry of the event table.
#[derive(Debug, Clone, PartialEq)]
pub enum EventDef {
    Defaults(EventDefaults),
    Event(Event),
}

impl EventDef {
    pub fn key(&self) -> EventKey {
        match self {
            EventDef::Defaults(_) => EventKey::Defaults,
            EventDef::Event(ev) => EventKey::Id(ev.id),
        }
    }

    pub fn attributes(&self) -> &EventAttributes {
        match self {
            EventDef::Defaults(d) => &d.attributes,
            EventDef::Event(ev) => &ev.attributes,
        }
    }

    pub fn attributes_mut(&mut self) -> &mut EventAttributes {
        match self {
            EventDef::Defaults(d) => &mut d.attributes,
            EventDef::Event(ev) => &mut ev.attributes,
        }
    }
}

impl From<Event> for EventDef {
    fn from(ev: Event) -> Self {
        EventDef::Event(ev)
    }
}

impl From<EventDefaults> for EventDef {
    fn from(d: EventDefaults) -> Self {
        EventDef::Defaults(d)
    }
}

/// Root of a simulation definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Par {
    pub years: Option<Vec<f64>>,
    pub output: Option<Output>,
    pub control: Option<Control>,
    pub includes: Vec<String>,
    events: IndexMap<EventKey, EventDef>,
}

impl Par {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event or the event defaults; each key may be defined once.
    pub fn add_event(&mut self, def: impl Into<EventDef>) -> Result<(), ParError> {
        let def = def.into();
        let key = def.key();
        if self.events.contains_key(&key) {
            return Err(ParError::DuplicateEvent(key));
        }
        self.events.insert(key, def);
        Ok(())
    }

    /// Events in definition order
    pub fn events(&self) -> impl Iterator<Item = &EventDef> {
        self.events.values()
    }

    pub fn event(&self, id: i64) -> Option<&Event> {
        match self.events.get(&EventKey::Id(id)) {
            Some(EventDef::Event(ev)) => Some(ev),
            _ => None,
        }
    }

    pub fn defaults(&self) -> Option<&EventDefaults> {
        match self.events.get(&EventKey::Defaults) {
            Some(EventDef::Defaults(d)) => Some(d),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: EventKey) -> Option<&mut EventDef> {
        self.events.get_mut(&key)
    }

    pub fn contains(&self, key: EventKey) -> bool {
        self.events.contains_key(&key)
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Reference an event by id, resolved against the current table
    pub fn resolve(&self, id: i64) -> EventRef {
        if self.event(id).is_some() {
            EventRef::Resolved(id)
        } else {
            EventRef::Unresolved(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_duplicate_event() {
        let mut par = Par::new();
        par.add_event(Event::new(1, "thinning")).unwrap();
        let err = par.add_event(Event::new(1, "again")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateEvent);

        par.add_event(EventDefaults::default()).unwrap();
        assert!(matches!(
            par.add_event(EventDefaults::default()),
            Err(ParError::DuplicateEvent(EventKey::Defaults))
        ));
    }

    #[test]
    fn test_events_keep_definition_order() {
        let mut par = Par::new();
        par.add_event(Event::new(5, "b")).unwrap();
        par.add_event(EventDefaults::default()).unwrap();
        par.add_event(Event::new(2, "a")).unwrap();
        let keys: Vec<_> = par.events().map(EventDef::key).collect();
        assert_eq!(
            keys,
            vec![EventKey::Id(5), EventKey::Defaults, EventKey::Id(2)]
        );
    }

    #[test]
    fn test_resolve() {
        let mut par = Par::new();
        par.add_event(Event::new(3, "x")).unwrap();
        assert_eq!(par.resolve(3), EventRef::Resolved(3));
        assert_eq!(par.resolve(4), EventRef::Unresolved(4));
    }

    #[test]
    fn test_event_key_parse() {
        assert_eq!("default".parse::<EventKey>().unwrap(), EventKey::Defaults);
        assert_eq!("17".parse::<EventKey>().unwrap(), EventKey::Id(17));
        assert!("x1".parse::<EventKey>().is_err());
        assert_eq!(EventKey::Id(17).to_string(), "17");
    }

    #[test]
    fn test_routine_call_floats() {
        let call = RoutineCall::new(12.0, vec![3.0, 4.5]);
        assert_eq!(call.to_floats(), vec![12.0, 1.0, 3.0, 4.5]);
        assert_eq!(RoutineCall::from_floats(&call.to_floats()).unwrap(), call);
        assert_eq!(
            RoutineCall::from_floats(&[7.0]).unwrap(),
            RoutineCall::new(7.0, vec![])
        );
        assert!(RoutineCall::from_floats(&[]).is_err());
    }
}
