//! JSON form of the simulation definition.
//!
//! ```json
//! {
//!   "events": { "default": { ... }, "10": { "name": "Thinning", "years": [5] } },
//!   "includes": ["common.par"],
//!   "years": [0, 5],
//!   "output": { ... },
//!   "control": { ... }
//! }
//! ```
//!
//! Event cross-references are plain ids and are linked again on the way in.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::condition::DnfCondition;
use super::links::EventLinks;
use super::model::{Event, EventAttributes, EventDef, EventDefaults, EventKey, Par, RoutineCall};
use super::records::{Control, Output};
use crate::error::ParError;

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct ParDocument {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    events: IndexMap<String, EventDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    includes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    years: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output: Option<Output>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    control: Option<Control>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct EventDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    years: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repeat_interval: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    branching: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    probability: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition: Option<DnfCondition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    min_intervals: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    comparable_events: Vec<i64>,
    // historical spelling of the file format
    #[serde(
        rename = "feasible_precedessors",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    feasible_predecessors: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    calls: Vec<RoutineCall>,
}

impl EventDocument {
    fn from_attributes(attrs: EventAttributes) -> Self {
        Self {
            years: attrs.years,
            repeat_interval: attrs.repeat_interval,
            branching: attrs.branching,
            probability: attrs.probability,
            condition: attrs.condition,
            min_intervals: attrs.min_intervals,
            comparable_events: attrs.comparable_events.iter().map(|r| r.id()).collect(),
            feasible_predecessors: attrs.feasible_predecessors.iter().map(|r| r.id()).collect(),
            ..Self::default()
        }
    }

    /// Attributes without cross-references; those go through [`EventLinks`].
    fn attributes(&mut self) -> EventAttributes {
        EventAttributes {
            years: std::mem::take(&mut self.years),
            repeat_interval: self.repeat_interval,
            branching: std::mem::take(&mut self.branching),
            probability: std::mem::take(&mut self.probability),
            condition: self.condition.take(),
            min_intervals: std::mem::take(&mut self.min_intervals),
            ..EventAttributes::default()
        }
    }
}

impl From<Par> for ParDocument {
    fn from(par: Par) -> Self {
        let events = par
            .events()
            .cloned()
            .map(|def| {
                let key = def.key().to_string();
                let doc = match def {
                    EventDef::Defaults(d) => EventDocument::from_attributes(d.attributes),
                    EventDef::Event(ev) => EventDocument {
                        name: Some(ev.name),
                        calls: ev.calls,
                        ..EventDocument::from_attributes(ev.attributes)
                    },
                };
                (key, doc)
            })
            .collect();

        ParDocument {
            events,
            includes: par.includes,
            years: par.years,
            output: par.output,
            control: par.control,
        }
    }
}

impl TryFrom<ParDocument> for Par {
    type Error = ParError;

    fn try_from(doc: ParDocument) -> Result<Self, Self::Error> {
        let mut par = Par::new();
        let mut links = EventLinks::new();

        for (key, mut ev) in doc.events {
            let key: EventKey = key.parse()?;
            let attributes = ev.attributes();

            let def = match key {
                EventKey::Defaults => {
                    if !ev.calls.is_empty() {
                        return Err(ParError::invalid(
                            "event defaults",
                            "routine calls are not allowed",
                        ));
                    }
                    EventDef::Defaults(EventDefaults { attributes })
                }
                EventKey::Id(id) => {
                    let name = ev.name.take().ok_or_else(|| {
                        ParError::invalid("event", format!("event {id} has no name"))
                    })?;
                    EventDef::Event(Event {
                        id,
                        name,
                        attributes,
                        calls: std::mem::take(&mut ev.calls),
                    })
                }
            };

            par.add_event(def)?;
            links.add_comparable(key, ev.comparable_events);
            links.add_predecessors(key, ev.feasible_predecessors);
        }
        links.link(&mut par);

        par.includes = doc.includes;
        par.years = doc.years;
        par.output = doc.output;
        par.control = doc.control;
        Ok(par)
    }
}

impl Serialize for Par {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ParDocument::from(self.clone()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Par {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let doc = ParDocument::deserialize(deserializer)?;
        Par::try_from(doc).map_err(serde::de::Error::custom)
    }
}

impl Par {
    pub fn to_json(&self) -> Result<serde_json::Value, ParError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, ParError> {
        let doc: ParDocument = serde_json::from_value(value)?;
        Par::try_from(doc)
    }
}
