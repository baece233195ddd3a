//! Deferred linking of event cross-references.
//!
//! Events may reference events defined later in the same document, so ids
//! are collected while reading and resolved once the whole table is known.

use indexmap::IndexMap;

use super::model::{EventKey, Par};

/// Pending cross-reference ids, keyed by the referring event.
#[derive(Debug, Clone, Default)]
pub struct EventLinks {
    comparable: IndexMap<EventKey, Vec<i64>>,
    predecessors: IndexMap<EventKey, Vec<i64>>,
}

impl EventLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_comparable(&mut self, from: EventKey, ids: impl IntoIterator<Item = i64>) {
        self.comparable.entry(from).or_default().extend(ids);
    }

    pub fn add_predecessors(&mut self, from: EventKey, ids: impl IntoIterator<Item = i64>) {
        self.predecessors.entry(from).or_default().extend(ids);
    }

    /// Resolve every pending id against `par`.
    ///
    /// Ids without a matching event become unresolved references. Links from
    /// keys that are not in `par` are dropped.
    pub fn link(self, par: &mut Par) {
        for (from, ids) in self.comparable {
            let refs: Vec<_> = ids.into_iter().map(|id| par.resolve(id)).collect();
            if let Some(def) = par.get_mut(from) {
                def.attributes_mut().comparable_events = refs;
            }
        }
        for (from, ids) in self.predecessors {
            let refs: Vec<_> = ids.into_iter().map(|id| par.resolve(id)).collect();
            if let Some(def) = par.get_mut(from) {
                def.attributes_mut().feasible_predecessors = refs;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::par::model::{Event, EventRef};

    #[test]
    fn test_forward_and_dangling_references() {
        let mut par = Par::new();
        let mut links = EventLinks::new();

        par.add_event(Event::new(1, "first")).unwrap();
        links.add_comparable(EventKey::Id(1), [2, 99]);
        par.add_event(Event::new(2, "second")).unwrap();
        links.add_predecessors(EventKey::Id(2), [1]);
        links.link(&mut par);

        let first = par.event(1).unwrap();
        assert_eq!(
            first.attributes.comparable_events,
            vec![EventRef::Resolved(2), EventRef::Unresolved(99)]
        );
        let second = par.event(2).unwrap();
        assert_eq!(
            second.attributes.feasible_predecessors,
            vec![EventRef::Resolved(1)]
        );
    }

    #[test]
    fn test_links_accumulate() {
        let mut par = Par::new();
        par.add_event(Event::new(1, "a")).unwrap();
        let mut links = EventLinks::new();
        links.add_comparable(EventKey::Id(1), [3]);
        links.add_comparable(EventKey::Id(1), [4]);
        links.link(&mut par);
        let ids: Vec<_> = par
            .event(1)
            .unwrap()
            .attributes
            .comparable_events
            .iter()
            .map(|r| r.id())
            .collect();
        assert_eq!(ids, vec![3, 4]);
    }
}
