//! In-memory tracer for inspecting resolution after the fact.

use super::{Divergence, TraceEvent, TraceKind, Tracer};
use crate::core::StateId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// What was recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TraceEntry<I> {
    Event(TraceEvent<I>),
    Divergence(Divergence<I>),
}

/// A recorded entry and when it arrived.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TraceRecord<I> {
    pub at: DateTime<Utc>,
    pub entry: TraceEntry<I>,
}

/// Tracer that keeps everything it receives.
///
/// Clones share one buffer, so a test can hand one clone to the machine and
/// read the records through another.
///
/// # Example
///
/// ```rust
/// use nested_hsm::trace::Recorder;
/// # use nested_hsm::core::{State, StateId};
/// # #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// # enum Only { A }
/// # struct A;
/// # impl State<Only> for A {}
/// # impl StateId for Only {
/// #     type Owner = ();
/// #     fn name(&self) -> &'static str { "A" }
/// #     fn create(self) -> Box<dyn State<Self>> { Box::new(A) }
/// # }
///
/// let recorder: Recorder<Only> = Recorder::new();
/// let handle = recorder.clone();
/// assert!(handle.records().is_empty());
/// ```
pub struct Recorder<I> {
    records: Rc<RefCell<Vec<TraceRecord<I>>>>,
}

impl<I: StateId> Recorder<I> {
    pub fn new() -> Self {
        Self {
            records: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn records(&self) -> Vec<TraceRecord<I>> {
        self.records.borrow().clone()
    }

    pub fn events(&self) -> Vec<TraceEvent<I>> {
        self.records
            .borrow()
            .iter()
            .filter_map(|record| match &record.entry {
                TraceEntry::Event(event) => Some(event.clone()),
                TraceEntry::Divergence(_) => None,
            })
            .collect()
    }

    /// Events of one kind, as `(depth, target)` pairs.
    pub fn events_of(&self, kind: TraceKind) -> Vec<(usize, I)> {
        self.events()
            .into_iter()
            .filter(|event| event.kind == kind)
            .map(|event| (event.depth, event.target))
            .collect()
    }

    pub fn divergences(&self) -> Vec<Divergence<I>> {
        self.records
            .borrow()
            .iter()
            .filter_map(|record| match &record.entry {
                TraceEntry::Divergence(divergence) => Some(divergence.clone()),
                TraceEntry::Event(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }

    fn push(&self, entry: TraceEntry<I>) {
        self.records.borrow_mut().push(TraceRecord {
            at: Utc::now(),
            entry,
        });
    }
}

impl<I: StateId> Default for Recorder<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> Clone for Recorder<I> {
    fn clone(&self) -> Self {
        Self {
            records: Rc::clone(&self.records),
        }
    }
}

impl<I: StateId> Tracer<I> for Recorder<I> {
    fn event(&mut self, event: &TraceEvent<I>) {
        self.push(TraceEntry::Event(event.clone()));
    }

    fn divergence(&mut self, divergence: &Divergence<I>) {
        self.push(TraceEntry::Divergence(divergence.clone()));
    }
}
