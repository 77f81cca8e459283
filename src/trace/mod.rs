//! Diagnostic events emitted while the stack is being resolved.
//!
//! The machine forwards events to a [`Tracer`]; which events get through is
//! decided by the machine's [`TraceLevel`]. Structural decisions (`Inner`,
//! `InnerEntry`, `Sibling`) are `Basic`, individual pushes and pops are
//! `Diagnostic`. Divergence is always reported.

mod log;
mod recorder;

pub use self::log::LogTracer;
pub use recorder::{Recorder, TraceEntry, TraceRecord};

use crate::core::{StateId, TransitionKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// How much the machine reports while resolving.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
    #[default]
    None,
    Basic,
    Diagnostic,
}

/// What happened to the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraceKind {
    Push,
    Pop,
    Inner,
    InnerEntry,
    Sibling,
}

impl TraceKind {
    /// Tier at which this kind of event is reported.
    pub fn tier(self) -> TraceLevel {
        match self {
            Self::Push | Self::Pop => TraceLevel::Diagnostic,
            Self::Inner | Self::InnerEntry | Self::Sibling => TraceLevel::Basic,
        }
    }

    /// Event kind for an applied transition. `None` never mutates the stack.
    pub fn from_transition(kind: TransitionKind) -> Option<Self> {
        match kind {
            TransitionKind::None => None,
            TransitionKind::Inner => Some(Self::Inner),
            TransitionKind::InnerEntry => Some(Self::InnerEntry),
            TransitionKind::Sibling => Some(Self::Sibling),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Push => "(Push)",
            Self::Pop => "(Pop)",
            Self::Inner => "Inner",
            Self::InnerEntry => "InnerEntry",
            Self::Sibling => "Sibling",
        }
    }
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// A single stack event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent<I> {
    /// Machine that emitted the event
    pub machine: Uuid,
    pub tier: TraceLevel,
    /// Stack depth the event applies to
    pub depth: usize,
    pub kind: TraceKind,
    pub target: I,
}

/// Resolution failed to settle within the pass bound.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Divergence<I> {
    pub machine: Uuid,
    /// Passes run before giving up
    pub passes: usize,
    /// Stack, root first, at the moment resolution gave up
    pub stack: Vec<I>,
}

/// Receiver of resolution diagnostics.
pub trait Tracer<I: StateId> {
    fn event(&mut self, event: &TraceEvent<I>);

    fn divergence(&mut self, divergence: &Divergence<I>);
}

/// Tracer that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTracer;

impl<I: StateId> Tracer<I> for NullTracer {
    fn event(&mut self, _event: &TraceEvent<I>) {}

    fn divergence(&mut self, _divergence: &Divergence<I>) {}
}
