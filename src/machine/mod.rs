//! The active-state stack and the per-tick facade around it.
//!
//! A [`StateMachine`] owns an ordered stack of live states, root first. Each
//! call to [`StateMachine::update`] first resolves transitions until the
//! stack stops changing, then runs every active state's per-tick action from
//! the root down, so outer states can set values their inner states read in
//! the same tick.
//!
//! # Example
//!
//! ```rust
//! use nested_hsm::core::{State, StateId, Transition};
//! use nested_hsm::machine::{Scope, StateMachine};
//!
//! #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
//! enum Agent {
//!     Root,
//!     Patrol,
//! }
//!
//! #[derive(Default)]
//! struct Root;
//! impl State<Agent> for Root {
//!     fn get_transition(&self, _scope: &Scope<'_, Agent>) -> Transition<Agent> {
//!         Transition::inner(Agent::Patrol)
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Patrol;
//! impl State<Agent> for Patrol {}
//!
//! impl StateId for Agent {
//!     type Owner = ();
//!     fn name(&self) -> &'static str {
//!         match self {
//!             Self::Root => "Root",
//!             Self::Patrol => "Patrol",
//!         }
//!     }
//!     fn create(self) -> Box<dyn State<Self>> {
//!         match self {
//!             Self::Root => Box::new(Root),
//!             Self::Patrol => Box::new(Patrol),
//!         }
//!     }
//! }
//!
//! let mut machine = StateMachine::new(Agent::Root);
//! assert!(!machine.is_started());
//!
//! machine.update(0.016);
//! assert_eq!(machine.active_states(), vec![Agent::Root, Agent::Patrol]);
//! assert_eq!(machine.stack_string(), "Root / Patrol");
//!
//! machine.stop();
//! assert!(!machine.is_started());
//! ```

mod resolve;
mod scope;

pub use resolve::{Pending, Resolution};
pub use scope::{Context, Scope};

use crate::config::MachineConfig;
use crate::core::{Ledger, State, StateId};
use crate::error::{HsmError, Lookup};
use crate::trace::{LogTracer, TraceEvent, TraceKind, TraceLevel, Tracer};
use std::fmt;
use std::ops::ControlFlow;
use std::rc::{Rc, Weak};
use uuid::Uuid;

/// One live state on the stack.
pub(crate) struct Node<I: StateId> {
    pub(crate) id: I,
    pub(crate) depth: usize,
    pub(crate) state: Box<dyn State<I>>,
    pub(crate) ledger: Ledger,
}

/// Hierarchical state machine driven by [`update`](Self::update).
pub struct StateMachine<I: StateId> {
    id: Uuid,
    stack: Vec<Node<I>>,
    initial: I,
    owner: Weak<I::Owner>,
    /// Whether an owner was ever attached; a dead `Weak` and an unset one
    /// both fail to upgrade.
    has_owner: bool,
    config: MachineConfig,
    trace_level: TraceLevel,
    tracer: Box<dyn Tracer<I>>,
}

impl<I: StateId> StateMachine<I> {
    /// Machine that starts in `initial`, with default configuration and no
    /// owner.
    pub fn new(initial: I) -> Self {
        Self::from_parts(initial, Weak::new(), MachineConfig::default(), None)
    }

    pub(crate) fn from_parts(
        initial: I,
        owner: Weak<I::Owner>,
        config: MachineConfig,
        tracer: Option<Box<dyn Tracer<I>>>,
    ) -> Self {
        let id = Uuid::new_v4();
        let tracer: Box<dyn Tracer<I>> = match tracer {
            Some(tracer) => tracer,
            None => {
                let label = config.name.clone().unwrap_or_else(|| id.to_string());
                Box::new(LogTracer::new(label))
            }
        };
        Self {
            id,
            stack: Vec::new(),
            initial,
            trace_level: config.trace_level,
            has_owner: owner.strong_count() > 0,
            owner,
            config,
            tracer,
        }
    }

    /// Set the initial state and the host entity.
    ///
    /// No state is created until the next [`update`](Self::update). The
    /// machine keeps only a weak reference to `owner`.
    pub fn init(&mut self, initial: I, owner: &Rc<I::Owner>) {
        self.initial = initial;
        self.owner = Rc::downgrade(owner);
        self.has_owner = true;
    }

    /// Advance one tick: settle the stack, then run per-tick actions outer to
    /// inner.
    pub fn update(&mut self, dt: f32) -> Resolution {
        let owner = self.owner.upgrade();
        let resolution = self.resolve_with(owner.as_deref());
        self.perform_actions_with(owner.as_deref(), dt);
        resolution
    }

    /// Settle the stack without running per-tick actions.
    pub fn resolve(&mut self) -> Resolution {
        let owner = self.owner.upgrade();
        self.resolve_with(owner.as_deref())
    }

    /// Run every active state's per-tick action, root first.
    pub fn perform_state_actions(&mut self, dt: f32) {
        let owner = self.owner.upgrade();
        self.perform_actions_with(owner.as_deref(), dt);
    }

    /// Pop every state, innermost first, running exit hooks and reverting
    /// overrides. The next `update` starts again from the initial state.
    pub fn stop(&mut self) {
        if self.stack.is_empty() {
            return;
        }
        let owner = self.owner.upgrade();
        self.pop_states_from(0, owner.as_deref());
        tracing::debug!(machine = %self.id, "state machine stopped");
    }

    pub fn shutdown(&mut self) {
        self.stop();
    }

    /// Whether an owner was attached and has since been dropped.
    pub fn is_orphaned(&self) -> bool {
        self.has_owner && self.owner.strong_count() == 0
    }

    /// Pop every state without running exit hooks, still reverting
    /// overrides. Used once the owner is gone, when hooks could no longer
    /// reach it.
    fn release(&mut self) {
        while let Some(mut node) = self.stack.pop() {
            self.emit(TraceKind::Pop, node.depth, node.id);
            node.ledger.revert_all();
        }
        tracing::debug!(machine = %self.id, "state machine released without exit hooks");
    }

    pub fn is_started(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn initial_state(&self) -> I {
        self.initial
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn trace_level(&self) -> TraceLevel {
        self.trace_level
    }

    pub fn set_trace_level(&mut self, level: TraceLevel) {
        self.trace_level = level;
    }

    pub fn set_tracer(&mut self, tracer: impl Tracer<I> + 'static) {
        self.tracer = Box::new(tracer);
    }

    /// Number of active states.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Identities of the active states, root first.
    pub fn active_states(&self) -> Vec<I> {
        self.stack.iter().map(|node| node.id).collect()
    }

    /// Active state names joined with `" / "`, root first.
    pub fn stack_string(&self) -> String {
        self.stack
            .iter()
            .map(|node| node.id.name())
            .collect::<Vec<_>>()
            .join(" / ")
    }

    pub fn find_state(&self, id: I) -> Option<&dyn State<I>> {
        self.stack
            .iter()
            .find(|node| node.id == id)
            .map(|node| node.state.as_ref())
    }

    pub fn get_state(&self, id: I) -> &dyn State<I> {
        match self.find_state(id) {
            Some(state) => state,
            None => not_found(id, Lookup::Anywhere),
        }
    }

    pub fn is_in_state(&self, id: I) -> bool {
        self.stack.iter().any(|node| node.id == id)
    }

    pub fn has_state_at_depth(&self, depth: usize) -> bool {
        depth < self.stack.len()
    }

    pub fn find_state_at_depth(&self, depth: usize) -> Option<&dyn State<I>> {
        self.stack.get(depth).map(|node| node.state.as_ref())
    }

    pub fn state_id_at_depth(&self, depth: usize) -> Option<I> {
        self.stack.get(depth).map(|node| node.id)
    }

    /// Nearest state with identity `id` strictly above `from_depth`.
    pub fn find_outer_state(&self, id: I, from_depth: usize) -> Option<&dyn State<I>> {
        let end = from_depth.min(self.stack.len());
        self.stack[..end]
            .iter()
            .rev()
            .find(|node| node.id == id)
            .map(|node| node.state.as_ref())
    }

    pub fn get_outer_state(&self, id: I, from_depth: usize) -> &dyn State<I> {
        match self.find_outer_state(id, from_depth) {
            Some(state) => state,
            None => not_found(id, Lookup::Outer { from_depth }),
        }
    }

    /// Nearest state with identity `id` strictly below `from_depth`.
    pub fn find_inner_state(&self, id: I, from_depth: usize) -> Option<&dyn State<I>> {
        self.stack
            .get(from_depth + 1..)
            .unwrap_or(&[])
            .iter()
            .find(|node| node.id == id)
            .map(|node| node.state.as_ref())
    }

    pub fn get_inner_state(&self, id: I, from_depth: usize) -> &dyn State<I> {
        match self.find_inner_state(id, from_depth) {
            Some(state) => state,
            None => not_found(id, Lookup::Inner { from_depth }),
        }
    }

    /// Visit active states root first until the visitor breaks.
    pub fn visit_outer_to_inner<F>(&self, mut visitor: F)
    where
        F: FnMut(I, &dyn State<I>) -> ControlFlow<()>,
    {
        for node in &self.stack {
            if visitor(node.id, node.state.as_ref()).is_break() {
                return;
            }
        }
    }

    /// Visit active states leaf first until the visitor breaks.
    pub fn visit_inner_to_outer<F>(&self, mut visitor: F)
    where
        F: FnMut(I, &dyn State<I>) -> ControlFlow<()>,
    {
        for node in self.stack.iter().rev() {
            if visitor(node.id, node.state.as_ref()).is_break() {
                return;
            }
        }
    }

    pub fn visit_outer_to_inner_mut<F>(&mut self, mut visitor: F)
    where
        F: FnMut(I, &mut (dyn State<I> + 'static)) -> ControlFlow<()>,
    {
        for node in &mut self.stack {
            if visitor(node.id, &mut *node.state).is_break() {
                return;
            }
        }
    }

    pub fn visit_inner_to_outer_mut<F>(&mut self, mut visitor: F)
    where
        F: FnMut(I, &mut (dyn State<I> + 'static)) -> ControlFlow<()>,
    {
        for node in self.stack.iter_mut().rev() {
            if visitor(node.id, &mut *node.state).is_break() {
                return;
            }
        }
    }

    fn perform_actions_with(&mut self, owner: Option<&I::Owner>, dt: f32) {
        for depth in 0..self.stack.len() {
            with_context(&mut self.stack, depth, owner, |state, ctx| {
                state.update(ctx, dt)
            });
        }
    }

    fn emit(&mut self, kind: TraceKind, depth: usize, target: I) {
        let tier = kind.tier();
        if tier > self.trace_level {
            return;
        }
        self.tracer.event(&TraceEvent {
            machine: self.id,
            tier,
            depth,
            kind,
            target,
        });
    }
}

impl<I: StateId> Drop for StateMachine<I> {
    fn drop(&mut self) {
        // Exit hooks may panic; never run them while already unwinding.
        if std::thread::panicking() {
            return;
        }
        if self.is_orphaned() {
            self.release();
        } else {
            self.shutdown();
        }
    }
}

impl<I: StateId> fmt::Debug for StateMachine<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("id", &self.id)
            .field("initial", &self.initial)
            .field("stack", &self.active_states())
            .field("trace_level", &self.trace_level)
            .finish()
    }
}

/// Run `hook` on the state at `depth` with a context positioned there.
fn with_context<I, R>(
    stack: &mut [Node<I>],
    depth: usize,
    owner: Option<&I::Owner>,
    hook: impl FnOnce(&mut (dyn State<I> + 'static), &mut Context<'_, I>) -> R,
) -> Option<R>
where
    I: StateId,
{
    if depth >= stack.len() {
        return None;
    }
    let (outer, rest) = stack.split_at_mut(depth);
    let (node, inner) = rest.split_first_mut()?;
    let Node {
        id, state, ledger, ..
    } = node;
    let scope = Scope::new(*id, depth, outer, inner, owner);
    let mut ctx = Context::new(scope, ledger);
    Some(hook(&mut **state, &mut ctx))
}

fn not_found<I: StateId>(id: I, lookup: Lookup) -> ! {
    panic!(
        "{}",
        HsmError::StateNotFound {
            state: id.name(),
            lookup,
        }
    )
}

#[cfg(test)]
mod tests;
