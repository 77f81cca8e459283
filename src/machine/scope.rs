//! Views of the stack handed to states while their hooks run.
//!
//! A state never sees the machine itself. It gets a [`Scope`] (read-only,
//! for `get_transition`) or a [`Context`] (a scope plus the state's own
//! override ledger, for the mutating hooks). Both are positioned at the
//! calling state's depth, so "outer" and "inner" are relative to it.

use super::Node;
use crate::core::{Ledger, State, StateId, StateValue};
use crate::error::{HsmError, Lookup};
use std::ops::Deref;

/// Read-only view of the stack around one state.
pub struct Scope<'a, I: StateId> {
    id: I,
    depth: usize,
    outer: &'a [Node<I>],
    inner: &'a [Node<I>],
    owner: Option<&'a I::Owner>,
    /// The calling state itself, when it is only borrowed shared.
    this: Option<&'a dyn State<I>>,
}

impl<'a, I: StateId> Scope<'a, I> {
    pub(crate) fn new(
        id: I,
        depth: usize,
        outer: &'a [Node<I>],
        inner: &'a [Node<I>],
        owner: Option<&'a I::Owner>,
    ) -> Self {
        Self {
            id,
            depth,
            outer,
            inner,
            owner,
            this: None,
        }
    }

    /// Let lookups by identity resolve to the calling state too.
    pub(crate) fn with_self(mut self, state: &'a dyn State<I>) -> Self {
        self.this = Some(state);
        self
    }

    /// Identity of the state this scope belongs to.
    pub fn id(&self) -> I {
        self.id
    }

    /// Stack depth of the state this scope belongs to (0 = root).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The host entity, if it is still alive.
    pub fn owner(&self) -> Option<&'a I::Owner> {
        self.owner
    }

    /// The host entity.
    ///
    /// Panics if the owner was never set or has been dropped.
    pub fn get_owner(&self) -> &'a I::Owner {
        match self.owner {
            Some(owner) => owner,
            None => panic!("{}", HsmError::OwnerGone),
        }
    }

    /// Nearest state with identity `id` above this one, searching toward the
    /// root.
    pub fn find_outer_state(&self, id: I) -> Option<&'a dyn State<I>> {
        self.outer
            .iter()
            .rev()
            .find(|node| node.id == id)
            .map(|node| node.state.as_ref())
    }

    pub fn get_outer_state(&self, id: I) -> &'a dyn State<I> {
        self.find_outer_state(id)
            .unwrap_or_else(|| self.not_found(id, Lookup::Outer { from_depth: self.depth }))
    }

    /// Nearest state with identity `id` below this one, searching toward the
    /// leaf.
    pub fn find_inner_state(&self, id: I) -> Option<&'a dyn State<I>> {
        self.inner
            .iter()
            .find(|node| node.id == id)
            .map(|node| node.state.as_ref())
    }

    pub fn get_inner_state(&self, id: I) -> &'a dyn State<I> {
        self.find_inner_state(id)
            .unwrap_or_else(|| self.not_found(id, Lookup::Inner { from_depth: self.depth }))
    }

    /// First state with identity `id` on the stack, root first.
    ///
    /// The calling state is found only from `get_transition`; inside the
    /// mutating hooks it is borrowed exclusively and lookups skip it.
    pub fn find_state(&self, id: I) -> Option<&'a dyn State<I>> {
        let find = |nodes: &'a [Node<I>]| -> Option<&'a dyn State<I>> {
            nodes
                .iter()
                .find(|node| node.id == id)
                .map(|node| node.state.as_ref())
        };
        find(self.outer)
            .or_else(|| self.this.filter(|_| self.id == id))
            .or_else(|| find(self.inner))
    }

    pub fn get_state(&self, id: I) -> &'a dyn State<I> {
        self.find_state(id)
            .unwrap_or_else(|| self.not_found(id, Lookup::Anywhere))
    }

    /// Whether a state with identity `id` is active, the caller included.
    pub fn is_in_state(&self, id: I) -> bool {
        self.id == id || self.find_state(id).is_some()
    }

    /// The state directly below this one.
    pub fn find_immediate_inner_state(&self) -> Option<&'a dyn State<I>> {
        self.inner.first().map(|node| node.state.as_ref())
    }

    /// Identity of the state directly below this one.
    pub fn immediate_inner_id(&self) -> Option<I> {
        self.inner.first().map(|node| node.id)
    }

    fn not_found(&self, id: I, lookup: Lookup) -> ! {
        panic!(
            "{}",
            HsmError::StateNotFound {
                state: id.name(),
                lookup,
            }
        )
    }
}

/// A [`Scope`] plus the calling state's override ledger.
///
/// Handed to `on_enter`, `on_enter_with`, `on_exit` and `update`.
pub struct Context<'a, I: StateId> {
    scope: Scope<'a, I>,
    ledger: &'a mut Ledger,
}

impl<'a, I: StateId> Context<'a, I> {
    pub(crate) fn new(scope: Scope<'a, I>, ledger: &'a mut Ledger) -> Self {
        Self { scope, ledger }
    }

    /// Override `binding` for as long as the calling state stays active.
    ///
    /// The value the binding held before this state's first override is
    /// restored when the state exits.
    pub fn set_state_value<T: 'static>(&mut self, binding: &StateValue<T>, value: T) {
        self.ledger.set(binding, value);
    }

    /// Overrides currently held by the calling state.
    pub fn override_count(&self) -> usize {
        self.ledger.len()
    }
}

impl<'a, I: StateId> Deref for Context<'a, I> {
    type Target = Scope<'a, I>;

    fn deref(&self) -> &Self::Target {
        &self.scope
    }
}
