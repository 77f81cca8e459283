//! Transition resolution.
//!
//! A pass walks the stack from the root, asking each state for its
//! transition, and applies the first one that changes the stack. Applying a
//! transition ends the pass; the next pass starts again at the root so that
//! outer states always see the new shape first. Passes repeat until one walks
//! the whole stack without changing anything.

use super::{with_context, Node, Scope, StateMachine};
use crate::core::{Args, Ledger, StateId, Transition, TransitionKind};
use crate::error::HsmError;
use crate::trace::{Divergence, TraceKind, TraceLevel};

/// Outcome of settling the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// A pass completed without changing the stack.
    Settled { passes: usize },
    /// The pass bound was reached while the stack was still changing.
    Diverged { passes: usize },
}

impl Resolution {
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Settled { .. })
    }

    pub fn passes(&self) -> usize {
        match self {
            Self::Settled { passes } | Self::Diverged { passes } => *passes,
        }
    }
}

/// A transition that would change the stack if resolution ran now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pending<I> {
    /// Depth of the state requesting the transition
    pub depth: usize,
    pub kind: TransitionKind,
    pub target: I,
}

impl<I: StateId> StateMachine<I> {
    /// First transition that would change the stack, without applying it.
    ///
    /// `None` means the stack is settled. A stopped machine reports the
    /// initial state it would push.
    pub fn pending_transition(&self) -> Option<Pending<I>> {
        if self.stack.is_empty() {
            return Some(Pending {
                depth: 0,
                kind: TransitionKind::Inner,
                target: self.initial,
            });
        }

        let owner = self.owner.upgrade();
        for depth in 0..self.stack.len() {
            let transition = self.evaluate(depth, owner.as_deref());
            let kind = transition.kind();
            let Some(target) = transition.target() else {
                continue;
            };
            if self.changes_stack(depth, kind, target) {
                return Some(Pending {
                    depth,
                    kind,
                    target,
                });
            }
        }
        None
    }

    pub(super) fn resolve_with(&mut self, owner: Option<&I::Owner>) -> Resolution {
        let max_passes = self.config.max_passes.max(1);

        for pass in 1..=max_passes {
            let remaining = max_passes - pass + 1;
            if remaining <= self.config.escalation_window
                && self.trace_level < TraceLevel::Diagnostic
            {
                tracing::warn!(
                    machine = %self.id,
                    pass,
                    "state machine still transitioning, raising trace level"
                );
                self.trace_level = TraceLevel::Diagnostic;
            }

            if self.resolve_once(owner) {
                return Resolution::Settled { passes: pass };
            }
        }

        let divergence = Divergence {
            machine: self.id,
            passes: max_passes,
            stack: self.active_states(),
        };
        self.tracer.divergence(&divergence);
        Resolution::Diverged { passes: max_passes }
    }

    /// Run one pass. Returns `true` when nothing changed.
    fn resolve_once(&mut self, owner: Option<&I::Owner>) -> bool {
        if self.stack.is_empty() {
            let initial = self.initial;
            self.emit(TraceKind::Inner, 0, initial);
            self.push_state(initial, None, 0, owner);
        }

        for depth in 0..self.stack.len() {
            match self.evaluate(depth, owner) {
                Transition::None => {}

                Transition::Inner { target, args } => {
                    if !self.changes_stack(depth, TransitionKind::Inner, target) {
                        continue;
                    }
                    self.emit(TraceKind::Inner, depth + 1, target);
                    self.pop_states_from(depth + 1, owner);
                    self.push_state(target, args, depth + 1, owner);
                    return false;
                }

                Transition::InnerEntry { target, args } => {
                    if !self.changes_stack(depth, TransitionKind::InnerEntry, target) {
                        continue;
                    }
                    self.emit(TraceKind::InnerEntry, depth + 1, target);
                    self.push_state(target, args, depth + 1, owner);
                    return false;
                }

                Transition::Sibling { target, args } => {
                    self.emit(TraceKind::Sibling, depth, target);
                    self.pop_states_from(depth, owner);
                    self.push_state(target, args, depth, owner);
                    return false;
                }
            }
        }

        true
    }

    fn evaluate(&self, depth: usize, owner: Option<&I::Owner>) -> Transition<I> {
        let node = &self.stack[depth];
        debug_assert_eq!(node.depth, depth);
        let scope = Scope::new(
            node.id,
            node.depth,
            &self.stack[..depth],
            &self.stack[depth + 1..],
            owner,
        )
        .with_self(node.state.as_ref());
        node.state.get_transition(&scope)
    }

    /// Whether a transition of `kind` to `target` requested at `depth` would
    /// mutate the stack.
    fn changes_stack(&self, depth: usize, kind: TransitionKind, target: I) -> bool {
        let child = self.stack.get(depth + 1);
        match kind {
            TransitionKind::None => false,
            TransitionKind::Inner => child.is_none_or(|node| node.id != target),
            TransitionKind::InnerEntry => child.is_none(),
            TransitionKind::Sibling => true,
        }
    }

    pub(super) fn push_state(
        &mut self,
        id: I,
        args: Option<Args>,
        depth: usize,
        owner: Option<&I::Owner>,
    ) {
        debug_assert_eq!(depth, self.stack.len());
        self.emit(TraceKind::Push, depth, id);

        let state = id.create();
        match (args.is_some(), state.expects_args()) {
            (false, true) => HsmError::ArgsExpected { state: id.name() }.fault(),
            (true, false) => HsmError::ArgsUnexpected { state: id.name() }.fault(),
            _ => {}
        }

        self.stack.push(Node {
            id,
            depth,
            state,
            ledger: Ledger::new(),
        });
        with_context(&mut self.stack, depth, owner, |state, ctx| match args {
            Some(args) => state.on_enter_with(ctx, args),
            None => state.on_enter(ctx),
        });
    }

    /// Pop every state at `start` and deeper, innermost first.
    pub(super) fn pop_states_from(&mut self, start: usize, owner: Option<&I::Owner>) {
        while self.stack.len() > start {
            let depth = self.stack.len() - 1;
            let id = self.stack[depth].id;
            self.emit(TraceKind::Pop, depth, id);

            with_context(&mut self.stack, depth, owner, |state, ctx| state.on_exit(ctx));
            if let Some(mut node) = self.stack.pop() {
                node.ledger.revert_all();
            }
        }
    }
}
