//! nested-hsm: a hierarchical state machine engine
//!
//! Behavior is modelled as a stack of nested states rather than a flat enum.
//! The root state sits at depth 0; each state may have one active child at
//! the next depth. Every tick the machine lets each state, outer to inner,
//! request a transition, applies them one at a time until the stack settles,
//! and then runs each state's per-tick action.
//!
//! # Core Concepts
//!
//! - **StateId**: an enum naming every state variant, doubling as the factory
//! - **State**: behavior hooks (`on_enter`, `on_exit`, `get_transition`,
//!   `update`) with no-op defaults
//! - **Transition**: `Inner`, `InnerEntry` and `Sibling` requests
//! - **StateValue**: host-owned values that states override for exactly as
//!   long as they stay active
//!
//! # Example
//!
//! ```rust
//! use nested_hsm::core::{State, StateValue, Transition};
//! use nested_hsm::machine::{Context, Scope, StateMachine};
//! use nested_hsm::state_ids;
//! use std::rc::Rc;
//!
//! #[derive(Default)]
//! struct Guard {
//!     alert: StateValue<bool>,
//! }
//!
//! #[derive(Default)]
//! struct Root;
//! impl State<GuardState> for Root {
//!     fn get_transition(&self, _scope: &Scope<'_, GuardState>) -> Transition<GuardState> {
//!         Transition::inner_entry(GuardState::Alarmed)
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Alarmed;
//! impl State<GuardState> for Alarmed {
//!     fn on_enter(&mut self, ctx: &mut Context<'_, GuardState>) {
//!         let guard = ctx.get_owner();
//!         ctx.set_state_value(&guard.alert, true);
//!     }
//! }
//!
//! state_ids! {
//!     enum GuardState: Guard {
//!         Root => Root,
//!         Alarmed => Alarmed,
//!     }
//! }
//!
//! let guard = Rc::new(Guard::default());
//! let mut machine = StateMachine::new(GuardState::Root);
//! machine.init(GuardState::Root, &guard);
//!
//! machine.update(0.1);
//! assert!(guard.alert.value());
//!
//! machine.stop();
//! assert!(!guard.alert.value());
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod error;
pub mod machine;
pub mod trace;

// Re-export commonly used types
pub use builder::{BuildError, StateMachineBuilder};
pub use config::MachineConfig;
pub use core::{Args, State, StateId, StateValue, Transition, TransitionKind};
pub use error::HsmError;
pub use machine::{Context, Resolution, Scope, StateMachine};
pub use trace::{TraceLevel, Tracer};
