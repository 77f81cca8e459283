//! Core building blocks of the hierarchical state machine.
//!
//! - State identities and their factory table via the `StateId` trait
//! - The `State` behavior trait with no-op default hooks
//! - Transition descriptors and entry arguments
//! - Host-owned `StateValue` bindings and the per-state override `Ledger`
//!
//! Nothing in this module touches the active-state stack; that lives in
//! [`crate::machine`].

mod id;
mod state;
mod transition;
mod value;

pub use id::StateId;
pub use state::{AsAny, State};
pub use transition::{Args, Transition, TransitionKind};
pub use value::{Ledger, StateValue};
