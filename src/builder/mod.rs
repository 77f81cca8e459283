//! Builder API for ergonomic state machine construction.
//!
//! This module provides a fluent builder for configuring a machine and the
//! `state_ids!` macro for declaring state identities with minimal
//! boilerplate.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::StateMachineBuilder;
