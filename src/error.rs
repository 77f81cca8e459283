//! Engine errors.
//!
//! None of these are returned from the per-tick surface. Configuration
//! mistakes and failed `get_*` lookups are programmer errors and surface as
//! panics carrying these messages; they exist as a type so tests and logs
//! can name them.

use thiserror::Error;

/// Which part of the stack a lookup searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Anywhere,
    Outer { from_depth: usize },
    Inner { from_depth: usize },
}

impl std::fmt::Display for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anywhere => f.write_str("on stack"),
            Self::Outer { from_depth } => write!(f, "outer to depth {from_depth}"),
            Self::Inner { from_depth } => write!(f, "inner to depth {from_depth}"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HsmError {
    #[error("State {state} expects args, but none were passed in via Transition")]
    ArgsExpected { state: &'static str },

    #[error("State {state} does not expect args, but some were passed in via Transition")]
    ArgsUnexpected { state: &'static str },

    #[error("Failed to get state {state} {lookup}")]
    StateNotFound {
        state: &'static str,
        lookup: Lookup,
    },

    #[error("Owner of the state machine is gone")]
    OwnerGone,
}

impl HsmError {
    /// Report a configuration mistake.
    ///
    /// Debug builds stop right here; release builds log and carry on.
    pub(crate) fn fault(self) {
        if cfg!(debug_assertions) {
            panic!("{self}");
        }
        tracing::error!(error = %self, "state machine configuration error");
    }
}
