//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::config::MachineConfig;
use crate::core::StateId;
use crate::machine::StateMachine;
use crate::trace::{TraceLevel, Tracer};
use std::rc::{Rc, Weak};
use stillwater::validation::Validation;

/// Builder for constructing state machines with a fluent API.
///
/// # Example
///
/// ```rust
/// use nested_hsm::builder::StateMachineBuilder;
/// use nested_hsm::state_ids;
/// use nested_hsm::trace::TraceLevel;
/// # use nested_hsm::core::State;
/// # #[derive(Default)] struct Idle;
/// # impl State<Bot> for Idle {}
///
/// state_ids! {
///     enum Bot {
///         Idle => Idle,
///     }
/// }
///
/// let machine = StateMachineBuilder::new()
///     .initial(Bot::Idle)
///     .name("bot-7")
///     .trace_level(TraceLevel::Basic)
///     .build()
///     .unwrap();
///
/// assert_eq!(machine.initial_state(), Bot::Idle);
/// assert_eq!(machine.trace_level(), TraceLevel::Basic);
/// ```
pub struct StateMachineBuilder<I: StateId> {
    initial: Option<I>,
    owner: Weak<I::Owner>,
    config: MachineConfig,
    tracer: Option<Box<dyn Tracer<I>>>,
}

impl<I: StateId> StateMachineBuilder<I> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            initial: None,
            owner: Weak::new(),
            config: MachineConfig::default(),
            tracer: None,
        }
    }

    /// Set the initial state (required).
    pub fn initial(mut self, state: I) -> Self {
        self.initial = Some(state);
        self
    }

    /// Set the host entity. Only a weak reference is kept.
    pub fn owner(mut self, owner: &Rc<I::Owner>) -> Self {
        self.owner = Rc::downgrade(owner);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Label used in trace output.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    pub fn trace_level(mut self, level: TraceLevel) -> Self {
        self.config.trace_level = level;
        self
    }

    pub fn max_passes(mut self, passes: usize) -> Self {
        self.config.max_passes = passes;
        self
    }

    pub fn escalation_window(mut self, passes: usize) -> Self {
        self.config.escalation_window = passes;
        self
    }

    /// Send diagnostics somewhere other than `tracing`.
    pub fn tracer(mut self, tracer: impl Tracer<I> + 'static) -> Self {
        self.tracer = Some(Box::new(tracer));
        self
    }

    /// Build the state machine.
    /// Returns an error if the initial state is missing or the configuration
    /// is invalid.
    pub fn build(self) -> Result<StateMachine<I>, BuildError> {
        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;

        if let Validation::Failure(errors) = self.config.validate() {
            return Err(BuildError::InvalidConfig(errors.iter().cloned().collect()));
        }

        Ok(StateMachine::from_parts(
            initial,
            self.owner,
            self.config,
            self.tracer,
        ))
    }
}

impl<I: StateId> Default for StateMachineBuilder<I> {
    fn default() -> Self {
        Self::new()
    }
}
