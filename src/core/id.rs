//! State identities and the static factory table.
//!
//! Every state variant a machine can push is named by one value of an
//! identity type. The identity type doubles as the factory: `create` maps a
//! variant to a freshly constructed behavior object, so no runtime type
//! registry is needed.

use super::state::State;
use std::fmt::Debug;

/// Identity of a state variant.
///
/// One identity value corresponds to exactly one behavior implementation.
/// Identities are compared to decide whether "the same kind of state" is
/// already active, and their names appear in diagnostics.
///
/// Implement this by hand or generate it with [`state_ids!`](crate::state_ids).
///
/// # Example
///
/// ```rust
/// use nested_hsm::core::{State, StateId};
///
/// #[derive(Default)]
/// struct Idle;
/// impl State<Door> for Idle {}
///
/// #[derive(Default)]
/// struct Open;
/// impl State<Door> for Open {}
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Door {
///     Idle,
///     Open,
/// }
///
/// impl StateId for Door {
///     type Owner = ();
///
///     fn name(&self) -> &'static str {
///         match self {
///             Self::Idle => "Idle",
///             Self::Open => "Open",
///         }
///     }
///
///     fn create(self) -> Box<dyn State<Self>> {
///         match self {
///             Self::Idle => Box::new(Idle),
///             Self::Open => Box::new(Open),
///         }
///     }
/// }
///
/// assert_eq!(Door::Open.name(), "Open");
/// ```
pub trait StateId: Copy + Eq + Debug + 'static {
    /// Host entity the states of this machine act on.
    ///
    /// The machine only ever holds a weak reference to it.
    type Owner: 'static;

    /// Variant name for display and tracing.
    fn name(&self) -> &'static str;

    /// Construct a new behavior object for this variant.
    fn create(self) -> Box<dyn State<Self>>;
}
