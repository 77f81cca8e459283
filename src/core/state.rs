//! The behavior contract every state implements.
//!
//! A state is a live object pushed onto the machine's stack. The engine
//! calls its hooks as the stack changes and once per tick while it stays
//! active. Every hook has a no-op default, so a state only overrides what it
//! needs.

use super::id::StateId;
use super::transition::{Args, Transition};
use crate::machine::{Context, Scope};
use std::any::Any;

/// Access to a value as `dyn Any`, implemented for every `'static` type.
///
/// Lets `dyn State<I>` be downcast to the concrete state type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behavior of one state variant.
///
/// # Example
///
/// ```rust
/// use nested_hsm::core::{State, StateId, Transition};
/// use nested_hsm::machine::{Context, Scope};
///
/// #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Light {
///     Off,
///     On,
/// }
///
/// #[derive(Default)]
/// struct Off {
///     ticks: u32,
/// }
///
/// impl State<Light> for Off {
///     fn get_transition(&self, _scope: &Scope<'_, Light>) -> Transition<Light> {
///         if self.ticks >= 3 {
///             Transition::sibling(Light::On)
///         } else {
///             Transition::none()
///         }
///     }
///
///     fn update(&mut self, _ctx: &mut Context<'_, Light>, _dt: f32) {
///         self.ticks += 1;
///     }
/// }
///
/// #[derive(Default)]
/// struct On;
/// impl State<Light> for On {}
///
/// impl StateId for Light {
///     type Owner = ();
///     fn name(&self) -> &'static str {
///         match self {
///             Self::Off => "Off",
///             Self::On => "On",
///         }
///     }
///     fn create(self) -> Box<dyn State<Self>> {
///         match self {
///             Self::Off => Box::new(Off::default()),
///             Self::On => Box::new(On),
///         }
///     }
/// }
/// ```
pub trait State<I: StateId>: AsAny {
    /// Called on push when the triggering transition carried no arguments.
    fn on_enter(&mut self, _ctx: &mut Context<'_, I>) {}

    /// Called on push when the triggering transition carried arguments.
    fn on_enter_with(&mut self, _ctx: &mut Context<'_, I>, _args: Args) {}

    /// Whether this state is entered through [`State::on_enter_with`].
    ///
    /// Pushing a state with arguments it does not expect (or without the
    /// arguments it does) is a configuration error.
    fn expects_args(&self) -> bool {
        false
    }

    /// Called once before the state is dropped, including during `stop`.
    ///
    /// Overrides made through the context are reverted right after this
    /// returns.
    fn on_exit(&mut self, _ctx: &mut Context<'_, I>) {}

    /// Transition this state requests given the current stack.
    ///
    /// Must be a pure read: it may run several times per tick.
    fn get_transition(&self, _scope: &Scope<'_, I>) -> Transition<I> {
        Transition::None
    }

    /// Per-tick action, run outer to inner after the stack settles.
    fn update(&mut self, _ctx: &mut Context<'_, I>, _dt: f32) {}
}

impl<'s, I: StateId> dyn State<I> + 's {
    pub fn downcast_ref<T: State<I>>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: State<I>>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    pub fn is<T: State<I>>(&self) -> bool {
        self.as_any().is::<T>()
    }
}
