//! Transition descriptors returned by states during resolution.

use super::id::StateId;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

/// Shape of a transition, without its target or arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionKind {
    /// Stay as is.
    None,
    /// Make `target` the child of the requesting state, unless it already is.
    Inner,
    /// Push `target` as child only if the requesting state has no child.
    InnerEntry,
    /// Replace the requesting state (and everything under it) with `target`.
    Sibling,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::Inner => "Inner",
            Self::InnerEntry => "InnerEntry",
            Self::Sibling => "Sibling",
        };
        f.write_str(name)
    }
}

/// Arguments handed to the target state's `on_enter_with`.
///
/// Values are type-erased; the entered state reads them back by position
/// with [`Args::get`] or [`Args::take`].
///
/// # Example
///
/// ```rust
/// use nested_hsm::args;
///
/// let args = args!["Yo!", 2_i32];
/// assert_eq!(args.len(), 2);
/// assert_eq!(args.get::<&str>(0), Some(&"Yo!"));
/// assert_eq!(args.get::<i32>(1), Some(&2));
/// assert_eq!(args.get::<i32>(0), None);
/// ```
#[derive(Default)]
pub struct Args {
    values: Vec<Box<dyn Any>>,
}

impl Args {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append a value, builder style.
    pub fn with<T: Any>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    pub fn push<T: Any>(&mut self, value: T) {
        self.values.push(Box::new(value));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the value at `index` if it exists and has type `T`.
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.values.get(index)?.downcast_ref::<T>()
    }

    /// Move the value at `index` out, leaving `()` in its slot.
    ///
    /// Returns `None` (and leaves the slot untouched) when the index is out
    /// of range or the value is not a `T`.
    pub fn take<T: Any>(&mut self, index: usize) -> Option<T> {
        let slot = self.values.get_mut(index)?;
        if !slot.is::<T>() {
            return None;
        }
        let value = std::mem::replace(slot, Box::new(()));
        value.downcast::<T>().ok().map(|boxed| *boxed)
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args").field("len", &self.len()).finish()
    }
}

/// Build an [`Args`] list from a sequence of values.
#[macro_export]
macro_rules! args {
    () => {
        $crate::core::Args::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::core::Args::new()$(.with($value))+
    };
}

/// Transition requested by a state for the current resolution pass.
///
/// Produced fresh on every evaluation and consumed when applied.
pub enum Transition<I: StateId> {
    None,
    Inner { target: I, args: Option<Args> },
    InnerEntry { target: I, args: Option<Args> },
    Sibling { target: I, args: Option<Args> },
}

impl<I: StateId> Transition<I> {
    pub fn none() -> Self {
        Self::None
    }

    pub fn inner(target: I) -> Self {
        Self::Inner { target, args: None }
    }

    pub fn inner_with(target: I, args: Args) -> Self {
        Self::Inner {
            target,
            args: Some(args),
        }
    }

    pub fn inner_entry(target: I) -> Self {
        Self::InnerEntry { target, args: None }
    }

    pub fn inner_entry_with(target: I, args: Args) -> Self {
        Self::InnerEntry {
            target,
            args: Some(args),
        }
    }

    pub fn sibling(target: I) -> Self {
        Self::Sibling { target, args: None }
    }

    pub fn sibling_with(target: I, args: Args) -> Self {
        Self::Sibling {
            target,
            args: Some(args),
        }
    }

    pub fn kind(&self) -> TransitionKind {
        match self {
            Self::None => TransitionKind::None,
            Self::Inner { .. } => TransitionKind::Inner,
            Self::InnerEntry { .. } => TransitionKind::InnerEntry,
            Self::Sibling { .. } => TransitionKind::Sibling,
        }
    }

    pub fn target(&self) -> Option<I> {
        match self {
            Self::None => None,
            Self::Inner { target, .. }
            | Self::InnerEntry { target, .. }
            | Self::Sibling { target, .. } => Some(*target),
        }
    }
}

impl<I: StateId> Default for Transition<I> {
    fn default() -> Self {
        Self::None
    }
}

impl<I: StateId> fmt::Debug for Transition<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Inner { target, args }
            | Self::InnerEntry { target, args }
            | Self::Sibling { target, args } => f
                .debug_struct(&self.kind().to_string())
                .field("target", target)
                .field("args", args)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::State;

    struct Blank;
    impl State<Slot> for Blank {}

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum Slot {
        A,
        B,
    }

    impl StateId for Slot {
        type Owner = ();

        fn name(&self) -> &'static str {
            match self {
                Self::A => "A",
                Self::B => "B",
            }
        }

        fn create(self) -> Box<dyn State<Self>> {
            Box::new(Blank)
        }
    }

    #[test]
    fn constructors_set_kind_and_target() {
        let none: Transition<Slot> = Transition::none();
        assert_eq!(none.kind(), TransitionKind::None);
        assert_eq!(none.target(), None);

        assert_eq!(Transition::inner(Slot::A).kind(), TransitionKind::Inner);
        assert_eq!(
            Transition::inner_entry(Slot::B).kind(),
            TransitionKind::InnerEntry
        );
        assert_eq!(Transition::sibling(Slot::B).target(), Some(Slot::B));
    }

    #[test]
    fn with_variants_carry_args() {
        match Transition::sibling_with(Slot::A, args!["hello", 2_i32]) {
            Transition::Sibling {
                target,
                args: Some(args),
            } => {
                assert_eq!(target, Slot::A);
                assert_eq!(args.len(), 2);
            }
            other => panic!("unexpected transition {other:?}"),
        }

        match Transition::inner(Slot::A) {
            Transition::Inner { args, .. } => assert!(args.is_none()),
            other => panic!("unexpected transition {other:?}"),
        }
    }

    #[test]
    fn args_take_moves_value_once() {
        let mut args = args![String::from("owned"), 7_u8];

        assert_eq!(args.take::<u8>(0), None);
        assert_eq!(args.take::<String>(0), Some(String::from("owned")));
        assert_eq!(args.take::<String>(0), None);
        assert_eq!(args.get::<u8>(1), Some(&7));
        assert_eq!(args.take::<u8>(5), None);
    }

    #[test]
    fn empty_args_macro() {
        let args = args![];
        assert!(args.is_empty());
    }

    #[test]
    fn kind_display_matches_variant() {
        assert_eq!(TransitionKind::InnerEntry.to_string(), "InnerEntry");
        assert_eq!(TransitionKind::Sibling.to_string(), "Sibling");
    }

    #[test]
    fn kind_serializes_by_name() {
        let json = serde_json::to_string(&TransitionKind::Inner).unwrap();
        assert_eq!(json, "\"Inner\"");
        let back: TransitionKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TransitionKind::Inner);
    }
}
