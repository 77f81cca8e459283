//! Macros for ergonomic state machine construction.

/// Generate a state identity enum and its `StateId` implementation.
///
/// Each variant is mapped to the state type that implements it; the type
/// must implement `Default`. The owner type follows the enum name after a
/// colon and defaults to `()`.
///
/// # Example
///
/// ```
/// use nested_hsm::core::{State, StateId};
/// use nested_hsm::state_ids;
///
/// pub struct Robot {
///     battery: u8,
/// }
///
/// #[derive(Default)]
/// struct Charging;
/// impl State<RobotState> for Charging {}
///
/// #[derive(Default)]
/// struct Working;
/// impl State<RobotState> for Working {}
///
/// state_ids! {
///     pub enum RobotState: Robot {
///         Charging => Charging,
///         Working => Working,
///     }
/// }
///
/// assert_eq!(RobotState::Working.name(), "Working");
/// assert_eq!(RobotState::ALL.len(), 2);
/// ```
#[macro_export]
macro_rules! state_ids {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $state:ty
            ),* $(,)?
        }
    ) => {
        $crate::state_ids! {
            $(#[$meta])*
            $vis enum $name: () {
                $(
                    $(#[$variant_meta])*
                    $variant => $state
                ),*
            }
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $owner:ty {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $state:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];
        }

        impl $crate::core::StateId for $name {
            type Owner = $owner;

            fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }

            fn create(self) -> ::std::boxed::Box<dyn $crate::core::State<Self>> {
                match self {
                    $(
                        Self::$variant => ::std::boxed::Box::new(
                            <$state as ::std::default::Default>::default(),
                        )
                    ),*
                }
            }
        }
    };
}
