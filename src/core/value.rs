//! Host-owned values that states override for the span of their lifetime.
//!
//! A [`StateValue`] belongs to the host entity and outlives the machine.
//! States never write it directly: they go through
//! [`Context::set_state_value`](crate::machine::Context::set_state_value),
//! which records the pre-override value in the state's [`Ledger`]. When the
//! state exits, its ledger is replayed and every binding it touched goes back
//! to the value it had before that state first overrode it.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// A value owned by the host and temporarily overridden by active states.
///
/// # Example
///
/// ```rust
/// use nested_hsm::core::StateValue;
///
/// let speed = StateValue::new(1.5_f32);
/// assert_eq!(speed.value(), 1.5);
/// ```
pub struct StateValue<T> {
    cell: Rc<RefCell<T>>,
}

impl<T> StateValue<T> {
    pub fn new(initial: T) -> Self {
        Self {
            cell: Rc::new(RefCell::new(initial)),
        }
    }

    /// Borrow the current value.
    ///
    /// Panics if called from inside a revert of this same binding, which the
    /// engine never does.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.cell.borrow()
    }

    pub(crate) fn replace(&self, value: T) -> T {
        self.cell.replace(value)
    }

    fn downgrade(&self) -> Weak<RefCell<T>> {
        Rc::downgrade(&self.cell)
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.cell) as *const ()
    }
}

impl<T: Clone> StateValue<T> {
    /// Current value.
    pub fn value(&self) -> T {
        self.cell.borrow().clone()
    }
}

impl<T: Default> Default for StateValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for StateValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateValue").field(&*self.cell.borrow()).finish()
    }
}

/// One captured pre-override value.
trait Override {
    /// Address of the binding this record restores.
    fn addr(&self) -> *const ();

    /// Write the captured value back. A binding the host already dropped is
    /// left alone.
    fn revert(self: Box<Self>);
}

struct Captured<T> {
    binding: Weak<RefCell<T>>,
    original: T,
}

impl<T: 'static> Override for Captured<T> {
    fn addr(&self) -> *const () {
        // The weak reference keeps the allocation alive, so the address
        // cannot be reused by another binding while this record exists.
        Weak::as_ptr(&self.binding) as *const ()
    }

    fn revert(self: Box<Self>) {
        if let Some(cell) = self.binding.upgrade() {
            cell.replace(self.original);
        }
    }
}

/// Overrides made by one state instance, in the order they were first made.
#[derive(Default)]
pub struct Ledger {
    records: Vec<Box<dyn Override>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Write `value` into `binding`, capturing the binding's current value the
    /// first time this ledger touches it.
    pub fn set<T: 'static>(&mut self, binding: &StateValue<T>, value: T) {
        let previous = binding.replace(value);
        if !self.is_tracking(binding) {
            self.records.push(Box::new(Captured {
                binding: binding.downgrade(),
                original: previous,
            }));
        }
    }

    pub fn is_tracking<T>(&self, binding: &StateValue<T>) -> bool {
        let addr = binding.addr();
        self.records.iter().any(|record| record.addr() == addr)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Restore every captured value in override order and empty the ledger.
    pub fn revert_all(&mut self) {
        for record in self.records.drain(..) {
            record.revert();
        }
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("records", &self.records.len())
            .finish()
    }
}
