//! Change-detecting value cells.
//!
//! A [`Property`] stores one value and tells the writer whether a write
//! changed it. Owners pair it with a [`Signal`](crate::Signal) and emit only
//! on a real change, which is what stops two-way bindings from echoing a
//! value back and forth forever.
//!
//! ```
//! use lattice_traits_core::{Property, Signal};
//!
//! struct Field {
//!     value: Property<String>,
//!     value_changed: Signal<String>,
//! }
//!
//! impl Field {
//!     fn set_value(&self, value: &str) {
//!         if self.value.set(value.to_string()) {
//!             self.value_changed.emit(value.to_string());
//!         }
//!     }
//! }
//!
//! let field = Field { value: Property::new(String::new()), value_changed: Signal::new() };
//! field.set_value("10px");
//! assert_eq!(field.value.get(), "10px");
//! ```

use std::fmt;

use parking_lot::RwLock;

/// A value cell with change detection.
///
/// The inner lock is held for a single read or write only, so a notification
/// fired after [`set`](Self::set) may read or write the property again.
pub struct Property<T> {
    cell: RwLock<T>,
}

impl<T: Clone> Property<T> {
    pub fn new(value: T) -> Self {
        Self {
            cell: RwLock::new(value),
        }
    }

    /// A clone of the stored value.
    pub fn get(&self) -> T {
        self.cell.read().clone()
    }

    /// Borrow the stored value for the duration of `f`.
    ///
    /// `f` must not write to this property.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.cell.read();
        f(&guard)
    }

    /// Overwrite the value unconditionally. Nothing reports this write.
    pub fn set_silent(&self, value: T) {
        *self.cell.write() = value;
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Store `value`. Returns `false`, leaving the cell untouched, when it
    /// equals the current value.
    pub fn set(&self, value: T) -> bool {
        self.replace(value).is_some()
    }

    /// Store `value` and hand back the previous one, or `None` when nothing
    /// changed.
    pub fn replace(&self, value: T) -> Option<T> {
        let mut cell = self.cell.write();
        (*cell != value).then(|| std::mem::replace(&mut *cell, value))
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&*self.cell.read()).finish()
    }
}
