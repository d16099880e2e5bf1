//! Capability table for alternative-representation real vectors.
//!
//! A class implements [`AltRealMethods`] once and registers a `'static`
//! reference with the host. The host then dispatches every generic vector
//! operation on a value of that class through the table, handing the method
//! the value's internal [`Slot`].
//!
//! The concrete host lives in `altvec-host`. We keep only the trait here so
//! any crate can implement a class without pulling in the runtime.

use std::fmt;
use std::ptr::NonNull;

use serde::{Deserialize, Serialize};

use crate::ownership::Ownership;
use crate::slot::Slot;

/// Diagnostic summary produced by `inspect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inspection {
    pub class: String,
    pub length: usize,
    /// Address of the first element. An empty buffer built from a null
    /// address reports the dangling sentinel `NonNull::dangling()`.
    pub address: usize,
    pub ownership: Ownership,
}

impl fmt::Display for Inspection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (len={}, ptr={:#x}, {})",
            self.class, self.length, self.address, self.ownership
        )
    }
}

/// Operations the host invokes on values tagged with a registered class.
///
/// Every entry must be present before the class is usable, which the trait
/// enforces by having no default methods.
pub trait AltRealMethods: Send + Sync + 'static {
    /// Element count. O(1).
    fn length(&self, data1: &Slot) -> usize;

    /// Read-only diagnostic summary.
    fn inspect(&self, data1: &Slot) -> Inspection;

    /// Live address of contiguous storage, without copying. `None` when the
    /// class cannot expose a stable contiguous view.
    fn dataptr_or_null(&self, data1: &Slot) -> Option<NonNull<f64>>;

    /// Element at `i`, unchecked.
    ///
    /// # Safety
    ///
    /// The caller must guarantee `i < self.length(data1)`.
    unsafe fn elt(&self, data1: &Slot, i: usize) -> f64;

    /// Copy up to `out.len()` elements starting at `start` into `out`.
    ///
    /// Returns how many elements were actually written:
    /// `min(out.len(), length - start)`, or 0 when `start >= length`.
    /// Callers must only trust the first `returned` elements of `out`.
    fn get_region(&self, data1: &Slot, start: usize, out: &mut [f64]) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inspection_display() {
        let i = Inspection {
            class: "native_doubles".into(),
            length: 5,
            address: 0x1000,
            ownership: Ownership::Owned,
        };
        assert_eq!(i.to_string(), "native_doubles (len=5, ptr=0x1000, owned)");
    }
}
