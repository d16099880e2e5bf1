//! RAII protection roots.
//!
//! A value held by a [`RootGuard`] survives every collection. Dropping the
//! guard removes the root (panic-safe), after which the next collection may
//! sweep the value.

use crate::object::Value;
use crate::runtime::Runtime;

pub struct RootGuard<'rt> {
    rt: &'rt Runtime,
    value: Value,
}

impl<'rt> RootGuard<'rt> {
    pub(crate) fn new(rt: &'rt Runtime, value: Value) -> Self {
        Self { rt, value }
    }

    pub fn value(&self) -> Value {
        self.value
    }
}

impl Drop for RootGuard<'_> {
    fn drop(&mut self) {
        // NOTE: do not log here to keep drop path fast.
        self.rt.unroot(self.value);
    }
}
