//! The buffer handle stored in a host value's slot.
//!
//! A handle never allocates: it is given an address and a length at
//! construction and reads through to that memory on every access.

use std::ptr::NonNull;

use altvec_core::{Inspection, Ownership, Slot};

use crate::class::CLASS_NAME;
use crate::token::OwnershipToken;

pub struct BufferHandle {
    token: OwnershipToken,
    len: usize,
}

// SAFETY: the handle only reads through its pointer. The native side is
// responsible for single-writer discipline on the underlying buffer, and an
// owned buffer is freed only from the finalizer, which has `&mut` access.
unsafe impl Send for BufferHandle {}
unsafe impl Sync for BufferHandle {}

impl BufferHandle {
    pub fn new(token: OwnershipToken, len: usize) -> Self {
        debug_assert!(
            token.address().is_some() || len == 0,
            "null buffer address with non-zero length {len}"
        );
        Self { token, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn ownership(&self) -> Ownership {
        self.token.ownership()
    }

    pub fn is_released(&self) -> bool {
        self.token.is_released()
    }

    /// Start of the live storage.
    ///
    /// # Panics
    ///
    /// If the buffer has already been released by the finalizer.
    pub fn as_ptr(&self) -> NonNull<f64> {
        assert!(
            !self.token.is_released(),
            "{CLASS_NAME}: buffer accessed after finalization"
        );
        self.token.address().unwrap_or(NonNull::dangling())
    }

    /// Element at `i`, without bounds checking.
    ///
    /// # Safety
    ///
    /// `i < self.len()`.
    #[inline]
    pub unsafe fn get_unchecked(&self, i: usize) -> f64 {
        // SAFETY: the caller guarantees `i` is in bounds; the constructor's
        // caller guarantees `len` elements live at the address.
        unsafe { self.as_ptr().as_ptr().add(i).read() }
    }

    /// Copy `min(out.len(), len - start)` elements from `start` into `out`
    /// and return that count; 0 when `start >= len`.
    pub fn copy_region(&self, start: usize, out: &mut [f64]) -> usize {
        if start >= self.len {
            return 0;
        }
        let n = out.len().min(self.len - start);
        let src = self.as_ptr().as_ptr();
        // SAFETY: `start + n <= len` elements are valid at `src`; `out` is a
        // distinct, caller-owned buffer of at least `n` elements.
        unsafe { std::ptr::copy_nonoverlapping(src.add(start), out.as_mut_ptr(), n) };
        n
    }

    pub fn inspection(&self) -> Inspection {
        Inspection {
            class: CLASS_NAME.to_string(),
            length: self.len,
            address: self.as_ptr().as_ptr() as usize,
            ownership: self.ownership(),
        }
    }

    /// Release the buffer if owned. `true` only on the call that freed it.
    ///
    /// # Safety
    ///
    /// Same contract as [`OwnershipToken::release`].
    pub(crate) unsafe fn release(&mut self) -> bool {
        // SAFETY: forwarded to the caller.
        unsafe { self.token.release(self.len) }
    }
}

/// Resolve a slot back to its handle. O(1).
///
/// # Panics
///
/// If the slot is empty, holds something other than a [`BufferHandle`], or
/// the handle's buffer has been released. Each of these means a construction
/// bug or a use after finalization, never a recoverable condition.
pub fn resolve(data1: &Slot) -> &BufferHandle {
    let Some(handle) = data1.get::<BufferHandle>() else {
        panic!("{CLASS_NAME}: slot does not hold a buffer handle");
    };
    assert!(
        !handle.is_released(),
        "{CLASS_NAME}: handle resolved after finalization"
    );
    handle
}

pub(crate) fn resolve_mut(data1: &mut Slot) -> Option<&mut BufferHandle> {
    data1.get_mut::<BufferHandle>()
}
