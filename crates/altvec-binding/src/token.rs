//! Ownership token: a buffer address paired with who must free it.

use std::ptr::NonNull;

use altvec_core::Ownership;

/// Frees a buffer of `len` elements at `ptr`.
///
/// Must match the allocator the buffer came from; establishing that pairing
/// is the constructor caller's job.
pub type Deallocator = unsafe fn(ptr: NonNull<f64>, len: usize);

/// Deallocator for buffers produced by `Box::<[f64]>::into_raw`
/// (for example via `Vec::into_boxed_slice`).
///
/// # Safety
///
/// `ptr` and `len` must come from exactly one `Box<[f64]>` that has not
/// been freed yet.
pub unsafe fn dealloc_boxed_slice(ptr: NonNull<f64>, len: usize) {
    let slice = std::ptr::slice_from_raw_parts_mut(ptr.as_ptr(), len);
    // SAFETY: guaranteed by the caller.
    drop(unsafe { Box::from_raw(slice) });
}

#[derive(Clone, Copy)]
enum Release {
    Borrowed,
    Owned(Deallocator),
}

pub struct OwnershipToken {
    /// `None` only for a null address, which is legal for empty buffers.
    address: Option<NonNull<f64>>,
    release: Release,
    released: bool,
}

impl OwnershipToken {
    pub fn borrowed(address: *mut f64) -> Self {
        Self {
            address: NonNull::new(address),
            release: Release::Borrowed,
            released: false,
        }
    }

    pub fn owned(address: *mut f64, dealloc: Deallocator) -> Self {
        Self {
            address: NonNull::new(address),
            release: Release::Owned(dealloc),
            released: false,
        }
    }

    pub fn ownership(&self) -> Ownership {
        match self.release {
            Release::Borrowed => Ownership::Borrowed,
            Release::Owned(_) => Ownership::Owned,
        }
    }

    /// Address handed over at construction. Still reported after release.
    pub fn address(&self) -> Option<NonNull<f64>> {
        self.address
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Free the buffer if this token owns it and has not freed it yet.
    ///
    /// Returns `true` only on the call that actually released the buffer.
    /// Borrowed tokens never deallocate and always return `false`.
    ///
    /// # Safety
    ///
    /// `len` must be the element count the buffer was allocated with, and
    /// the deallocator given at construction must match its allocator.
    pub unsafe fn release(&mut self, len: usize) -> bool {
        let Release::Owned(dealloc) = self.release else {
            return false;
        };
        if self.released {
            return false;
        }
        self.released = true;
        if let Some(ptr) = self.address {
            // SAFETY: the caller guarantees the allocator pairing and length;
            // the `released` flag above makes this the only call.
            unsafe { dealloc(ptr, len) };
        }
        true
    }
}
