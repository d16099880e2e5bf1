//! Construction: wrap a native buffer into a host value.
//!
//! Construction is O(1) and never copies the buffer. For owned buffers the
//! finalizer is attached in the same heap step that inserts the value, so no
//! collection, on any thread, can observe a value whose release hook is
//! missing.

use altvec_core::{Ownership, Slot};
use altvec_host::{Runtime, Value};

use crate::class::class_id;
use crate::error::Result;
use crate::finalize::finalize;
use crate::handle::BufferHandle;
use crate::token::{dealloc_boxed_slice, Deallocator, OwnershipToken};

/// Wrap `length` contiguous doubles at `address` as a `native_doubles` value.
///
/// With [`Ownership::Owned`] the buffer must come from
/// `Box::<[f64]>::into_raw` and is freed once, after the value becomes
/// unreachable. With [`Ownership::Borrowed`] the binding never frees it.
///
/// # Safety
///
/// - `address` points to at least `length` initialized `f64`s. A null
///   address is only allowed with `length == 0`; this is not checked in
///   release builds.
/// - Borrowed: the buffer outlives every use of the returned value.
/// - Owned: nothing else frees or takes ownership of the buffer.
///
/// # Panics
///
/// If [`init`](crate::init) has not been called.
pub unsafe fn wrap(
    rt: &Runtime,
    address: *mut f64,
    length: usize,
    ownership: Ownership,
) -> Result<Value> {
    let token = match ownership {
        Ownership::Borrowed => OwnershipToken::borrowed(address),
        Ownership::Owned => OwnershipToken::owned(address, dealloc_boxed_slice),
    };
    construct(rt, token, length)
}

/// Wrap an owned buffer that must be freed with `dealloc`.
///
/// # Safety
///
/// As for [`wrap`] with [`Ownership::Owned`], and `dealloc` must be the
/// matching deallocator for the buffer's allocator.
pub unsafe fn wrap_with_deallocator(
    rt: &Runtime,
    address: *mut f64,
    length: usize,
    dealloc: Deallocator,
) -> Result<Value> {
    construct(rt, OwnershipToken::owned(address, dealloc), length)
}

/// Hand a vector over to the host. The value owns it from here on.
pub fn wrap_vec(rt: &Runtime, data: Vec<f64>) -> Result<Value> {
    let length = data.len();
    let address = Box::into_raw(data.into_boxed_slice()) as *mut f64;
    // SAFETY: the buffer is a fresh `Box<[f64]>` of `length` elements whose
    // ownership moves into the value.
    unsafe { wrap(rt, address, length, Ownership::Owned) }
}

/// Expose a native slice without transferring ownership.
///
/// # Safety
///
/// `data` must outlive every use of the returned value, and must not be
/// written through a `&mut` while the value is read.
pub unsafe fn wrap_slice(rt: &Runtime, data: &[f64]) -> Result<Value> {
    // SAFETY: forwarded to the caller. Borrowed values are read-only.
    unsafe { wrap(rt, data.as_ptr() as *mut f64, data.len(), Ownership::Borrowed) }
}

fn construct(rt: &Runtime, token: OwnershipToken, length: usize) -> Result<Value> {
    let class = class_id();
    let owned = token.ownership().is_owned();
    let handle = BufferHandle::new(token, length);

    let slot = Slot::new(handle);
    let value = if owned {
        rt.new_altrep_with_finalizer(class, slot, true, |obj| {
            finalize(obj);
        })?
    } else {
        rt.new_altrep(class, slot)?
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(%value, length, owned, "wrapped native buffer");

    Ok(value)
}
