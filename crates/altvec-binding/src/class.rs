//! The `native_doubles` class: capability table and one-time registration.

use std::ptr::NonNull;

use once_cell::sync::OnceCell;

use altvec_core::{AltRealMethods, ClassId, Inspection, Slot};
use altvec_host::{register_altreal_class, Runtime, Value};

use crate::error::Result;
use crate::handle::resolve;

pub const CLASS_NAME: &str = "native_doubles";
pub const NAMESPACE: &str = "altvec";

/// Capability table. Every entry resolves the slot to its handle first and
/// then reads the native buffer directly.
pub struct NativeDoubles;

impl AltRealMethods for NativeDoubles {
    fn length(&self, data1: &Slot) -> usize {
        resolve(data1).len()
    }

    fn inspect(&self, data1: &Slot) -> Inspection {
        resolve(data1).inspection()
    }

    // The storage is always contiguous, so this never returns `None`.
    fn dataptr_or_null(&self, data1: &Slot) -> Option<NonNull<f64>> {
        Some(resolve(data1).as_ptr())
    }

    unsafe fn elt(&self, data1: &Slot, i: usize) -> f64 {
        // SAFETY: the dispatch layer guarantees `i < length`.
        unsafe { resolve(data1).get_unchecked(i) }
    }

    fn get_region(&self, data1: &Slot, start: usize, out: &mut [f64]) -> usize {
        resolve(data1).copy_region(start, out)
    }
}

static METHODS: NativeDoubles = NativeDoubles;
static CLASS: OnceCell<ClassId> = OnceCell::new();

/// Register the class with the host. Runs the registration once per
/// process; later calls return the same id.
pub fn init() -> Result<ClassId> {
    let id = CLASS.get_or_try_init(|| register_altreal_class(CLASS_NAME, NAMESPACE, &METHODS))?;
    Ok(*id)
}

/// The registered class id.
///
/// # Panics
///
/// If [`init`] has not completed.
pub fn class_id() -> ClassId {
    match CLASS.get() {
        Some(id) => *id,
        None => panic!("{CLASS_NAME}: class used before init()"),
    }
}

/// Whether `value` is tagged with this class.
pub fn is_native_doubles(rt: &Runtime, value: Value) -> Result<bool> {
    Ok(rt.class_of(value)?.is_some_and(|c| Some(c) == CLASS.get().copied()))
}
