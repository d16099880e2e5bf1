#![deny(unsafe_op_in_unsafe_fn)]
//! altvec-binding: expose a native, contiguous `f64` buffer as a host vector
//! without copying it into the managed heap.
//!
//! The pieces, leaves first:
//! - [`token`]: address + ownership mode, with a one-shot release.
//! - [`handle`]: the `BufferHandle` stored in a host value's slot, and its
//!   O(1) resolution from a slot.
//! - [`finalize`]: the collector callback that frees owned buffers once.
//! - [`class`]: the `native_doubles` capability table, registered once per process.
//! - [`wrap`]: construction entry points.
//!
//! Call [`init`] once before wrapping anything.

pub mod class;
pub mod demo;
pub mod error;
pub mod finalize;
pub mod handle;
pub mod token;
pub mod wrap;

pub use class::{class_id, init, NativeDoubles, CLASS_NAME, NAMESPACE};
pub use error::{Error, Result};
pub use finalize::finalize;
pub use handle::{resolve, BufferHandle};
pub use token::{dealloc_boxed_slice, Deallocator, OwnershipToken};
pub use wrap::{wrap, wrap_slice, wrap_vec, wrap_with_deallocator};
