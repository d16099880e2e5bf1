//! altvec: expose natively allocated `f64` buffers to a garbage-collected
//! host as ordinary vectors, without copying them into the managed heap.
//!
//! This facade re-exports the workspace crates:
//! - [`types`]: ids, ownership modes, slots, the capability trait, config.
//! - [`host`]: the managed runtime (registry, collector, dispatch).
//! - [`binding`]: the `native_doubles` class and its constructors.

pub use altvec_binding as binding;
pub use altvec_core as types;
pub use altvec_host as host;

pub use altvec_binding::{init, wrap, wrap_slice, wrap_vec, wrap_with_deallocator};
pub use altvec_core::{AltvecConfig, Ownership};
pub use altvec_host::{Runtime, Value};
