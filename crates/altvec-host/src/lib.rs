//! altvec-host: a small managed runtime that native classes plug into.
//!
//! The runtime owns every host value. Values are tagged either as managed
//! real vectors or as objects of a registered alternative-representation
//! class, whose operations are dispatched through the class's
//! [`AltRealMethods`](altvec_core::AltRealMethods) table.
//!
//! Lifetime is decided by the collector: anything not reachable from a root
//! is swept by [`Runtime::collect`], and its finalizers run exactly once
//! before the object is dropped.

pub mod error;
pub mod object;
pub mod protect;
pub mod reduce;
pub mod registry;
pub mod runtime;
pub mod tracking;

pub use error::{HostError, Result};
pub use object::{AltrepObject, Object, Value};
pub use protect::RootGuard;
pub use registry::{class_info, register_altreal_class, ClassInfo};
pub use runtime::{GcReport, Runtime};
pub use tracking::{GcSnapshot, GcStats};
