//! altvec-core: shared vocabulary for the altvec workspace.
//!
//! This crate holds only types and traits. The managed runtime lives in
//! `altvec-host`; the native-buffer class lives in `altvec-binding`. Keeping
//! the capability trait here lets both sides agree on the table without
//! depending on each other.

pub mod class;
pub mod config;
pub mod error;
pub mod id;
pub mod ownership;
pub mod prelude;
pub mod slot;

pub use class::{AltRealMethods, Inspection};
pub use config::{AltvecConfig, RuntimeConfig};
pub use error::{Error, Result};
pub use id::{ClassId, ValueId};
pub use ownership::Ownership;
pub use slot::Slot;
