//! Convenient re-exports for downstream crates.

pub use crate::class::{AltRealMethods, Inspection};
pub use crate::config::{AltvecConfig, RuntimeConfig};
pub use crate::error::{Error, Result};
pub use crate::id::{ClassId, ValueId};
pub use crate::ownership::Ownership;
pub use crate::slot::Slot;
