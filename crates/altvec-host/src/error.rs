use altvec_core::{ClassId, ValueId};
use thiserror::Error;

/// Result type local to altvec-host.
pub type Result<T> = std::result::Result<T, HostError>;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("class '{name}' already registered in namespace '{namespace}'")]
    DuplicateClass {
        name: &'static str,
        namespace: &'static str,
    },

    #[error("unknown class {0}")]
    UnknownClass(ClassId),

    #[error("value {0} has been collected")]
    Collected(ValueId),

    #[error("value {0} is not an alternative-representation object")]
    NotAltrep(ValueId),

    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    #[error(transparent)]
    Core(#[from] altvec_core::Error),
}
