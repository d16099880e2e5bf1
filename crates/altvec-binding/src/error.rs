use altvec_host::HostError;
use thiserror::Error;

/// Result type local to altvec-binding.
pub type Result<T> = std::result::Result<T, Error>;

/// Recoverable failures only. Contract violations (unchecked index, use
/// after finalization, wrapping before `init`) panic instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("host runtime: {0}")]
    Host(#[from] HostError),
}
