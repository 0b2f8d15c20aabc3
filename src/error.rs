use thiserror::Error;

use crate::pool::PoolError;

pub type Result<T, E = TreeError> = std::result::Result<T, E>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TreeError {
    /// Rejected at construction time. Nothing was allocated.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The node pool could not hand out a block. The tree was not modified.
    #[error("node allocation failed: {0}")]
    AllocationFailed(#[from] PoolError),

    /// Only produced by [`TreeGuard::verify`](crate::TreeGuard::verify).
    #[error("tree invariant violated: {0}")]
    Corrupted(String),

    #[error("failed to initialize logging: {0}")]
    Logging(String),
}
