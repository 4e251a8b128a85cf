//! Engine error types.
//!
//! None of these are fatal to the session: each is also surfaced as a
//! notice where the user needs to see it, and the session stays usable.

use lorekeys_core::error::{RegistryError, StoreError};
use lorekeys_gateway::error::GatewayError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no chain at index {0}")]
    UnknownChain(usize),
    #[error("chain {name:?} has no steps")]
    EmptyChain { name: String },
    #[error("no chain is running")]
    NotRunning,
    #[error("chain {index} is not the running chain")]
    NotRunningChain { index: usize },
    #[error("chain {index} is not paused")]
    NotPaused { index: usize },
    #[error("step {target} outside 0..={len}")]
    StepOutOfRange { target: i64, len: usize },
    #[error("snippet {label:?} not found")]
    SnippetNotFound { label: String },
    #[error("nothing to retry")]
    NothingToRetry,
    #[error("retry aborted: {0}")]
    RetryAborted(GatewayError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
