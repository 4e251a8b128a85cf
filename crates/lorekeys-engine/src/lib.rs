//! Chain engine for lorekeys: injection tracking, chain runs, retry and
//! the session that ties them to a command gateway.

pub mod chain;
pub mod error;
pub mod event;
pub mod handle;
pub mod replay;
pub mod retry;
pub mod session;
pub mod status;
pub mod tracker;

/// Returns the crate name for identification.
pub fn crate_label() -> &'static str {
    "lorekeys-engine"
}
