//! lorekeys-core: snippet/chain domain model, registry, settings storage
//! and configuration shared by the gateway and engine crates.

pub mod config;
pub mod error;
pub mod model;
pub mod registry;
pub mod store;

/// Crate identity label.
pub fn crate_label() -> &'static str {
    "lorekeys-core"
}
