//! lorekeys-gateway: adapter between injection intents and the host's
//! command interpreter.
//!
//! Provides the `CommandInterpreter` trait with a `MockInterpreter` for
//! tests, the `CommandGateway` that builds directives and reports their
//! outcome, and the `NoticeSink` trait for user-facing notices.

pub mod directive;
pub mod error;
pub mod gateway;
pub mod interpreter;
pub mod mock;
pub mod notice;

/// Stable crate label.
pub fn crate_label() -> &'static str {
    "lorekeys-gateway"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_label_is_stable() {
        assert_eq!(crate_label(), "lorekeys-gateway");
    }
}
