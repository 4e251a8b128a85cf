//! Command interpreter trait: the host side of the gateway.
//!
//! Implementations forward rendered directives to the host's slash-command
//! parser, or record them for testing.

use async_trait::async_trait;

use crate::directive::Directive;
use crate::error::GatewayError;

/// The host's command interpreter.
///
/// `execute` suspends until the host has finished running the directive.
/// Callers never issue two directives concurrently.
#[async_trait]
pub trait CommandInterpreter: Send + Sync {
    async fn execute(&self, directive: &Directive) -> Result<(), GatewayError>;
}
