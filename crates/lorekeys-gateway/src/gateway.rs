//! Command gateway: turns injection intents into directives and reports
//! the outcome.
//!
//! Failures never propagate as panics past this boundary. Every call
//! returns its `Result` so a caller can decide whether to continue, and
//! every failure except a flush is also surfaced as an error notice.

use std::sync::Arc;

use crate::directive::{Directive, InjectDirective};
use crate::error::GatewayError;
use crate::interpreter::CommandInterpreter;
use crate::notice::{Notice, NoticeSink};

#[derive(Clone)]
pub struct CommandGateway {
    interpreter: Arc<dyn CommandInterpreter>,
    notices: Arc<dyn NoticeSink>,
}

impl CommandGateway {
    pub fn new(interpreter: Arc<dyn CommandInterpreter>, notices: Arc<dyn NoticeSink>) -> Self {
        Self {
            interpreter,
            notices,
        }
    }

    pub fn notify(&self, notice: Notice) {
        self.notices.notify(notice);
    }

    pub async fn inject(&self, inject: InjectDirective) -> Result<(), GatewayError> {
        self.submit(Directive::Inject(inject), true).await
    }

    /// Clear one slot by injecting empty content under its id.
    pub async fn remove(&self, id: &str) -> Result<(), GatewayError> {
        self.submit(Directive::Remove { id: id.to_string() }, true)
            .await
    }

    /// Flush host-side ephemeral injections. Failures are logged but never
    /// shown to the user: they happen routinely while a chain advances.
    pub async fn flush_ephemeral(&self) -> Result<(), GatewayError> {
        self.submit(Directive::FlushEphemeral, false).await
    }

    pub async fn delete_last_message(&self) -> Result<(), GatewayError> {
        self.submit(Directive::DeleteLastMessage { count: 1 }, true)
            .await
    }

    pub async fn trigger_generation(&self) -> Result<(), GatewayError> {
        self.submit(Directive::TriggerGeneration, true).await
    }

    async fn submit(&self, directive: Directive, surface: bool) -> Result<(), GatewayError> {
        tracing::debug!(kind = %directive.kind(), directive = %directive, "submitting directive");
        match self.interpreter.execute(&directive).await {
            Ok(()) => Ok(()),
            Err(err) => {
                if surface {
                    tracing::error!(kind = %directive.kind(), error = %err, "directive failed");
                    self.notices
                        .notify(Notice::error(format!("Command failed: {}", err.message())));
                } else {
                    tracing::debug!(kind = %directive.kind(), error = %err, "directive failed (suppressed)");
                }
                Err(err)
            }
        }
    }
}
