//! Retry: delete the last message, re-inject the current snippet and
//! regenerate.
//!
//! Deleting and regenerating make some hosts emit a chat-changed event.
//! The retry guard keeps those events from tearing down the session while
//! the sequence runs and for a hold period after it ends.

use std::time::Duration;

use lorekeys_core::model::Snippet;
use lorekeys_gateway::error::GatewayError;
use lorekeys_gateway::notice::Notice;
use tokio::time::Instant;

use crate::error::EngineError;
use crate::session::{InjectOrigin, Session};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum GuardState {
    #[default]
    Idle,
    InFlight,
    Holding(Instant),
}

/// Suppresses chat-changed teardown while a retry is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryGuard {
    state: GuardState,
}

impl RetryGuard {
    pub fn is_active(&self) -> bool {
        match self.state {
            GuardState::Idle => false,
            GuardState::InFlight => true,
            GuardState::Holding(until) => Instant::now() < until,
        }
    }

    pub(crate) fn begin(&mut self) {
        self.state = GuardState::InFlight;
    }

    pub(crate) fn release_after(&mut self, hold: Duration) {
        self.state = GuardState::Holding(Instant::now() + hold);
    }

    pub(crate) fn release_now(&mut self) {
        self.state = GuardState::Idle;
    }
}

/// Keep going after routine rejections; stop only when the interpreter is gone.
fn fatal_only(result: Result<(), GatewayError>) -> Result<(), GatewayError> {
    match result {
        Err(err) if err.is_fatal() => Err(err),
        _ => Ok(()),
    }
}

impl Session {
    /// The snippet a retry would re-inject: the running chain's current
    /// step if it resolves, else the last injection.
    pub fn retry_candidate(&self) -> Option<&Snippet> {
        let from_chain = self
            .chains
            .running()
            .and_then(|run| run.current_label())
            .and_then(|label| self.registry.find_snippet(label));
        from_chain.or_else(|| self.last_injected_snippet())
    }

    /// Regenerate the last message with the current snippet re-injected.
    /// Does not move the chain cursor, so the current step repeats.
    ///
    /// Returns the label that was re-injected.
    pub async fn retry(&mut self) -> Result<String, EngineError> {
        let Some(snippet) = self.retry_candidate().cloned() else {
            self.notify(Notice::warning("Nothing to retry."));
            return Err(EngineError::NothingToRetry);
        };

        self.retry_guard.begin();
        self.last_injected = Some(snippet.label.clone());
        self.notify(Notice::info(format!("Retrying: {}", snippet.label)));
        tracing::info!(label = %snippet.label, "retrying last message");

        match self.run_retry_sequence(&snippet).await {
            Ok(()) => {
                self.retry_guard.release_after(self.retry_config.guard_hold);
                Ok(snippet.label)
            }
            Err(err) => {
                self.retry_guard.release_now();
                tracing::error!(label = %snippet.label, error = %err, "retry aborted");
                self.notify(Notice::error("Retry failed."));
                Err(EngineError::RetryAborted(err))
            }
        }
    }

    async fn run_retry_sequence(&mut self, snippet: &Snippet) -> Result<(), GatewayError> {
        fatal_only(self.tracker.clear_ephemeral(&self.gateway).await)?;
        fatal_only(self.gateway.delete_last_message().await)?;
        tokio::time::sleep(self.retry_config.settle_delay).await;
        fatal_only(self.inject_resolved(snippet, InjectOrigin::Auto).await)?;
        fatal_only(self.gateway.trigger_generation().await)
    }
}
