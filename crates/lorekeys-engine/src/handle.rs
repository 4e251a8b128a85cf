//! Shared, serialized access to a [`Session`].
//!
//! Host callbacks can fire while a previous one is still awaiting the
//! gateway. Every call here takes the session lock for its whole duration,
//! so a message that arrives mid-step queues behind it (tokio's mutex is
//! fair) instead of interleaving.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::error::EngineError;
use crate::event::HostEvent;
use crate::session::{ChainToggle, SeekOutcome, Session, StepOutcome};
use crate::status::PanelStatus;

#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<Session>>,
}

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Exclusive access for operations without a delegate here.
    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().await
    }

    pub async fn handle_event(&self, event: HostEvent) -> Result<(), EngineError> {
        self.inner.lock().await.handle_event(event).await
    }

    pub async fn on_message_received(&self) -> Result<Option<StepOutcome>, EngineError> {
        self.inner.lock().await.on_message_received().await
    }

    pub async fn on_chat_changed(&self) -> bool {
        self.inner.lock().await.on_chat_changed()
    }

    pub async fn inject_snippet(&self, label: &str) -> Result<(), EngineError> {
        self.inner.lock().await.inject_snippet(label).await
    }

    pub async fn toggle_chain(&self, index: usize) -> Result<ChainToggle, EngineError> {
        self.inner.lock().await.toggle_chain(index).await
    }

    pub async fn seek(&self, delta: isize) -> Result<SeekOutcome, EngineError> {
        self.inner.lock().await.seek(delta).await
    }

    pub async fn retry(&self) -> Result<String, EngineError> {
        self.inner.lock().await.retry().await
    }

    pub async fn flush(&self) {
        self.inner.lock().await.flush().await;
    }

    pub async fn status(&self) -> PanelStatus {
        self.inner.lock().await.status()
    }
}
