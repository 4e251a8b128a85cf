//! Bookkeeping of which slot ids are currently injected.
//!
//! A slot is in at most one of the two sets. Only the clear operations talk
//! to the host; marking is local.

use std::collections::BTreeSet;

use lorekeys_core::model::Snippet;
use lorekeys_gateway::error::GatewayError;
use lorekeys_gateway::gateway::CommandGateway;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionTracker {
    permanent: BTreeSet<String>,
    ephemeral: BTreeSet<String>,
}

impl InjectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an injection, moving the slot out of the other set.
    pub fn mark_injected(&mut self, id: &str, is_ephemeral: bool) {
        if is_ephemeral {
            self.permanent.remove(id);
            self.ephemeral.insert(id.to_string());
        } else {
            self.ephemeral.remove(id);
            self.permanent.insert(id.to_string());
        }
    }

    /// Flush host-side ephemeral injections and forget them locally.
    ///
    /// The local set is emptied even if the flush fails; flush failures are
    /// never surfaced to the user by the gateway.
    pub async fn clear_ephemeral(&mut self, gateway: &CommandGateway) -> Result<(), GatewayError> {
        let result = gateway.flush_ephemeral().await;
        self.ephemeral.clear();
        result
    }

    /// Remove every known snippet's slot from the host, then forget all
    /// permanent injections. Individual failures are reported by the
    /// gateway and do not stop the sweep.
    pub async fn clear_permanent(&mut self, snippets: &[Snippet], gateway: &CommandGateway) {
        for snippet in snippets {
            if snippet.label.is_empty() {
                continue;
            }
            if let Err(err) = gateway.remove(&snippet.slot_id()).await {
                tracing::debug!(label = %snippet.label, error = %err, "slot removal failed");
            }
        }
        self.permanent.clear();
    }

    /// Forget everything without touching the host. Used when the chat
    /// context changes and prior injections no longer apply.
    pub fn clear_all(&mut self) {
        self.permanent.clear();
        self.ephemeral.clear();
    }

    /// Forget ephemeral slots locally; the host consumed them with the
    /// message that just arrived.
    pub fn expire_ephemeral(&mut self) {
        self.ephemeral.clear();
    }

    /// `(permanent, ephemeral)` counts for display.
    pub fn counts(&self) -> (usize, usize) {
        (self.permanent.len(), self.ephemeral.len())
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.permanent.contains(id) || self.ephemeral.contains(id)
    }

    pub fn is_ephemeral(&self, id: &str) -> bool {
        self.ephemeral.contains(id)
    }

    pub fn is_permanent(&self, id: &str) -> bool {
        self.permanent.contains(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Arc;

    use lorekeys_gateway::directive::{Directive, DirectiveKind};
    use lorekeys_gateway::mock::MockInterpreter;
    use lorekeys_gateway::notice::InMemoryNoticeSink;

    use super::*;

    fn gateway(mock: &Arc<MockInterpreter>, sink: &Arc<InMemoryNoticeSink>) -> CommandGateway {
        CommandGateway::new(mock.clone(), sink.clone())
    }

    #[test]
    fn mark_is_idempotent_and_exclusive() {
        let mut tracker = InjectionTracker::new();
        tracker.mark_injected("Slash", false);
        tracker.mark_injected("Slash", true);
        tracker.mark_injected("Slash", true);
        assert_eq!(tracker.counts(), (0, 1));
        assert!(tracker.is_ephemeral("Slash"));
        assert!(!tracker.is_permanent("Slash"));

        tracker.mark_injected("Slash", false);
        assert_eq!(tracker.counts(), (1, 0));
    }

    #[tokio::test]
    async fn clear_ephemeral_flushes_and_empties_even_on_failure() {
        let mock = Arc::new(MockInterpreter::new().with_kind_error(
            DirectiveKind::FlushEphemeral,
            GatewayError::rejected(DirectiveKind::FlushEphemeral, "no"),
        ));
        let sink = Arc::new(InMemoryNoticeSink::new());
        let gw = gateway(&mock, &sink);

        let mut tracker = InjectionTracker::new();
        tracker.mark_injected("Slash", true);
        tracker.mark_injected("Block", false);

        assert!(tracker.clear_ephemeral(&gw).await.is_err());
        assert_eq!(tracker.counts(), (1, 0));
        assert_eq!(mock.directives(), vec![Directive::FlushEphemeral]);
        assert_eq!(sink.count(), 0);
    }

    #[tokio::test]
    async fn clear_permanent_removes_every_known_snippet() {
        let mock = Arc::new(MockInterpreter::new());
        let sink = Arc::new(InMemoryNoticeSink::new());
        let gw = gateway(&mock, &sink);

        let mut tracker = InjectionTracker::new();
        tracker.mark_injected("Fire_Ball", false);
        tracker.mark_injected("Slash", true);

        let snippets = vec![Snippet::new("Fire Ball", "a"), Snippet::new("Slash", "b")];
        tracker.clear_permanent(&snippets, &gw).await;

        assert_eq!(mock.rendered(), vec![r#"/inject id="Fire_Ball" """#, r#"/inject id="Slash" """#]);
        assert_eq!(tracker.counts(), (0, 1));
    }

    #[test]
    fn clear_all_and_expire_are_local() {
        let mut tracker = InjectionTracker::new();
        tracker.mark_injected("a", true);
        tracker.mark_injected("b", false);
        tracker.expire_ephemeral();
        assert_eq!(tracker.counts(), (1, 0));
        tracker.clear_all();
        assert_eq!(tracker.counts(), (0, 0));
        assert!(!tracker.is_active("b"));
    }
}
