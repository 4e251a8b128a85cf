//! Chat events delivered by the host's event bus.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    /// A new chat message arrived; drives chain advancement.
    MessageReceived,
    /// The active chat changed; drives teardown.
    ChatChanged,
}

impl HostEvent {
    /// Host event-type name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MessageReceived => "MESSAGE_RECEIVED",
            Self::ChatChanged => "CHAT_CHANGED",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MESSAGE_RECEIVED" => Some(Self::MessageReceived),
            "CHAT_CHANGED" => Some(Self::ChatChanged),
            _ => None,
        }
    }
}

impl std::fmt::Display for HostEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::HostEvent;

    #[test]
    fn parses_host_names_case_insensitively() {
        assert_eq!(
            HostEvent::from_str("message_received"),
            Some(HostEvent::MessageReceived)
        );
        assert_eq!(HostEvent::from_str("CHAT_CHANGED"), Some(HostEvent::ChatChanged));
        assert_eq!(HostEvent::from_str("GENERATION_STARTED"), None);
        assert_eq!(HostEvent::ChatChanged.to_string(), "CHAT_CHANGED");
    }
}
