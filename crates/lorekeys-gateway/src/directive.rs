//! Host command directives.
//!
//! Each directive renders to one slash-command string for the host's
//! command interpreter. Nothing here depends on the interpreter's grammar
//! beyond building these strings.

use lorekeys_core::model::Role;

/// The kind of directive, used in errors, logs and mock filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Inject,
    Remove,
    FlushEphemeral,
    DeleteLastMessage,
    TriggerGeneration,
}

impl DirectiveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inject => "inject",
            Self::Remove => "remove",
            Self::FlushEphemeral => "flush_ephemeral",
            Self::DeleteLastMessage => "delete_last_message",
            Self::TriggerGeneration => "trigger_generation",
        }
    }
}

impl std::fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One injection into a named slot. `content` is raw; escaping happens
/// when the directive is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectDirective {
    pub id: String,
    pub content: String,
    pub depth: u32,
    pub role: Role,
    pub ephemeral: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Inject(InjectDirective),
    /// Empty-content injection, which the host treats as clearing the slot.
    Remove { id: String },
    /// Clear every host-side ephemeral injection regardless of id.
    FlushEphemeral,
    DeleteLastMessage { count: u32 },
    TriggerGeneration,
}

impl Directive {
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Self::Inject(_) => DirectiveKind::Inject,
            Self::Remove { .. } => DirectiveKind::Remove,
            Self::FlushEphemeral => DirectiveKind::FlushEphemeral,
            Self::DeleteLastMessage { .. } => DirectiveKind::DeleteLastMessage,
            Self::TriggerGeneration => DirectiveKind::TriggerGeneration,
        }
    }

    /// Slot id touched by this directive, if any.
    pub fn slot_id(&self) -> Option<&str> {
        match self {
            Self::Inject(inject) => Some(&inject.id),
            Self::Remove { id } => Some(id),
            _ => None,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::Inject(InjectDirective {
                id,
                content,
                depth,
                role,
                ephemeral,
            }) => format!(
                "/inject id=\"{id}\" ephemeral=\"{ephemeral}\" depth={depth} role=\"{role}\" position=\"chat\" \"{}\"",
                escape_content(content)
            ),
            Self::Remove { id } => format!("/inject id=\"{id}\" \"\""),
            Self::FlushEphemeral => "/flushinject".to_string(),
            Self::DeleteLastMessage { count } => format!("/delete {count}"),
            Self::TriggerGeneration => "/trigger".to_string(),
        }
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Escape content for a double-quoted directive argument.
///
/// Backslashes are doubled first so the escapes added for quotes and
/// newlines are not escaped again.
pub fn escape_content(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
