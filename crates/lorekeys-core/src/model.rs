//! Snippet and chain domain types.
//!
//! These mirror the settings blob the host keeps under the extension key,
//! so field names serialize in camelCase and unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// Key of the settings blob inside the host's extension settings map.
pub const EXTENSION_KEY: &str = "lorebook_keys";

/// Replace every character outside `[A-Za-z0-9]` with `_`, one per UTF-16
/// code unit, so ids match the ones the host already holds.
///
/// The result is the injection slot key for a snippet. Two labels that
/// sanitize to the same id share a slot.
pub fn sanitize_slot_id(label: &str) -> String {
    let mut id = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            id.push(c);
        } else {
            id.extend(std::iter::repeat('_').take(c.len_utf16()));
        }
    }
    id
}

/// Chat role an injection is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    System,
    Assistant,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Assistant => "assistant",
            Self::User => "user",
        }
    }

    /// Parse a role from its string representation.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Some(Self::System),
            "assistant" => Some(Self::Assistant),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named prompt snippet (a panel button).
///
/// Identity is the label; the slot id is derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub label: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub default_depth: u32,
    /// Keyword of pre-content settings, only read during normalization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl Snippet {
    pub fn new(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: content.into(),
            default_depth: 0,
            key: None,
        }
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.default_depth = depth;
        self
    }

    pub fn slot_id(&self) -> String {
        sanitize_slot_id(&self.label)
    }

    /// Content sent to the host; an empty snippet injects `[label]`.
    pub fn injection_content(&self) -> String {
        if self.content.is_empty() {
            format!("[{}]", self.label)
        } else {
            self.content.clone()
        }
    }
}

fn default_chain_ephemeral() -> bool {
    true
}

/// An ordered sequence of snippet labels. A template only; progress lives
/// in the engine's run state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub name: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default = "default_chain_ephemeral")]
    pub ephemeral: bool,
}

impl Chain {
    pub fn new<I, S>(name: impl Into<String>, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            steps: steps.into_iter().map(Into::into).collect(),
            ephemeral: true,
        }
    }

    /// Steps joined the way the panel shows them in a tooltip.
    pub fn describe_steps(&self) -> String {
        self.steps.join(" -> ")
    }
}

/// The persisted settings blob.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub buttons: Vec<Snippet>,
    #[serde(default)]
    pub chains: Vec<Chain>,
}

const DEFAULT_BUTTONS: &[(&str, &str, u32)] = &[
    ("Slash", "[Attack with your main weapon, aiming for a weak point.]", 0),
    ("Block", "[Raise your defense to deflect the incoming attack.]", 1),
    ("Dodge", "[Roll to the side to evade the attack completely.]", 1),
    ("Fireball", "[Cast a powerful Fireball spell at the enemy.]", 1),
    ("Heal", "[Drink a potion or cast a spell to restore health.]", 1),
    ("Buff", "[Cast a spell to increase your strength and speed.]", 1),
    ("Scout", "[Look around carefully for traps, hidden enemies, or clues.]", 1),
    ("Stealth", "[Move silently and hide in the shadows to avoid detection.]", 1),
    ("Taunt", "[Yell a challenge to draw the enemy's attention.]", 1),
    ("Loot", "[Search the defeated enemy or the area for valuable items.]", 1),
    ("Persuade", "[Attempt to reason with the creature or NPC.]", 1),
    ("Finisher", "[Unleash your ultimate technique to end the fight.]", 1),
];

const DEFAULT_CHAINS: &[(&str, &[&str])] = &[
    (
        "Standard Combat",
        &["Buff", "Taunt", "Slash", "Block", "Slash", "Loot"],
    ),
    ("Dungeon Crawl", &["Stealth", "Scout", "Stealth", "Scout", "Loot"]),
    (
        "Epic Boss",
        &[
            "Scout", "Buff", "Taunt", "Slash", "Block", "Dodge", "Fireball", "Heal", "Finisher",
            "Loot",
        ],
    ),
];

impl Settings {
    /// Built-in snippets and chains used on first access and on reset.
    pub fn defaults() -> Self {
        Self {
            buttons: DEFAULT_BUTTONS
                .iter()
                .map(|(label, content, depth)| Snippet::new(*label, *content).with_depth(*depth))
                .collect(),
            chains: DEFAULT_CHAINS
                .iter()
                .map(|(name, steps)| Chain::new(*name, steps.iter().copied()))
                .collect(),
        }
    }

    /// Fill in content for snippets saved before content existed.
    ///
    /// Returns `true` when anything changed and the blob should be saved.
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;
        for snippet in &mut self.buttons {
            if !snippet.content.is_empty() {
                continue;
            }
            snippet.content = match snippet.key.as_deref() {
                Some(key) if !key.is_empty() => format!("[Legacy: {key}]"),
                _ => format!("[{}]", snippet.label),
            };
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_non_alphanumerics() {
        assert_eq!(sanitize_slot_id("Slash"), "Slash");
        assert_eq!(sanitize_slot_id("Fire Ball!"), "Fire_Ball_");
        assert_eq!(sanitize_slot_id("a-b.c"), "a_b_c");
        assert_eq!(sanitize_slot_id("épée"), "_p_e");
    }

    #[test]
    fn sanitize_counts_astral_characters_as_two_units() {
        assert_eq!(sanitize_slot_id("\u{1F525}"), "__");
        assert_eq!(sanitize_slot_id("Fire \u{1F525}"), "Fire___");
        assert_ne!(sanitize_slot_id("\u{1F525}"), sanitize_slot_id("_"));
    }

    #[test]
    fn empty_content_falls_back_to_bracketed_label() {
        assert_eq!(Snippet::new("Slash", "").injection_content(), "[Slash]");
        assert_eq!(Snippet::new("Slash", "hit").injection_content(), "hit");
    }

    #[test]
    fn defaults_have_unique_slot_ids() {
        let settings = Settings::defaults();
        assert_eq!(settings.buttons.len(), 12);
        assert_eq!(settings.chains.len(), 3);
        let mut ids: Vec<String> = settings.buttons.iter().map(Snippet::slot_id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 12);
    }

    #[test]
    fn settings_deserialize_host_blob() {
        let raw = r#"{
            "buttons": [
                {"label": "Slash", "content": "[Attack]", "defaultDepth": 0, "ephemeral": true},
                {"label": "Old", "key": "sword"}
            ],
            "chains": [{"name": "Combo", "steps": ["Slash", "Block"]}]
        }"#;
        let mut settings: Settings = match serde_json::from_str(raw) {
            Ok(settings) => settings,
            Err(err) => panic!("parse: {err}"),
        };
        assert!(settings.chains[0].ephemeral);
        assert!(settings.normalize());
        assert_eq!(settings.buttons[1].content, "[Legacy: sword]");
        assert!(!settings.normalize());
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!(Role::from_str("Assistant"), Some(Role::Assistant));
        assert_eq!(Role::from_str("narrator"), None);
        assert_eq!(Role::default().as_str(), "system");
    }
}
