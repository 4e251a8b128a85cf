//! User-editable collection of snippets and chains.

use std::collections::BTreeMap;

use crate::error::RegistryError;
use crate::model::{sanitize_slot_id, Chain, Settings, Snippet};

/// Whether a save appended a new entry or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Added,
    Updated,
}

/// Form input for a snippet, before validation.
#[derive(Debug, Clone, Default)]
pub struct SnippetDraft {
    pub label: String,
    pub content: String,
    pub default_depth: u32,
}

impl SnippetDraft {
    pub fn new(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: content.into(),
            default_depth: 0,
        }
    }
}

/// Form input for a chain, before validation.
#[derive(Debug, Clone)]
pub struct ChainDraft {
    pub name: String,
    pub steps: Vec<String>,
    pub ephemeral: bool,
}

impl ChainDraft {
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
}

/// Ordered snippets and chains backed by a [`Settings`] blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetRegistry {
    settings: Settings,
}

impl Default for SnippetRegistry {
    fn default() -> Self {
        Self::new(Settings::defaults())
    }
}

impl SnippetRegistry {
    /// Wrap loaded settings. Slot collisions already present are kept
    /// (later entries alias earlier ones) and logged.
    pub fn new(settings: Settings) -> Self {
        let registry = Self { settings };
        for (slot_id, labels) in registry.slot_collisions() {
            tracing::warn!(slot_id = %slot_id, labels = ?labels, "snippet labels share an injection slot");
        }
        registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn snippets(&self) -> &[Snippet] {
        &self.settings.buttons
    }

    pub fn chains(&self) -> &[Chain] {
        &self.settings.chains
    }

    /// First snippet with this exact label.
    pub fn find_snippet(&self, label: &str) -> Option<&Snippet> {
        self.settings.buttons.iter().find(|s| s.label == label)
    }

    pub fn chain(&self, index: usize) -> Option<&Chain> {
        self.settings.chains.get(index)
    }

    /// Slot ids shared by more than one label, with the labels in registry order.
    pub fn slot_collisions(&self) -> Vec<(String, Vec<String>)> {
        let mut by_slot: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for snippet in &self.settings.buttons {
            by_slot
                .entry(snippet.slot_id())
                .or_default()
                .push(snippet.label.clone());
        }
        by_slot
            .into_iter()
            .filter(|(_, labels)| labels.len() > 1)
            .collect()
    }

    /// Add a snippet, or replace the one at `edit_index`.
    pub fn save_snippet(
        &mut self,
        edit_index: Option<usize>,
        draft: SnippetDraft,
    ) -> Result<SaveOutcome, RegistryError> {
        let label = draft.label.trim();
        let content = draft.content.trim();
        if label.is_empty() || content.is_empty() {
            return Err(RegistryError::MissingSnippetFields);
        }
        if let Some(index) = edit_index {
            self.check_index("snippet", index, self.settings.buttons.len())?;
        }

        let slot_id = sanitize_slot_id(label);
        let clash = self
            .settings
            .buttons
            .iter()
            .enumerate()
            .find(|(i, s)| Some(*i) != edit_index && s.slot_id() == slot_id);
        if let Some((_, existing)) = clash {
            return Err(RegistryError::SlotCollision {
                label: label.to_string(),
                existing: existing.label.clone(),
                slot_id,
            });
        }

        let snippet = Snippet::new(label, content).with_depth(draft.default_depth);
        match edit_index {
            Some(index) => {
                self.settings.buttons[index] = snippet;
                Ok(SaveOutcome::Updated)
            }
            None => {
                self.settings.buttons.push(snippet);
                Ok(SaveOutcome::Added)
            }
        }
    }

    pub fn remove_snippet(&mut self, index: usize) -> Result<Snippet, RegistryError> {
        self.check_index("snippet", index, self.settings.buttons.len())?;
        Ok(self.settings.buttons.remove(index))
    }

    /// Add a chain, or replace the one at `edit_index`. Step labels are not
    /// checked here; a missing label aborts the run that reaches it.
    pub fn save_chain(
        &mut self,
        edit_index: Option<usize>,
        draft: ChainDraft,
    ) -> Result<SaveOutcome, RegistryError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(RegistryError::MissingChainName);
        }
        if draft.steps.is_empty() {
            return Err(RegistryError::EmptyChain);
        }
        if let Some(index) = edit_index {
            self.check_index("chain", index, self.settings.chains.len())?;
        }

        let chain = Chain {
            name: name.to_string(),
            steps: draft.steps,
            ephemeral: draft.ephemeral,
        };
        match edit_index {
            Some(index) => {
                self.settings.chains[index] = chain;
                Ok(SaveOutcome::Updated)
            }
            None => {
                self.settings.chains.push(chain);
                Ok(SaveOutcome::Added)
            }
        }
    }

    pub fn remove_chain(&mut self, index: usize) -> Result<Chain, RegistryError> {
        self.check_index("chain", index, self.settings.chains.len())?;
        Ok(self.settings.chains.remove(index))
    }

    pub fn reset_defaults(&mut self) {
        self.settings = Settings::defaults();
    }

    fn check_index(&self, kind: &'static str, index: usize, len: usize) -> Result<(), RegistryError> {
        if index < len {
            Ok(())
        } else {
            Err(RegistryError::IndexOutOfRange { kind, index, len })
        }
    }
}
