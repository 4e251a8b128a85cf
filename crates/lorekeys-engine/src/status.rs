//! Read-only view of a session for whatever renders the panel.

use crate::chain::{ChainBadge, ChainRun};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainProgress {
    pub name: String,
    pub cursor: usize,
    pub len: usize,
    /// Most recently fired step, or "Start".
    pub current: String,
    /// Step that fires next, or "Finish".
    pub next: String,
}

impl ChainProgress {
    fn from_run(run: &ChainRun) -> Self {
        Self {
            name: run.name.clone(),
            cursor: run.cursor(),
            len: run.len(),
            current: run.current_label().unwrap_or("Start").to_string(),
            next: run.pending_label().unwrap_or("Finish").to_string(),
        }
    }

    /// `Combo (1/2)`
    pub fn headline(&self) -> String {
        format!("{} ({}/{})", self.name, self.cursor, self.len)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetStatus {
    pub label: String,
    pub slot_id: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainStatus {
    pub index: usize,
    pub name: String,
    pub steps_summary: String,
    pub badge: ChainBadge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelStatus {
    pub permanent: usize,
    pub ephemeral: usize,
    pub chain: Option<ChainProgress>,
    pub snippets: Vec<SnippetStatus>,
    pub chains: Vec<ChainStatus>,
}

impl PanelStatus {
    /// `2 Perm | 1 Eph`
    pub fn counter_line(&self) -> String {
        format!("{} Perm | {} Eph", self.permanent, self.ephemeral)
    }
}

impl std::fmt::Display for PanelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.counter_line())?;
        match &self.chain {
            Some(progress) => writeln!(
                f,
                "{}: {} -> {}",
                progress.headline(),
                progress.current,
                progress.next
            ),
            None => writeln!(f, "no active chain"),
        }
    }
}

impl Session {
    pub fn status(&self) -> PanelStatus {
        let (permanent, ephemeral) = self.tracker.counts();
        let snippets = self
            .registry
            .snippets()
            .iter()
            .map(|snippet| {
                let slot_id = snippet.slot_id();
                SnippetStatus {
                    label: snippet.label.clone(),
                    active: self.tracker.is_active(&slot_id),
                    slot_id,
                }
            })
            .collect();
        let chains = self
            .registry
            .chains()
            .iter()
            .enumerate()
            .map(|(index, chain)| ChainStatus {
                index,
                name: chain.name.clone(),
                steps_summary: chain.describe_steps(),
                badge: self.chains.badge(index),
            })
            .collect();

        PanelStatus {
            permanent,
            ephemeral,
            chain: self.chains.running().map(ChainProgress::from_run),
            snippets,
            chains,
        }
    }
}

#[cfg(test)]
mod tests {
    use lorekeys_core::model::Chain;

    use super::*;

    #[test]
    fn progress_labels_fall_back_at_the_ends() {
        let mut run = ChainRun::from_template(0, &Chain::new("Combo", ["Slash", "Block"]));
        let start = ChainProgress::from_run(&run);
        assert_eq!(start.current, "Start");
        assert_eq!(start.next, "Slash");
        assert_eq!(start.headline(), "Combo (0/2)");

        run.set_cursor(2);
        let end = ChainProgress::from_run(&run);
        assert_eq!(end.current, "Block");
        assert_eq!(end.next, "Finish");
    }

    #[test]
    fn counter_line_format() {
        let status = PanelStatus {
            permanent: 2,
            ephemeral: 1,
            chain: None,
            snippets: Vec::new(),
            chains: Vec::new(),
        };
        assert_eq!(status.counter_line(), "2 Perm | 1 Eph");
        assert_eq!(status.to_string(), "2 Perm | 1 Eph\nno active chain\n");
    }
}
