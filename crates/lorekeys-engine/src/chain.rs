//! Chain run bookkeeping.
//!
//! A run is a snapshot of a chain template plus a cursor pointing at the
//! *next* step to execute: 0 means nothing has fired yet and
//! `cursor == steps.len()` means every step has fired. At most one run is
//! active and at most one is paused. Side effects live in the session;
//! everything here is pure state.

use lorekeys_core::model::Chain;

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRun {
    pub origin_index: usize,
    pub name: String,
    pub steps: Vec<String>,
    pub ephemeral: bool,
    cursor: usize,
}

impl ChainRun {
    /// Snapshot a template. Later edits to the template do not reach the run.
    pub fn from_template(origin_index: usize, chain: &Chain) -> Self {
        Self {
            origin_index,
            name: chain.name.clone(),
            steps: chain.steps.clone(),
            ephemeral: chain.ephemeral,
            cursor: 0,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.steps.len()
    }

    /// The step that fires next, if any.
    pub fn pending_label(&self) -> Option<&str> {
        self.steps.get(self.cursor).map(String::as_str)
    }

    /// The step that fired most recently.
    pub fn current_label(&self) -> Option<&str> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.steps.get(i))
            .map(String::as_str)
    }

    /// Cursor after moving by `delta`, or `None` outside `0..=len`.
    pub fn seek_target(&self, delta: isize) -> Option<usize> {
        self.cursor
            .checked_add_signed(delta)
            .filter(|target| *target <= self.steps.len())
    }

    pub(crate) fn advance_cursor(&mut self) {
        if self.cursor < self.steps.len() {
            self.cursor += 1;
        }
    }

    pub(crate) fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.steps.len());
    }

    pub(crate) fn rewind_one(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }
}

/// A frozen run waiting to be resumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PausedChainState {
    run: ChainRun,
}

impl PausedChainState {
    pub fn origin_index(&self) -> usize {
        self.run.origin_index
    }

    pub fn name(&self) -> &str {
        &self.run.name
    }

    /// Cursor at the moment of pausing.
    pub fn cursor(&self) -> usize {
        self.run.cursor
    }

    pub fn run(&self) -> &ChainRun {
        &self.run
    }
}

/// Engine phase. A paused chain can be remembered in either phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPhase {
    Idle,
    Running,
}

/// Per-template badge for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainBadge {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainState {
    running: Option<ChainRun>,
    paused: Option<PausedChainState>,
}

impl ChainState {
    pub fn phase(&self) -> ChainPhase {
        if self.running.is_some() {
            ChainPhase::Running
        } else {
            ChainPhase::Idle
        }
    }

    pub fn running(&self) -> Option<&ChainRun> {
        self.running.as_ref()
    }

    pub(crate) fn running_mut(&mut self) -> Option<&mut ChainRun> {
        self.running.as_mut()
    }

    pub fn paused(&self) -> Option<&PausedChainState> {
        self.paused.as_ref()
    }

    pub fn badge(&self, index: usize) -> ChainBadge {
        if self.running.as_ref().is_some_and(|r| r.origin_index == index) {
            ChainBadge::Running
        } else if self.paused.as_ref().is_some_and(|p| p.origin_index() == index) {
            ChainBadge::Paused
        } else {
            ChainBadge::Idle
        }
    }

    /// Make `run` the active run and drop any paused state. Returns the run
    /// it replaced.
    pub(crate) fn begin(&mut self, run: ChainRun) -> Option<ChainRun> {
        self.paused = None;
        self.running.replace(run)
    }

    /// Freeze the active run if it came from template `index`.
    pub(crate) fn pause(&mut self, index: usize) -> Result<&PausedChainState, EngineError> {
        match self.running.take() {
            Some(run) if run.origin_index == index => {
                Ok(self.paused.insert(PausedChainState { run }))
            }
            other => {
                self.running = other;
                Err(EngineError::NotRunningChain { index })
            }
        }
    }

    /// Restore the paused run for template `index`, rewound by one step so
    /// the step active at pause time fires again.
    pub(crate) fn resume(&mut self, index: usize) -> Result<&ChainRun, EngineError> {
        match self.paused.take() {
            Some(paused) if paused.origin_index() == index => {
                let mut run = paused.run;
                run.rewind_one();
                Ok(self.running.insert(run))
            }
            other => {
                self.paused = other;
                Err(EngineError::NotPaused { index })
            }
        }
    }

    /// End the active run (completion or abort), keeping any paused state.
    pub(crate) fn finish(&mut self) -> Option<ChainRun> {
        self.running.take()
    }

    /// Drop both the active and the paused run. Returns whether anything
    /// was dropped.
    pub(crate) fn stop(&mut self) -> bool {
        let had_any = self.running.is_some() || self.paused.is_some();
        self.running = None;
        self.paused = None;
        had_any
    }

    /// Keep origin indices pointing at the right template after template
    /// `index` was removed. A run of the removed template is dropped.
    pub(crate) fn template_removed(&mut self, index: usize) {
        if self.running.as_ref().is_some_and(|r| r.origin_index == index) {
            self.running = None;
        }
        if self.paused.as_ref().is_some_and(|p| p.origin_index() == index) {
            self.paused = None;
        }
        if let Some(run) = self.running.as_mut() {
            if run.origin_index > index {
                run.origin_index -= 1;
            }
        }
        if let Some(paused) = self.paused.as_mut() {
            if paused.run.origin_index > index {
                paused.run.origin_index -= 1;
            }
        }
    }
}
