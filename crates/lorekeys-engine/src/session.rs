//! Session state and the chain engine operations.
//!
//! A `Session` owns everything that used to be ambient: the registry, the
//! injection tracker, chain state, the last-injected label and the retry
//! guard. Every operation takes `&mut self`, so calls cannot interleave;
//! hosts that share a session across tasks go through
//! [`crate::handle::SessionHandle`].

use std::sync::Arc;

use lorekeys_core::config::{ChainEphemeralPolicy, Config, InjectionConfig, RetryConfig};
use lorekeys_core::model::{Role, Settings, Snippet};
use lorekeys_core::registry::{ChainDraft, SaveOutcome, SnippetDraft, SnippetRegistry};
use lorekeys_core::store::{load_registry, SettingsStore};
use lorekeys_gateway::directive::InjectDirective;
use lorekeys_gateway::error::GatewayError;
use lorekeys_gateway::gateway::CommandGateway;
use lorekeys_gateway::notice::Notice;

use crate::chain::{ChainRun, ChainState};
use crate::error::EngineError;
use crate::event::HostEvent;
use crate::retry::RetryGuard;
use crate::tracker::InjectionTracker;

/// Who asked for an injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectOrigin {
    /// A button click; follows the global ephemeral toggle.
    Manual,
    /// A chain step or a retry; follows the chain policy while a chain runs.
    Auto,
}

/// Result of executing one chain step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Injected { label: String, cursor: usize },
    Completed { name: String },
}

/// Result of a manual seek.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeekOutcome {
    pub cursor: usize,
    /// The step now considered current; `None` at the start of the chain.
    pub label: Option<String>,
}

/// What a chain button click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainToggle {
    Started(StepOutcome),
    Paused,
    Resumed(StepOutcome),
}

pub struct Session {
    pub(crate) registry: SnippetRegistry,
    store: Arc<dyn SettingsStore>,
    pub(crate) gateway: CommandGateway,
    pub(crate) injection: InjectionConfig,
    pub(crate) retry_config: RetryConfig,
    pub(crate) tracker: InjectionTracker,
    pub(crate) chains: ChainState,
    pub(crate) last_injected: Option<String>,
    pub(crate) retry_guard: RetryGuard,
}

impl Session {
    /// Load the registry from `store` (initializing defaults on first
    /// access) and build an idle session.
    pub fn create(
        store: Arc<dyn SettingsStore>,
        gateway: CommandGateway,
        config: &Config,
    ) -> Result<Self, EngineError> {
        let registry = load_registry(store.as_ref())?;
        tracing::debug!(
            snippets = registry.snippets().len(),
            chains = registry.chains().len(),
            "session created"
        );
        Ok(Self {
            registry,
            store,
            gateway,
            injection: config.injection.clone(),
            retry_config: config.retry.clone(),
            tracker: InjectionTracker::new(),
            chains: ChainState::default(),
            last_injected: None,
            retry_guard: RetryGuard::default(),
        })
    }

    /// Tear the session down and hand back the settings it was editing.
    pub fn dispose(mut self) -> Settings {
        self.reset_context();
        tracing::debug!("session disposed");
        self.registry.settings().clone()
    }

    // -- accessors ---------------------------------------------------------

    pub fn registry(&self) -> &SnippetRegistry {
        &self.registry
    }

    pub fn tracker(&self) -> &InjectionTracker {
        &self.tracker
    }

    pub fn chain_state(&self) -> &ChainState {
        &self.chains
    }

    pub fn injection_config(&self) -> &InjectionConfig {
        &self.injection
    }

    /// Label of the most recent injection, as recorded.
    pub fn last_injected(&self) -> Option<&str> {
        self.last_injected.as_deref()
    }

    /// The most recent injection re-resolved against the current registry.
    pub fn last_injected_snippet(&self) -> Option<&Snippet> {
        self.last_injected
            .as_deref()
            .and_then(|label| self.registry.find_snippet(label))
    }

    pub fn is_retrying(&self) -> bool {
        self.retry_guard.is_active()
    }

    pub fn counts(&self) -> (usize, usize) {
        self.tracker.counts()
    }

    // -- panel toggles -----------------------------------------------------

    pub fn set_ephemeral_mode(&mut self, ephemeral: bool) {
        self.injection.ephemeral = ephemeral;
    }

    pub fn set_depth(&mut self, depth: Option<u32>) {
        self.injection.depth = depth;
    }

    pub fn set_role(&mut self, role: Role) {
        self.injection.role = role;
    }

    pub fn set_chain_policy(&mut self, policy: ChainEphemeralPolicy) {
        self.injection.chain_policy = policy;
    }

    pub(crate) fn notify(&self, notice: Notice) {
        self.gateway.notify(notice);
    }

    // -- host events -------------------------------------------------------

    pub async fn handle_event(&mut self, event: HostEvent) -> Result<(), EngineError> {
        match event {
            HostEvent::MessageReceived => self.on_message_received().await.map(|_| ()),
            HostEvent::ChatChanged => {
                self.on_chat_changed();
                Ok(())
            }
        }
    }

    /// A message arrived: advance the running chain by one step, or just
    /// forget ephemeral slots the host has consumed.
    pub async fn on_message_received(&mut self) -> Result<Option<StepOutcome>, EngineError> {
        if self.chains.running().is_none() {
            self.tracker.expire_ephemeral();
            return Ok(None);
        }
        tracing::debug!("advancing chain");
        self.advance().await.map(Some)
    }

    /// The chat context changed. Returns `false` when ignored because a
    /// retry is in flight.
    pub fn on_chat_changed(&mut self) -> bool {
        if self.retry_guard.is_active() {
            tracing::debug!("chat change ignored during retry");
            return false;
        }
        self.reset_context();
        true
    }

    /// Drop chain state and tracked injections without talking to the host.
    pub fn reset_context(&mut self) {
        if self.chains.stop() {
            tracing::info!("chain state discarded on context reset");
        }
        self.tracker.clear_all();
    }

    // -- manual injection --------------------------------------------------

    /// Inject a snippet by label, as a button click would.
    pub async fn inject_snippet(&mut self, label: &str) -> Result<(), EngineError> {
        let Some(snippet) = self.registry.find_snippet(label).cloned() else {
            self.notify(Notice::error(format!("Button \"{label}\" not found!")));
            return Err(EngineError::SnippetNotFound {
                label: label.to_string(),
            });
        };
        // Failures were already surfaced by the gateway.
        let _ = self.inject_resolved(&snippet, InjectOrigin::Manual).await;
        Ok(())
    }

    /// Stop the running chain and clear injections according to the global
    /// toggle: flush ephemeral slots, or remove every permanent slot.
    ///
    /// A paused run is only discarded together with a running one; on its
    /// own it survives the flush and can still be resumed.
    pub async fn flush(&mut self) {
        if self.chains.running().is_some() {
            self.chains.stop();
            self.notify(Notice::info("Chain Stopped."));
        }
        if self.injection.ephemeral {
            // Flush failures are never shown to the user.
            let _ = self.tracker.clear_ephemeral(&self.gateway).await;
            self.notify(Notice::info("Flushed ephemeral."));
        } else {
            self.tracker
                .clear_permanent(self.registry.snippets(), &self.gateway)
                .await;
            self.notify(Notice::info("Cleared permanent."));
        }
        self.last_injected = None;
    }

    pub(crate) fn ephemeral_for(&self, origin: InjectOrigin) -> bool {
        let toggle = self.injection.ephemeral;
        match (origin, self.chains.running()) {
            (InjectOrigin::Auto, Some(run)) => {
                self.injection.chain_policy.resolve(run.ephemeral, toggle)
            }
            _ => toggle,
        }
    }

    /// Inject an already-resolved snippet and track it. Records it as the
    /// last injection even if the host rejects it, so retry can repeat it.
    pub(crate) async fn inject_resolved(
        &mut self,
        snippet: &Snippet,
        origin: InjectOrigin,
    ) -> Result<(), GatewayError> {
        let ephemeral = self.ephemeral_for(origin);
        let id = snippet.slot_id();
        self.last_injected = Some(snippet.label.clone());

        self.gateway
            .inject(InjectDirective {
                id: id.clone(),
                content: snippet.injection_content(),
                depth: self.injection.depth.unwrap_or(snippet.default_depth),
                role: self.injection.role,
                ephemeral,
            })
            .await?;

        match origin {
            InjectOrigin::Auto => self.notify(Notice::info(format!("Chain: {}", snippet.label))),
            InjectOrigin::Manual => {
                self.notify(Notice::success(format!("Injected: {}", snippet.label)))
            }
        }
        self.tracker.mark_injected(&id, ephemeral);
        Ok(())
    }

    // -- chain engine ------------------------------------------------------

    /// Start chain `index` from its first step, replacing any running chain
    /// and discarding any paused one. A chain without steps is a no-op.
    pub async fn start_chain(&mut self, index: usize) -> Result<StepOutcome, EngineError> {
        let Some(chain) = self.registry.chain(index) else {
            return Err(EngineError::UnknownChain(index));
        };
        if chain.steps.is_empty() {
            tracing::debug!(chain = %chain.name, "ignoring start of empty chain");
            return Err(EngineError::EmptyChain {
                name: chain.name.clone(),
            });
        }
        let run = ChainRun::from_template(index, chain);
        tracing::info!(chain = %run.name, steps = run.len(), "starting chain");
        if let Some(previous) = self.chains.begin(run) {
            tracing::info!(chain = %previous.name, "replaced running chain");
        }
        self.execute_step().await
    }

    /// Advance the running chain: flush ephemeral injections, then fire the
    /// next step. One call per inbound message.
    pub async fn advance(&mut self) -> Result<StepOutcome, EngineError> {
        if self.chains.running().is_none() {
            return Err(EngineError::NotRunning);
        }
        let _ = self.tracker.clear_ephemeral(&self.gateway).await;
        self.execute_step().await
    }

    /// Fire the step under the cursor, or complete the chain. A step whose
    /// label no longer resolves aborts the run.
    pub(crate) async fn execute_step(&mut self) -> Result<StepOutcome, EngineError> {
        let Some(run) = self.chains.running() else {
            return Err(EngineError::NotRunning);
        };

        let Some(label) = run.pending_label().map(str::to_string) else {
            let name = run.name.clone();
            self.chains.finish();
            tracing::info!(chain = %name, "chain completed");
            self.notify(Notice::success(format!("Chain \"{name}\" Completed!")));
            return Ok(StepOutcome::Completed { name });
        };

        let Some(snippet) = self.registry.find_snippet(&label).cloned() else {
            self.chains.finish();
            tracing::warn!(label = %label, "chain aborted: step does not resolve");
            self.notify(Notice::error(format!(
                "Chain Error: Button \"{label}\" not found."
            )));
            return Err(EngineError::SnippetNotFound { label });
        };

        if let Err(err) = self.inject_resolved(&snippet, InjectOrigin::Auto).await {
            tracing::warn!(label = %label, error = %err, "chain step injection failed; continuing");
        }
        let cursor = match self.chains.running_mut() {
            Some(run) => {
                run.advance_cursor();
                run.cursor()
            }
            None => 0,
        };
        tracing::debug!(label = %label, cursor, "chain step executed");
        Ok(StepOutcome::Injected { label, cursor })
    }

    /// Freeze the running chain if it is chain `index`.
    pub async fn pause_chain(&mut self, index: usize) -> Result<(), EngineError> {
        let paused = self.chains.pause(index).map(|paused| paused.cursor());
        let cursor = match paused {
            Ok(cursor) => cursor,
            Err(err) => {
                self.notify(Notice::warning("Chain is not running."));
                return Err(err);
            }
        };
        let _ = self.tracker.clear_ephemeral(&self.gateway).await;
        tracing::info!(index, cursor, "chain paused");
        self.notify(Notice::info("Chain Paused"));
        Ok(())
    }

    /// Resume paused chain `index`, re-firing the step that was active when
    /// it was paused.
    pub async fn resume_chain(&mut self, index: usize) -> Result<StepOutcome, EngineError> {
        let resumed = self
            .chains
            .resume(index)
            .map(|run| (run.name.clone(), run.cursor()));
        match resumed {
            Ok((name, cursor)) => tracing::info!(chain = %name, cursor, "resuming chain"),
            Err(err) => {
                self.notify(Notice::warning("Chain is not paused."));
                return Err(err);
            }
        }
        self.execute_step().await
    }

    /// Chain button: pause if running, resume if paused, otherwise start.
    pub async fn toggle_chain(&mut self, index: usize) -> Result<ChainToggle, EngineError> {
        if self
            .chains
            .running()
            .is_some_and(|run| run.origin_index == index)
        {
            self.pause_chain(index).await?;
            return Ok(ChainToggle::Paused);
        }
        if self
            .chains
            .paused()
            .is_some_and(|paused| paused.origin_index() == index)
        {
            return self.resume_chain(index).await.map(ChainToggle::Resumed);
        }
        self.start_chain(index).await.map(ChainToggle::Started)
    }

    /// Move the cursor by `delta` without waiting for a message and re-fire
    /// the step that becomes current.
    pub async fn seek(&mut self, delta: isize) -> Result<SeekOutcome, EngineError> {
        let Some(run) = self.chains.running() else {
            self.notify(Notice::warning("No active chain."));
            return Err(EngineError::NotRunning);
        };
        let Some(target) = run.seek_target(delta) else {
            let target = run.cursor() as i64 + delta as i64;
            let len = run.len();
            self.notify(Notice::warning("Limit reached."));
            return Err(EngineError::StepOutOfRange { target, len });
        };
        let label = target
            .checked_sub(1)
            .and_then(|i| run.steps.get(i))
            .cloned();

        let _ = self.tracker.clear_ephemeral(&self.gateway).await;
        if let Some(run) = self.chains.running_mut() {
            run.set_cursor(target);
        }

        let Some(label) = label else {
            self.notify(Notice::info("Jumped to: Start"));
            return Ok(SeekOutcome {
                cursor: target,
                label: None,
            });
        };

        let Some(snippet) = self.registry.find_snippet(&label).cloned() else {
            self.chains.finish();
            self.notify(Notice::error(format!("Button \"{label}\" not found!")));
            return Err(EngineError::SnippetNotFound { label });
        };
        if let Err(err) = self.inject_resolved(&snippet, InjectOrigin::Auto).await {
            tracing::warn!(label = %label, error = %err, "seek injection failed");
        }
        self.notify(Notice::info(format!("Jumped to: {label}")));
        Ok(SeekOutcome {
            cursor: target,
            label: Some(label),
        })
    }

    /// Drop running and paused chains. Does not flush; callers that want a
    /// clean host follow up with [`Session::flush`].
    pub fn stop_chain(&mut self) -> bool {
        let stopped = self.chains.stop();
        if stopped {
            tracing::info!("chain stopped");
        }
        stopped
    }

    // -- registry edits ----------------------------------------------------

    pub fn save_snippet(
        &mut self,
        edit_index: Option<usize>,
        draft: SnippetDraft,
    ) -> Result<SaveOutcome, EngineError> {
        let outcome = match self.registry.save_snippet(edit_index, draft) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.notify(Notice::warning(err.to_string()));
                return Err(err.into());
            }
        };
        self.persist()?;
        self.notify(Notice::success(match outcome {
            SaveOutcome::Added => "Added!",
            SaveOutcome::Updated => "Updated!",
        }));
        Ok(outcome)
    }

    pub fn remove_snippet(&mut self, index: usize) -> Result<Snippet, EngineError> {
        let removed = self.registry.remove_snippet(index)?;
        self.persist()?;
        Ok(removed)
    }

    pub fn save_chain(
        &mut self,
        edit_index: Option<usize>,
        draft: ChainDraft,
    ) -> Result<SaveOutcome, EngineError> {
        let outcome = match self.registry.save_chain(edit_index, draft) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.notify(Notice::warning(err.to_string()));
                return Err(err.into());
            }
        };
        self.persist()?;
        self.notify(Notice::success(match outcome {
            SaveOutcome::Added => "Chain Created!",
            SaveOutcome::Updated => "Chain Updated!",
        }));
        Ok(outcome)
    }

    pub fn remove_chain(&mut self, index: usize) -> Result<(), EngineError> {
        self.registry.remove_chain(index)?;
        self.chains.template_removed(index);
        self.persist()
    }

    pub fn reset_defaults(&mut self) -> Result<(), EngineError> {
        self.registry.reset_defaults();
        self.persist()?;
        self.notify(Notice::success("Reset defaults."));
        Ok(())
    }

    fn persist(&self) -> Result<(), EngineError> {
        self.store.save(self.registry.settings()).map_err(|err| {
            tracing::error!(error = %err, "failed to save settings");
            EngineError::from(err)
        })
    }
}
