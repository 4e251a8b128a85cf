//! Scripted sessions: a YAML list of host events and panel actions run
//! against a session in order.
//!
//! ```yaml
//! steps:
//!   - action: start
//!     chain: 0
//!   - action: message_received
//!   - action: seek
//!     delta: -1
//!   - action: status
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::EngineError;
use crate::event::HostEvent;
use crate::session::Session;
use crate::status::PanelStatus;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse script: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum ScriptStep {
    Inject { label: String },
    Start { chain: usize },
    Toggle { chain: usize },
    Pause { chain: usize },
    Resume { chain: usize },
    Seek { delta: isize },
    Stop,
    Flush,
    Retry,
    MessageReceived,
    ChatChanged,
    /// Sets the global ephemeral toggle.
    Ephemeral { enabled: bool },
    /// Wait, in virtual or real time, before the next step.
    Sleep { millis: u64 },
    Status,
}

impl Script {
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }
}

/// What happened on one script step.
#[derive(Debug)]
pub struct StepReport {
    pub index: usize,
    pub step: ScriptStep,
    pub error: Option<EngineError>,
    /// Present for `status` steps.
    pub status: Option<PanelStatus>,
}

/// Run every step. Engine errors are recorded on the step and do not stop
/// the script, matching how a panel keeps accepting clicks after a failure.
pub async fn run_script(session: &mut Session, script: &Script) -> Vec<StepReport> {
    run_script_with(session, script, |_| {}).await
}

/// Like [`run_script`], calling `on_step` with each report right after its
/// step ran, before the next step issues any directive.
pub async fn run_script_with<F>(
    session: &mut Session,
    script: &Script,
    mut on_step: F,
) -> Vec<StepReport>
where
    F: FnMut(&StepReport),
{
    let mut reports = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.iter().enumerate() {
        tracing::debug!(index, step = ?step, "replay step");
        let mut status = None;
        let result = match step {
            ScriptStep::Inject { label } => session.inject_snippet(label).await,
            ScriptStep::Start { chain } => session.start_chain(*chain).await.map(|_| ()),
            ScriptStep::Toggle { chain } => session.toggle_chain(*chain).await.map(|_| ()),
            ScriptStep::Pause { chain } => session.pause_chain(*chain).await,
            ScriptStep::Resume { chain } => session.resume_chain(*chain).await.map(|_| ()),
            ScriptStep::Seek { delta } => session.seek(*delta).await.map(|_| ()),
            ScriptStep::Stop => {
                session.stop_chain();
                Ok(())
            }
            ScriptStep::Flush => {
                session.flush().await;
                Ok(())
            }
            ScriptStep::Retry => session.retry().await.map(|_| ()),
            ScriptStep::MessageReceived => session.handle_event(HostEvent::MessageReceived).await,
            ScriptStep::ChatChanged => session.handle_event(HostEvent::ChatChanged).await,
            ScriptStep::Ephemeral { enabled } => {
                session.set_ephemeral_mode(*enabled);
                Ok(())
            }
            ScriptStep::Sleep { millis } => {
                tokio::time::sleep(std::time::Duration::from_millis(*millis)).await;
                Ok(())
            }
            ScriptStep::Status => {
                status = Some(session.status());
                Ok(())
            }
        };
        if let Err(err) = &result {
            tracing::warn!(index, error = %err, "replay step failed");
        }
        let report = StepReport {
            index,
            step: step.clone(),
            error: result.err(),
            status,
        };
        on_step(&report);
        reports.push(report);
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_steps() {
        let script = match Script::parse(
            "steps:\n  - action: start\n    chain: 1\n  - action: seek\n    delta: -1\n  - action: message_received\n  - action: ephemeral\n    enabled: false\n",
        ) {
            Ok(script) => script,
            Err(err) => panic!("parse: {err}"),
        };
        assert_eq!(
            script.steps,
            vec![
                ScriptStep::Start { chain: 1 },
                ScriptStep::Seek { delta: -1 },
                ScriptStep::MessageReceived,
                ScriptStep::Ephemeral { enabled: false },
            ]
        );
    }

    #[test]
    fn rejects_unknown_actions() {
        assert!(matches!(
            Script::parse("steps:\n  - action: explode\n"),
            Err(ScriptError::Parse(_))
        ));
    }
}
