#![allow(clippy::expect_used, clippy::unwrap_used)]

//! Scripted sessions end to end, plus the JSON settings file a standalone
//! session writes.

use std::sync::Arc;

use lorekeys_core::config::Config;
use lorekeys_core::model::{Settings, EXTENSION_KEY};
use lorekeys_core::store::{JsonFileSettingsStore, MemorySettingsStore};
use lorekeys_engine::error::EngineError;
use lorekeys_engine::replay::{run_script, run_script_with, Script};
use lorekeys_engine::session::Session;
use lorekeys_gateway::gateway::CommandGateway;
use lorekeys_gateway::mock::MockInterpreter;
use lorekeys_gateway::notice::NullNoticeSink;

const STANDARD_COMBAT: &str = r#"
steps:
  - action: start
    chain: 0
  - action: message_received
  - action: seek
    delta: 1
  - action: status
  - action: seek
    delta: 9
  - action: toggle
    chain: 0
  - action: chat_changed
  - action: status
"#;

#[tokio::test(start_paused = true)]
async fn script_drives_the_default_chain() {
    let mock = Arc::new(MockInterpreter::new());
    let gateway = CommandGateway::new(mock.clone(), Arc::new(NullNoticeSink));
    let store = Arc::new(MemorySettingsStore::new());
    let mut session = Session::create(store, gateway, &Config::default()).unwrap();
    let script = Script::parse(STANDARD_COMBAT).unwrap();

    let reports = run_script(&mut session, &script).await;

    assert_eq!(reports.len(), 8);
    assert!(matches!(
        reports[4].error,
        Some(EngineError::StepOutOfRange { .. })
    ));
    assert_eq!(
        reports.iter().filter(|r| r.error.is_some()).count(),
        1
    );

    let mid = reports[3].status.as_ref().unwrap();
    assert_eq!(mid.chain.as_ref().unwrap().headline(), "Standard Combat (3/6)");
    assert_eq!(mid.chain.as_ref().unwrap().current, "Slash");

    let end = reports[7].status.as_ref().unwrap();
    assert!(end.chain.is_none());
    assert_eq!(end.counter_line(), "0 Perm | 0 Eph");

    assert_eq!(mock.injected_ids(), vec!["Buff", "Taunt", "Slash"]);
}

#[tokio::test(start_paused = true)]
async fn status_reports_arrive_before_later_steps_run() {
    let mock = Arc::new(MockInterpreter::new());
    let gateway = CommandGateway::new(mock.clone(), Arc::new(NullNoticeSink));
    let mut session =
        Session::create(Arc::new(MemorySettingsStore::new()), gateway, &Config::default()).unwrap();
    let script = Script::parse(
        "steps:\n  - action: inject\n    label: Slash\n  - action: status\n  - action: inject\n    label: Block\n  - action: status\n",
    )
    .unwrap();

    let mut seen = Vec::new();
    let reports = run_script_with(&mut session, &script, |report| {
        if let Some(status) = &report.status {
            seen.push((report.index, mock.call_count(), status.counter_line()));
        }
    })
    .await;

    assert_eq!(reports.len(), 4);
    assert_eq!(
        seen,
        vec![
            (1, 1, "0 Perm | 1 Eph".to_string()),
            (3, 2, "0 Perm | 2 Eph".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn first_session_writes_defaults_beside_other_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"other_extension": {"enabled": true}}"#).unwrap();

    let gateway = CommandGateway::new(Arc::new(MockInterpreter::new()), Arc::new(NullNoticeSink));
    let store = Arc::new(JsonFileSettingsStore::new(&path));
    let session = Session::create(store, gateway, &Config::default()).unwrap();
    drop(session);

    let root: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(root["other_extension"]["enabled"], true);
    let saved: Settings = serde_json::from_value(root[EXTENSION_KEY].clone()).unwrap();
    assert_eq!(saved, Settings::defaults());
}

#[tokio::test(start_paused = true)]
async fn script_file_loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("script.yaml");
    std::fs::write(
        &path,
        "steps:\n  - action: inject\n    label: Heal\n  - action: ephemeral\n    enabled: false\n  - action: inject\n    label: Loot\n  - action: flush\n",
    )
    .unwrap();

    let mock = Arc::new(MockInterpreter::new());
    let gateway = CommandGateway::new(mock.clone(), Arc::new(NullNoticeSink));
    let mut session =
        Session::create(Arc::new(MemorySettingsStore::new()), gateway, &Config::default()).unwrap();
    let script = Script::load(&path).unwrap();

    let reports = run_script(&mut session, &script).await;

    assert!(reports.iter().all(|r| r.error.is_none()));
    assert_eq!(session.counts(), (0, 1));
    // Permanent flush removes one slot per default snippet.
    assert_eq!(
        mock.count_kind(lorekeys_gateway::directive::DirectiveKind::Remove),
        Settings::defaults().buttons.len()
    );
}
