#![allow(clippy::expect_used, clippy::unwrap_used)]

//! Contract tests for the mock interpreter itself.

use lorekeys_core::model::Role;
use lorekeys_gateway::directive::{Directive, DirectiveKind, InjectDirective};
use lorekeys_gateway::error::GatewayError;
use lorekeys_gateway::interpreter::CommandInterpreter;
use lorekeys_gateway::mock::MockInterpreter;

fn inject(id: &str) -> Directive {
    Directive::Inject(InjectDirective {
        id: id.into(),
        content: format!("[{id}]"),
        depth: 1,
        role: Role::User,
        ephemeral: false,
    })
}

#[tokio::test]
async fn records_directives_in_order() {
    let mock = MockInterpreter::new();
    mock.execute(&inject("Slash")).await.unwrap();
    mock.execute(&Directive::FlushEphemeral).await.unwrap();
    mock.execute(&inject("Block")).await.unwrap();

    assert_eq!(mock.call_count(), 3);
    assert_eq!(mock.injected_ids(), vec!["Slash", "Block"]);
    assert_eq!(mock.count_kind(DirectiveKind::FlushEphemeral), 1);
}

#[tokio::test]
async fn queued_errors_are_consumed_once() {
    let mock = MockInterpreter::new()
        .with_next_error(GatewayError::rejected(DirectiveKind::Inject, "first"));

    let err = mock.execute(&inject("Slash")).await.unwrap_err();
    assert_eq!(err.message(), "first");
    assert!(mock.execute(&inject("Slash")).await.is_ok());
    assert_eq!(mock.call_count(), 2);
}

#[tokio::test]
async fn kind_errors_persist_until_cleared() {
    let mock = MockInterpreter::new().with_kind_error(
        DirectiveKind::TriggerGeneration,
        GatewayError::unavailable("down"),
    );

    assert!(mock.execute(&Directive::TriggerGeneration).await.is_err());
    assert!(mock.execute(&inject("Slash")).await.is_ok());
    assert!(mock.execute(&Directive::TriggerGeneration).await.is_err());

    mock.clear_failures();
    assert!(mock.execute(&Directive::TriggerGeneration).await.is_ok());
}

#[tokio::test]
async fn reset_forgets_recorded_directives() {
    let mock = MockInterpreter::new();
    mock.execute(&inject("Slash")).await.unwrap();
    mock.reset();
    assert_eq!(mock.call_count(), 0);
    assert!(mock.rendered().is_empty());
}
