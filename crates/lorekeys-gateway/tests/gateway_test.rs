#![allow(clippy::expect_used, clippy::unwrap_used)]

//! Gateway behavior against the mock interpreter: directive shapes,
//! failure reporting and flush suppression.

use std::sync::Arc;

use lorekeys_core::model::Role;
use lorekeys_gateway::directive::{Directive, DirectiveKind, InjectDirective};
use lorekeys_gateway::error::GatewayError;
use lorekeys_gateway::gateway::CommandGateway;
use lorekeys_gateway::mock::MockInterpreter;
use lorekeys_gateway::notice::{InMemoryNoticeSink, NoticeLevel};

fn setup(mock: MockInterpreter) -> (Arc<MockInterpreter>, Arc<InMemoryNoticeSink>, CommandGateway) {
    let mock = Arc::new(mock);
    let sink = Arc::new(InMemoryNoticeSink::new());
    let gateway = CommandGateway::new(mock.clone(), sink.clone());
    (mock, sink, gateway)
}

fn slash(content: &str) -> InjectDirective {
    InjectDirective {
        id: "Slash".into(),
        content: content.into(),
        depth: 0,
        role: Role::System,
        ephemeral: true,
    }
}

#[tokio::test]
async fn inject_submits_escaped_directive() {
    let (mock, sink, gateway) = setup(MockInterpreter::new());

    gateway.inject(slash("He said \"hi\"\\now")).await.unwrap();

    assert_eq!(
        mock.rendered(),
        vec![r#"/inject id="Slash" ephemeral="true" depth=0 role="system" position="chat" "He said \"hi\"\\now""#]
    );
    assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn remove_submits_empty_injection() {
    let (mock, _sink, gateway) = setup(MockInterpreter::new());
    gateway.remove("Block").await.unwrap();
    assert_eq!(mock.directives(), vec![Directive::Remove { id: "Block".into() }]);
}

#[tokio::test]
async fn inject_failure_is_returned_and_surfaced() {
    let (mock, sink, gateway) = setup(MockInterpreter::new().with_next_error(
        GatewayError::rejected(DirectiveKind::Inject, "bad quoting"),
    ));

    let err = gateway.inject(slash("x")).await.unwrap_err();
    assert!(!err.is_fatal());
    assert_eq!(mock.call_count(), 1);
    assert_eq!(
        sink.messages_at(NoticeLevel::Error),
        vec!["Command failed: bad quoting".to_string()]
    );
}

#[tokio::test]
async fn flush_failure_is_returned_but_not_surfaced() {
    let (mock, sink, gateway) = setup(MockInterpreter::new().with_kind_error(
        DirectiveKind::FlushEphemeral,
        GatewayError::rejected(DirectiveKind::FlushEphemeral, "nothing to flush"),
    ));

    assert!(gateway.flush_ephemeral().await.is_err());
    assert!(gateway.flush_ephemeral().await.is_err());
    assert_eq!(mock.count_kind(DirectiveKind::FlushEphemeral), 2);
    assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn retry_directives_render_host_commands() {
    let (mock, _sink, gateway) = setup(MockInterpreter::new());
    gateway.delete_last_message().await.unwrap();
    gateway.trigger_generation().await.unwrap();
    assert_eq!(mock.rendered(), vec!["/delete 1", "/trigger"]);
}

#[tokio::test]
async fn unavailable_interpreter_is_fatal() {
    let (_mock, sink, gateway) = setup(
        MockInterpreter::new().with_next_error(GatewayError::unavailable("parser missing")),
    );
    let err = gateway.trigger_generation().await.unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(sink.messages(), vec!["Command failed: parser missing".to_string()]);
}
