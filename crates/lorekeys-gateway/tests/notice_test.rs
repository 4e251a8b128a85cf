#![allow(clippy::expect_used, clippy::unwrap_used)]

//! Tests for the notice sinks.

use lorekeys_gateway::notice::{
    InMemoryNoticeSink, Notice, NoticeLevel, NoticeSink, NullNoticeSink, TracingNoticeSink,
};

#[test]
fn in_memory_sink_records_notices() {
    let sink = InMemoryNoticeSink::new();
    assert_eq!(sink.count(), 0);

    sink.notify(Notice::success("Injected: Slash"));
    sink.notify(Notice::warning("Limit reached."));

    assert_eq!(sink.count(), 2);
    let notices = sink.notices();
    assert_eq!(notices[0].level, NoticeLevel::Success);
    assert_eq!(sink.messages_at(NoticeLevel::Warning), vec!["Limit reached."]);

    sink.clear();
    assert_eq!(sink.count(), 0);
}

#[test]
fn notice_display_includes_level() {
    assert_eq!(Notice::error("boom").to_string(), "[error] boom");
    assert_eq!(Notice::info("Chain: Slash").to_string(), "[info] Chain: Slash");
}

#[test]
fn null_and_tracing_sinks_accept_notices() {
    NullNoticeSink.notify(Notice::info("dropped"));
    TracingNoticeSink.notify(Notice::error("logged"));
}
