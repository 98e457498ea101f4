//! Tests for the outcome builder and its merge algebra.

use std::sync::Arc;

use crate::message::{Message, MessageBuilder, Severity};
use crate::outcome::{Outcome, OutcomeBuilder};
use crate::trace::TraceInfo;

fn msg(trace: &TraceInfo, severity: Severity, text: &str) -> Arc<Message> {
    MessageBuilder::new(trace)
        .severity(severity)
        .internal_message(text)
        .build()
}

fn texts(messages: &[Arc<Message>]) -> Vec<String> {
    messages.iter().map(|m| m.text().to_string()).collect()
}

#[test]
fn test_merge_all_concatenates_per_category() {
    let trace = TraceInfo::new("test");

    let a = OutcomeBuilder::<()>::new();
    a.with_success(msg(&trace, Severity::Info, "a-s1"))
        .with_warn(msg(&trace, Severity::Warn, "a-w1"))
        .with_error(msg(&trace, Severity::Error, "a-e1"));

    let b = OutcomeBuilder::<()>::new();
    b.with_success(msg(&trace, Severity::Info, "b-s1"))
        .with_success(msg(&trace, Severity::Info, "b-s2"))
        .with_warn(msg(&trace, Severity::Warn, "b-w1"))
        .with_error(msg(&trace, Severity::Error, "b-e1"));

    a.merge_all(&b.build());
    let merged = a.build();

    // concatenation in receiver's-then-other's order, not set union
    assert_eq!(texts(&merged.success_messages()), ["a-s1", "b-s1", "b-s2"]);
    assert_eq!(texts(&merged.warning_messages()), ["a-w1", "b-w1"]);
    assert_eq!(texts(&merged.error_messages()), ["a-e1", "b-e1"]);
}

#[test]
fn test_merge_all_never_leaks_categories() {
    let trace = TraceInfo::new("test");

    let other = OutcomeBuilder::<()>::new();
    other
        .with_success(msg(&trace, Severity::Info, "s"))
        .with_warn(msg(&trace, Severity::Warn, "w"));

    let receiver = OutcomeBuilder::<()>::new();
    receiver.merge_all(&other.build());
    let merged = receiver.build();

    assert_eq!(merged.success_messages().len(), 1);
    assert_eq!(merged.warning_messages().len(), 1);
    assert!(merged.error_messages().is_empty());
}

#[test]
fn test_merge_errors_ignores_success_and_warnings() {
    let trace = TraceInfo::new("test");

    let other = OutcomeBuilder::<()>::new();
    other
        .with_success(msg(&trace, Severity::Info, "s"))
        .with_warn(msg(&trace, Severity::Warn, "w"))
        .with_error(msg(&trace, Severity::Error, "e"));

    let receiver = OutcomeBuilder::<()>::new();
    receiver.merge_errors(&other.build());
    let merged = receiver.build();

    assert!(!merged.has_success());
    assert!(!merged.has_warning());
    assert_eq!(texts(&merged.error_messages()), ["e"]);
}

#[test]
fn test_merge_preserves_duplicates() {
    let trace = TraceInfo::new("test");
    let shared = msg(&trace, Severity::Error, "dup");

    let other = OutcomeBuilder::<()>::new();
    other.with_error(shared.clone());

    let receiver = OutcomeBuilder::<()>::new();
    receiver.with_error(shared.clone());
    receiver.merge_errors(&other.build());

    // append-only: no dedup even for the same message instance
    assert_eq!(receiver.build().error_messages().len(), 2);
}

#[test]
fn test_merge_all_with_data_last_merge_wins() {
    let trace = TraceInfo::new("test");

    let receiver = OutcomeBuilder::<i64>::new();
    receiver.with_data(Some(1));
    receiver.with_error(msg(&trace, Severity::Error, "kept"));

    let other = Outcome::from_data(2);
    receiver.merge_all_with_data(&other);

    let merged = receiver.build();
    assert_eq!(merged.data(), Some(2));
    // messages accumulated, payload replaced
    assert_eq!(texts(&merged.error_messages()), ["kept"]);

    // overwrite happens even when the other payload is unset-to-None
    let cleared = OutcomeBuilder::<i64>::new();
    cleared.with_data(None);
    receiver.merge_all_with_data(&cleared.build());
    assert_eq!(receiver.build().data(), None);
    assert!(receiver.build().data_was_set());
}

#[test]
fn test_data_was_set_distinguishes_never_set() {
    let builder = OutcomeBuilder::<i64>::new();
    assert!(!builder.build().data_was_set());
    assert_eq!(builder.build().data(), None);

    builder.with_data(None);
    assert!(builder.build().data_was_set());
    assert_eq!(builder.build().data(), None);

    builder.clear_data();
    assert!(!builder.build().data_was_set());
}

#[test]
fn test_merge_has_error_flags() {
    let trace = TraceInfo::new("test");

    let clean = OutcomeBuilder::<()>::new().build();
    let failed = OutcomeBuilder::<()>::new();
    failed.with_error(msg(&trace, Severity::Error, "e"));
    let failed = failed.build();

    let receiver = OutcomeBuilder::<()>::new();
    assert!(!receiver.merge_has_error(&clean));
    assert!(receiver.merge_has_error(&failed));
    // once failed, merging a clean outcome still reports the sticky error
    assert!(receiver.merge_has_error(&clean));
    assert!(receiver.merge_all_has_error(&clean));
}

#[test]
fn test_rollback_error_flag_honors_disable() {
    let trace = TraceInfo::new("test");

    let soft = MessageBuilder::new(&trace)
        .severity(Severity::Error)
        .internal_message("reported but not fatal")
        .disable_transaction_rollback(true)
        .build();

    let builder = OutcomeBuilder::<()>::new();
    builder.with_error(soft);

    let outcome = builder.build();
    assert!(outcome.has_error());
    assert!(!outcome.has_transaction_rollback_error());
    assert!(!builder.has_transaction_rollback_error());

    // one rollback-enabled error flips the flag
    builder.with_error(msg(&trace, Severity::Error, "fatal"));
    assert!(builder.build().has_transaction_rollback_error());
}

#[test]
fn test_merge_has_transaction_rollback_error() {
    let trace = TraceInfo::new("test");

    let soft = OutcomeBuilder::<()>::new();
    soft.with_error(
        MessageBuilder::new(&trace)
            .severity(Severity::Error)
            .internal_message("soft")
            .disable_transaction_rollback(true)
            .build(),
    );

    let receiver = OutcomeBuilder::<()>::new();
    assert!(!receiver.merge_has_transaction_rollback_error(&soft.build()));
    assert!(receiver.has_error());

    let hard = OutcomeBuilder::<()>::new();
    hard.with_error(msg(&trace, Severity::Error, "hard"));
    assert!(receiver.merge_all_has_transaction_rollback_error(&hard.build()));
}

#[test]
fn test_build_is_same_instance_not_snapshot() {
    let trace = TraceInfo::new("test");
    let builder = OutcomeBuilder::<()>::new();

    let before = builder.build();
    assert!(!before.has_error());

    builder.with_error(msg(&trace, Severity::Error, "late"));

    // the earlier handle observes the later mutation
    assert!(before.has_error());
    assert!(before.shares_state_with(&builder.build()));
}

#[test]
fn test_to_builder_shares_state() {
    let trace = TraceInfo::new("test");
    let outcome = Outcome::<()>::empty();

    outcome
        .to_builder()
        .with_warn(msg(&trace, Severity::Warn, "w"));

    assert!(outcome.has_warning());
}

#[test]
fn test_self_merge_duplicates_without_deadlock() {
    let trace = TraceInfo::new("test");
    let builder = OutcomeBuilder::<()>::new();
    builder.with_error(msg(&trace, Severity::Error, "e"));

    let handle = builder.build();
    builder.merge_all(&handle);

    assert_eq!(builder.build().error_messages().len(), 2);
}

#[test]
fn test_fluent_single_expression() {
    let trace = TraceInfo::new("test");

    let outcome = {
        let b = OutcomeBuilder::<()>::new();
        b.success_with(&trace, |m| m.internal_message("done"))
            .warn_with(&trace, |m| m.internal_message("slow"))
            .with_affected_entities(7)
            .build()
    };

    assert!(outcome.has_success());
    assert!(outcome.has_warning());
    assert!(!outcome.has_error());
    assert!(outcome.has_any_message());
    assert_eq!(outcome.affected_entities(), Some(7));
}

#[test]
fn test_category_default_severities() {
    let trace = TraceInfo::new("test");
    let builder = OutcomeBuilder::<()>::new();
    builder
        .success_with(&trace, |m| m)
        .warn_with(&trace, |m| m)
        .error_with(&trace, |m| m);

    let outcome = builder.build();
    assert_eq!(outcome.success_messages()[0].severity(), Severity::Info);
    assert_eq!(outcome.warning_messages()[0].severity(), Severity::Warn);
    assert_eq!(outcome.error_messages()[0].severity(), Severity::Error);
}

#[test]
fn test_clear_success_messages() {
    let trace = TraceInfo::new("test");
    let builder = OutcomeBuilder::<()>::new();
    builder
        .with_success(msg(&trace, Severity::Info, "s"))
        .with_warn(msg(&trace, Severity::Warn, "w"));

    builder.clear_success_messages();

    let outcome = builder.build();
    assert!(!outcome.has_success());
    assert!(outcome.has_warning());
}

#[test]
fn test_coded_error_helpers() {
    use crate::message::MessageCode;

    let trace = TraceInfo::new("test");
    let builder = OutcomeBuilder::<()>::new();
    let failure = anyhow::anyhow!("underlying");

    builder
        .argument_null(&trace, "controller", None)
        .invalid_operation(&trace, "bad state", Some(&failure))
        .not_supported(&trace, "no write path", None);

    let errors = builder.build().error_messages();
    assert_eq!(errors.len(), 3);
    assert_eq!(errors[0].code(), Some(MessageCode::ArgumentNull));
    assert!(errors[0].text().contains("controller"));
    assert_eq!(errors[1].code(), Some(MessageCode::InvalidOperation));
    assert_eq!(errors[1].source_error(), Some("underlying"));
    // detail mirrors the internal text only when a source failure is present
    assert_eq!(errors[1].detail(), Some("bad state"));
    assert_eq!(errors[0].detail(), None);
    assert_eq!(errors[2].code(), Some(MessageCode::NotSupported));
}

#[test]
fn test_client_error_carries_both_texts() {
    let trace = TraceInfo::new("test");
    let builder = OutcomeBuilder::<()>::new();
    builder.client_error(&trace, "something went wrong", Some("stack ref 12"), None);

    let errors = builder.build().error_messages();
    assert_eq!(errors[0].client_message(), Some("something went wrong"));
    assert_eq!(errors[0].internal_message(), Some("stack ref 12"));
}

#[test]
fn test_from_data_marks_payload_set() {
    let outcome = Outcome::from_data("payload".to_string());

    assert!(outcome.data_was_set());
    assert_eq!(outcome.data(), Some("payload".to_string()));
    assert!(!outcome.has_any_message());
}
