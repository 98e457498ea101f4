//! Best-effort logging of outcome messages.
//!
//! Messages are written through a [`MessageSink`]; the built-in
//! [`TracingSink`] forwards to `tracing` events with the trace ids as
//! structured fields. Callers treat sinks as best-effort: conversion paths
//! discard sink failures so logging can never change an outcome.

use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, error, info, trace, warn};

use crate::message::{Message, Severity};
use crate::outcome::Outcome;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("message sink failure: {0}")]
    Failed(String),

    #[error("severity {0:?} is not valid for an error message")]
    UnsupportedSeverity(Severity),
}

/// Destination for outcome messages.
///
/// `skip_if_already_logged` suppresses messages whose logged marker is
/// already set; a sink that writes a message is expected to set it.
pub trait MessageSink {
    fn log(&self, message: &Message, skip_if_already_logged: bool) -> Result<(), SinkError>;
}

/// [`MessageSink`] writing `tracing` events at the message's severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MessageSink for TracingSink {
    fn log(&self, message: &Message, skip_if_already_logged: bool) -> Result<(), SinkError> {
        if skip_if_already_logged && message.is_logged() {
            return Ok(());
        }

        let correlation_id = message.trace().correlation_id;
        let method_call_id = message.trace().frame.method_call_id;
        match message.severity() {
            Severity::Trace => trace!(
                message_id = %message.id(),
                correlation_id = ?correlation_id,
                method_call_id = %method_call_id,
                code = ?message.code(),
                detail = ?message.detail(),
                "{}",
                message.text()
            ),
            Severity::Debug => debug!(
                message_id = %message.id(),
                correlation_id = ?correlation_id,
                method_call_id = %method_call_id,
                code = ?message.code(),
                detail = ?message.detail(),
                "{}",
                message.text()
            ),
            Severity::Info => info!(
                message_id = %message.id(),
                correlation_id = ?correlation_id,
                method_call_id = %method_call_id,
                code = ?message.code(),
                detail = ?message.detail(),
                "{}",
                message.text()
            ),
            Severity::Warn => warn!(
                message_id = %message.id(),
                correlation_id = ?correlation_id,
                method_call_id = %method_call_id,
                code = ?message.code(),
                detail = ?message.detail(),
                "{}",
                message.text()
            ),
            Severity::Error => error!(
                message_id = %message.id(),
                correlation_id = ?correlation_id,
                method_call_id = %method_call_id,
                code = ?message.code(),
                property_name = ?message.property_name(),
                detail = ?message.detail(),
                source_error = ?message.source_error(),
                "{}",
                message.text()
            ),
            Severity::Critical => error!(
                critical = true,
                message_id = %message.id(),
                correlation_id = ?correlation_id,
                method_call_id = %method_call_id,
                code = ?message.code(),
                property_name = ?message.property_name(),
                detail = ?message.detail(),
                source_error = ?message.source_error(),
                "{}",
                message.text()
            ),
        }

        message.mark_logged();
        Ok(())
    }
}

/// Write the outcome's error messages through `sink`, in accumulation order.
///
/// Fails on a message that is not error-level; the error list must only ever
/// hold `Error`/`Critical` severities.
pub fn log_error_messages<T>(
    sink: &dyn MessageSink,
    outcome: &Outcome<T>,
    skip_if_already_logged: bool,
) -> Result<(), SinkError> {
    for message in outcome.error_messages() {
        if !message.severity().is_error_level() {
            return Err(SinkError::UnsupportedSeverity(message.severity()));
        }
        sink.log(&message, skip_if_already_logged)?;
    }
    Ok(())
}

/// Write every message of the outcome through `sink`, interleaving the three
/// lists into chronological order by creation timestamp.
pub fn log_all_messages<T>(
    sink: &dyn MessageSink,
    outcome: &Outcome<T>,
    skip_if_already_logged: bool,
) -> Result<(), SinkError> {
    let messages = outcome
        .error_messages()
        .into_iter()
        .chain(outcome.warning_messages())
        .chain(outcome.success_messages())
        .sorted_by_key(|m| m.created_utc());

    for message in messages {
        sink.log(&message, skip_if_already_logged)?;
    }
    Ok(())
}
