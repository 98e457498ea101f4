//! Severity-tagged, trace-correlated diagnostic messages.
//!
//! A [`Message`] is one success/warning/error event. Messages are immutable
//! once built (the `logged` marker is the only interior-mutable bit) and are
//! shared as `Arc<Message>` between every outcome they get merged into.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::trace::{TraceInfo, TraceSource};

/// Severity of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl Severity {
    /// True for the severities an error message may carry.
    pub fn is_error_level(self) -> bool {
        matches!(self, Severity::Error | Severity::Critical)
    }
}

/// Machine-readable classification of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCode {
    Argument,
    ArgumentNull,
    ArgumentOutOfRange,
    InvalidOperation,
    NotImplemented,
    NotSupported,
    Application,
    Validation,
}

/// One severity-tagged, trace-correlated diagnostic entry.
///
/// Produced by [`MessageBuilder`]; all fields are fixed at build time.
#[derive(Debug)]
pub struct Message {
    id: Uuid,
    severity: Severity,
    created_utc: DateTime<Utc>,
    trace: TraceInfo,
    code: Option<MessageCode>,
    internal_message: Option<String>,
    client_message: Option<String>,
    property_name: Option<String>,
    detail: Option<String>,
    source_error: Option<String>,
    disable_transaction_rollback: bool,
    logged: AtomicBool,
}

impl Message {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn created_utc(&self) -> DateTime<Utc> {
        self.created_utc
    }

    pub fn trace(&self) -> &TraceInfo {
        &self.trace
    }

    pub fn code(&self) -> Option<MessageCode> {
        self.code
    }

    pub fn internal_message(&self) -> Option<&str> {
        self.internal_message.as_deref()
    }

    pub fn client_message(&self) -> Option<&str> {
        self.client_message.as_deref()
    }

    pub fn property_name(&self) -> Option<&str> {
        self.property_name.as_deref()
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn source_error(&self) -> Option<&str> {
        self.source_error.as_deref()
    }

    /// Whether this error message is flagged to NOT force a transactional
    /// rollback. Only meaningful for error-level messages.
    pub fn disable_transaction_rollback(&self) -> bool {
        self.disable_transaction_rollback
    }

    /// Best available text: internal, then client-facing, then detail.
    pub fn text(&self) -> &str {
        self.internal_message
            .as_deref()
            .or(self.client_message.as_deref())
            .or(self.detail.as_deref())
            .unwrap_or("unspecified message")
    }

    /// Whether a sink has already written this message.
    pub fn is_logged(&self) -> bool {
        self.logged.load(Ordering::Relaxed)
    }

    pub fn mark_logged(&self) {
        self.logged.store(true, Ordering::Relaxed);
    }
}

/// Fluent builder for [`Message`].
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    severity: Severity,
    created_utc: Option<DateTime<Utc>>,
    trace: TraceInfo,
    code: Option<MessageCode>,
    internal_message: Option<String>,
    client_message: Option<String>,
    property_name: Option<String>,
    detail: Option<String>,
    source_error: Option<String>,
    disable_transaction_rollback: bool,
}

impl MessageBuilder {
    pub fn new(trace: &impl TraceSource) -> Self {
        Self {
            severity: Severity::Info,
            created_utc: None,
            trace: trace.trace_info().clone(),
            code: None,
            internal_message: None,
            client_message: None,
            property_name: None,
            detail: None,
            source_error: None,
            disable_transaction_rollback: false,
        }
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Override the creation timestamp. Used when rehydrating persisted
    /// messages; fresh messages are stamped at build time.
    pub fn created_utc(mut self, created_utc: DateTime<Utc>) -> Self {
        self.created_utc = Some(created_utc);
        self
    }

    pub fn code(mut self, code: MessageCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn internal_message(mut self, text: impl Into<String>) -> Self {
        self.internal_message = Some(text.into());
        self
    }

    pub fn client_message(mut self, text: impl Into<String>) -> Self {
        self.client_message = Some(text.into());
        self
    }

    pub fn property_name(mut self, name: impl Into<String>) -> Self {
        self.property_name = Some(name.into());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn source_error(mut self, rendered: impl Into<String>) -> Self {
        self.source_error = Some(rendered.into());
        self
    }

    /// Record the failure that produced this message, rendered with its
    /// full cause chain.
    pub fn caused_by(mut self, failure: &anyhow::Error) -> Self {
        self.source_error = Some(format!("{failure:#}"));
        self
    }

    pub fn disable_transaction_rollback(mut self, disable: bool) -> Self {
        self.disable_transaction_rollback = disable;
        self
    }

    pub fn build(self) -> Arc<Message> {
        Arc::new(Message {
            id: Uuid::new_v4(),
            severity: self.severity,
            created_utc: self.created_utc.unwrap_or_else(Utc::now),
            trace: self.trace,
            code: self.code,
            internal_message: self.internal_message,
            client_message: self.client_message,
            property_name: self.property_name,
            detail: self.detail,
            source_error: self.source_error,
            disable_transaction_rollback: self.disable_transaction_rollback,
            logged: AtomicBool::new(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let trace = TraceInfo::new("test");
        let msg = MessageBuilder::new(&trace).build();

        assert_eq!(msg.severity(), Severity::Info);
        assert!(!msg.disable_transaction_rollback());
        assert!(!msg.is_logged());
        assert_eq!(msg.text(), "unspecified message");
    }

    #[test]
    fn test_text_prefers_internal_message() {
        let trace = TraceInfo::new("test");
        let msg = MessageBuilder::new(&trace)
            .internal_message("internal")
            .client_message("client")
            .detail("detail")
            .build();

        assert_eq!(msg.text(), "internal");

        let msg = MessageBuilder::new(&trace).client_message("client").build();
        assert_eq!(msg.text(), "client");
    }

    #[test]
    fn test_logged_marker() {
        let trace = TraceInfo::new("test");
        let msg = MessageBuilder::new(&trace).build();

        assert!(!msg.is_logged());
        msg.mark_logged();
        assert!(msg.is_logged());
    }

    #[test]
    fn test_severity_error_levels() {
        assert!(Severity::Error.is_error_level());
        assert!(Severity::Critical.is_error_level());
        assert!(!Severity::Warn.is_error_level());
        assert!(!Severity::Info.is_error_level());
    }

    #[test]
    fn test_caused_by_renders_chain() {
        let trace = TraceInfo::new("test");
        let failure = anyhow::anyhow!("io failure").context("loading config");
        let msg = MessageBuilder::new(&trace)
            .severity(Severity::Error)
            .caused_by(&failure)
            .build();

        let rendered = msg.source_error().unwrap();
        assert!(rendered.contains("loading config"));
        assert!(rendered.contains("io failure"));
    }
}
