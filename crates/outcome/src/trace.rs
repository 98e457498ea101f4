//! Trace and correlation context attached to every message.
//!
//! A [`TraceInfo`] identifies where a message was produced: the originating
//! system, a correlation id shared by every message of one logical request,
//! and a per-method frame. Deriving a child trace keeps the correlation id
//! while stamping a fresh frame, so merged outcomes stay correlated across
//! service boundaries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Capability for anything that can supply a trace context.
///
/// Collapses the trace-info-vs-method-scope parameter pairs into a single
/// bound: builder operations accept `&impl TraceSource` and work the same
/// with a raw [`TraceInfo`] or a [`MethodScope`].
pub trait TraceSource {
    fn trace_info(&self) -> &TraceInfo;
}

impl TraceSource for TraceInfo {
    fn trace_info(&self) -> &TraceInfo {
        self
    }
}

/// One method-level frame inside a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceFrame {
    /// Unique id of this method invocation.
    pub method_call_id: Uuid,

    /// Name of the member that produced the frame, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,

    /// Source file of the call site, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Source line of the call site, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl TraceFrame {
    pub fn new() -> Self {
        Self {
            method_call_id: Uuid::new_v4(),
            member: None,
            file: None,
            line: None,
        }
    }

    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }

    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }
}

impl Default for TraceFrame {
    fn default() -> Self {
        Self::new()
    }
}

/// Trace context captured when a message is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceInfo {
    /// Name of the system that produced the trace.
    pub source_system: String,

    /// Correlation id shared by all messages of one logical request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,

    /// The current method frame.
    pub frame: TraceFrame,
}

impl TraceInfo {
    /// Start a new trace with a fresh correlation id.
    pub fn new(source_system: impl Into<String>) -> Self {
        Self {
            source_system: source_system.into(),
            correlation_id: Some(Uuid::new_v4()),
            frame: TraceFrame::new(),
        }
    }

    /// Derive a child trace: same system and correlation id, fresh frame.
    pub fn derived(&self) -> Self {
        Self {
            source_system: self.source_system.clone(),
            correlation_id: self.correlation_id,
            frame: TraceFrame::new(),
        }
    }

    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.frame.member = Some(member.into());
        self
    }
}

/// A derived trace paired with a `tracing` span carrying its ids.
///
/// The span is created eagerly but not entered; callers decide when to enter
/// it (or attach it with `#[instrument(parent = ...)]`-style plumbing).
#[derive(Debug)]
pub struct MethodScope {
    trace: TraceInfo,
    span: tracing::Span,
}

impl MethodScope {
    /// Open a scope for `member`, deriving the trace from `parent`.
    pub fn enter(parent: &impl TraceSource, member: &str) -> Self {
        let trace = parent.trace_info().derived().with_member(member);
        let span = tracing::info_span!(
            "method_scope",
            member = %member,
            method_call_id = %trace.frame.method_call_id,
            correlation_id = ?trace.correlation_id,
        );
        Self { trace, span }
    }

    pub fn span(&self) -> &tracing::Span {
        &self.span
    }
}

impl TraceSource for MethodScope {
    fn trace_info(&self) -> &TraceInfo {
        &self.trace
    }
}
