//! Fluent mutator over an [`Outcome`], including the merge algebra.
//!
//! All mutators take `&self` (the state lives behind the shared handle) and
//! return `&Self` for chaining. Merges are append-only concatenation: they
//! preserve the other outcome's internal order, append after pre-existing
//! entries, and never reorder or dedup. Payload merging is the one deliberate
//! asymmetry: message lists accumulate, the payload is replaced
//! (last-merge-wins).

use std::sync::Arc;

use crate::message::{Message, MessageBuilder, MessageCode, Severity};
use crate::outcome::Outcome;
use crate::trace::TraceSource;
use crate::validation::{ValidationReport, ValidationSeverity, failure_to_message};

/// Fluent accumulator wrapping exactly one [`Outcome`] for its lifetime.
///
/// [`build`](Self::build) hands out the wrapped handle without copying;
/// mutation through the builder stays visible to every holder.
pub struct OutcomeBuilder<T = ()> {
    outcome: Outcome<T>,
}

impl<T> Default for OutcomeBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OutcomeBuilder<T> {
    /// A builder over a fresh empty outcome.
    pub fn new() -> Self {
        Self {
            outcome: Outcome::empty(),
        }
    }

    /// A builder over an existing outcome (shares its state; the explicit
    /// replacement for implicit result-to-builder conversions).
    pub fn from_outcome(outcome: Outcome<T>) -> Self {
        Self { outcome }
    }

    /// The wrapped outcome. Not a snapshot: later mutation through this
    /// builder remains visible to the returned handle.
    pub fn build(&self) -> Outcome<T> {
        self.outcome.clone()
    }

    pub fn has_error(&self) -> bool {
        self.outcome.has_error()
    }

    pub fn has_transaction_rollback_error(&self) -> bool {
        self.outcome.has_transaction_rollback_error()
    }

    // --- direct appends ---

    pub fn with_success(&self, message: impl Into<Arc<Message>>) -> &Self {
        self.outcome.write().success.push(message.into());
        self
    }

    pub fn with_warn(&self, message: impl Into<Arc<Message>>) -> &Self {
        self.outcome.write().warnings.push(message.into());
        self
    }

    pub fn with_error(&self, message: impl Into<Arc<Message>>) -> &Self {
        self.outcome.write().errors.push(message.into());
        self
    }

    // --- build-and-append with category-default severity ---

    pub fn success_with(
        &self,
        trace: &impl TraceSource,
        configure: impl FnOnce(MessageBuilder) -> MessageBuilder,
    ) -> &Self {
        let builder = MessageBuilder::new(trace).severity(Severity::Info);
        self.with_success(configure(builder).build())
    }

    pub fn warn_with(
        &self,
        trace: &impl TraceSource,
        configure: impl FnOnce(MessageBuilder) -> MessageBuilder,
    ) -> &Self {
        let builder = MessageBuilder::new(trace).severity(Severity::Warn);
        self.with_warn(configure(builder).build())
    }

    pub fn error_with(
        &self,
        trace: &impl TraceSource,
        configure: impl FnOnce(MessageBuilder) -> MessageBuilder,
    ) -> &Self {
        let builder = MessageBuilder::new(trace).severity(Severity::Error);
        self.with_error(configure(builder).build())
    }

    // --- merge algebra ---

    /// Append `other`'s error messages after any pre-existing entries.
    pub fn merge_errors<U>(&self, other: &Outcome<U>) -> &Self {
        let errors = other.error_messages();
        if !errors.is_empty() {
            self.outcome.write().errors.extend(errors);
        }
        self
    }

    /// Append `other`'s success, warning, and error lists independently;
    /// categories never leak into each other.
    pub fn merge_all<U>(&self, other: &Outcome<U>) -> &Self {
        let success = other.success_messages();
        let warnings = other.warning_messages();
        let errors = other.error_messages();

        let mut state = self.outcome.write();
        state.success.extend(success);
        state.warnings.extend(warnings);
        state.errors.extend(errors);
        drop(state);
        self
    }

    /// Merge errors, then report whether the receiver now has any error.
    /// Used as an early-exit guard after merging a sub-call's outcome.
    pub fn merge_has_error<U>(&self, other: &Outcome<U>) -> bool {
        self.merge_errors(other);
        self.outcome.has_error()
    }

    /// Merge errors, then report whether the receiver now carries a
    /// rollback-triggering error.
    pub fn merge_has_transaction_rollback_error<U>(&self, other: &Outcome<U>) -> bool {
        self.merge_errors(other);
        self.outcome.has_transaction_rollback_error()
    }

    pub fn merge_all_has_error<U>(&self, other: &Outcome<U>) -> bool {
        self.merge_all(other);
        self.outcome.has_error()
    }

    pub fn merge_all_has_transaction_rollback_error<U>(&self, other: &Outcome<U>) -> bool {
        self.merge_all(other);
        self.outcome.has_transaction_rollback_error()
    }

    /// Ingest a validation report: `Error`-severity failures become error
    /// messages, everything else becomes warnings. Returns whether any error
    /// resulted.
    pub fn merge_validation_has_error(
        &self,
        trace: &impl TraceSource,
        report: &ValidationReport,
        with_property_name: bool,
    ) -> bool {
        for failure in &report.failures {
            let message = failure_to_message(trace.trace_info(), failure, with_property_name);
            match failure.severity {
                ValidationSeverity::Error => self.with_error(message),
                _ => self.with_warn(message),
            };
        }
        self.outcome.has_error()
    }

    // --- payload ---

    /// Assign the payload. Marks `data_was_set` even when assigning `None`.
    pub fn with_data(&self, data: Option<T>) -> &Self {
        let mut state = self.outcome.write();
        state.data = data;
        state.data_was_set = true;
        drop(state);
        self
    }

    pub fn clear_data(&self) -> &Self {
        let mut state = self.outcome.write();
        state.data = None;
        state.data_was_set = false;
        drop(state);
        self
    }

    pub fn with_affected_entities(&self, count: u64) -> &Self {
        self.outcome.write().affected_entities = Some(count);
        self
    }

    pub fn clear_success_messages(&self) -> &Self {
        self.outcome.write().success.clear();
        self
    }

    // --- coded error shortcuts ---

    pub fn argument_error(
        &self,
        trace: &impl TraceSource,
        internal_message: impl Into<String>,
        source: Option<&anyhow::Error>,
    ) -> &Self {
        self.coded_error(MessageCode::Argument, trace, internal_message.into(), source)
    }

    pub fn argument_null(
        &self,
        trace: &impl TraceSource,
        param_name: &str,
        source: Option<&anyhow::Error>,
    ) -> &Self {
        self.coded_error(
            MessageCode::ArgumentNull,
            trace,
            format!("missing required argument: {param_name}"),
            source,
        )
    }

    pub fn argument_out_of_range(
        &self,
        trace: &impl TraceSource,
        internal_message: impl Into<String>,
        source: Option<&anyhow::Error>,
    ) -> &Self {
        self.coded_error(
            MessageCode::ArgumentOutOfRange,
            trace,
            internal_message.into(),
            source,
        )
    }

    pub fn invalid_operation(
        &self,
        trace: &impl TraceSource,
        internal_message: impl Into<String>,
        source: Option<&anyhow::Error>,
    ) -> &Self {
        self.coded_error(
            MessageCode::InvalidOperation,
            trace,
            internal_message.into(),
            source,
        )
    }

    pub fn not_implemented(
        &self,
        trace: &impl TraceSource,
        internal_message: impl Into<String>,
        source: Option<&anyhow::Error>,
    ) -> &Self {
        self.coded_error(
            MessageCode::NotImplemented,
            trace,
            internal_message.into(),
            source,
        )
    }

    pub fn not_supported(
        &self,
        trace: &impl TraceSource,
        internal_message: impl Into<String>,
        source: Option<&anyhow::Error>,
    ) -> &Self {
        self.coded_error(
            MessageCode::NotSupported,
            trace,
            internal_message.into(),
            source,
        )
    }

    /// An error with caller-facing text in addition to the internal text.
    pub fn client_error(
        &self,
        trace: &impl TraceSource,
        client_message: impl Into<String>,
        internal_message: Option<&str>,
        source: Option<&anyhow::Error>,
    ) -> &Self {
        self.error_with(trace, |mut b| {
            b = b
                .code(MessageCode::InvalidOperation)
                .client_message(client_message);
            if let Some(internal) = internal_message {
                b = b.internal_message(internal);
            }
            if let Some(failure) = source {
                b = b.caused_by(failure);
            }
            b
        })
    }

    /// A plain warning with optional source failure.
    pub fn warning(
        &self,
        trace: &impl TraceSource,
        internal_message: impl Into<String>,
        source: Option<&anyhow::Error>,
    ) -> &Self {
        let internal = internal_message.into();
        self.warn_with(trace, |mut b| {
            b = b.internal_message(internal.clone());
            if let Some(failure) = source {
                b = b.caused_by(failure).detail(internal.clone());
            }
            b
        })
    }

    fn coded_error(
        &self,
        code: MessageCode,
        trace: &impl TraceSource,
        internal_message: String,
        source: Option<&anyhow::Error>,
    ) -> &Self {
        self.error_with(trace, |mut b| {
            b = b.code(code).internal_message(internal_message.clone());
            if let Some(failure) = source {
                b = b.caused_by(failure).detail(internal_message.clone());
            }
            b
        })
    }
}

impl<T: Clone> OutcomeBuilder<T> {
    /// [`merge_all`](Self::merge_all) plus payload replacement: the
    /// receiver's data is overwritten with `other`'s, last-merge-wins.
    pub fn merge_all_with_data(&self, other: &Outcome<T>) -> &Self {
        self.merge_all(other);
        self.with_data(other.data());
        self
    }

    pub fn merge_all_with_data_has_error(&self, other: &Outcome<T>) -> bool {
        self.merge_all_with_data(other);
        self.outcome.has_error()
    }

    pub fn merge_all_with_data_has_transaction_rollback_error(&self, other: &Outcome<T>) -> bool {
        self.merge_all_with_data(other);
        self.outcome.has_transaction_rollback_error()
    }
}
