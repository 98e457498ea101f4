//! Validation-failure ingestion.
//!
//! The validation collaborator hands over an ordered report of failures;
//! [`OutcomeBuilder::merge_validation_has_error`] routes each failure by
//! severity into the warning or error list. Only the ingestion mapping lives
//! here; rule evaluation belongs to the collaborator.
//!
//! [`OutcomeBuilder::merge_validation_has_error`]: crate::outcome::OutcomeBuilder::merge_validation_has_error

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::message::{Message, MessageBuilder, MessageCode, Severity};
use crate::trace::TraceInfo;

/// Prefix validators put in front of every object path for the root scope.
/// Stripped before the path is surfaced as a property name.
const ROOT_SCOPE_PREFIX: &str = "_.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationSeverity {
    Warning,
    Error,
}

/// One failed validation rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    /// Path of the validated member, e.g. `_.address.city`. Empty for
    /// object-level failures.
    #[serde(default)]
    pub object_path: String,

    pub severity: ValidationSeverity,

    /// Plain failure text.
    pub message: String,

    /// Failure text qualified with the property name, when the validator
    /// produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_with_property_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ValidationFailure {
    pub fn error(object_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            object_path: object_path.into(),
            severity: ValidationSeverity::Error,
            message: message.into(),
            message_with_property_name: None,
            detail: None,
        }
    }

    pub fn warning(object_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            object_path: object_path.into(),
            severity: ValidationSeverity::Warning,
            message: message.into(),
            message_with_property_name: None,
            detail: None,
        }
    }

    pub fn with_message_with_property_name(mut self, message: impl Into<String>) -> Self {
        self.message_with_property_name = Some(message.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// The object path rendered for the message's property-name field:
    /// `None` for an empty path, otherwise the path without the root-scope
    /// prefix.
    pub fn property_name(&self) -> Option<&str> {
        let path = self.object_path.trim();
        if path.is_empty() {
            return None;
        }
        Some(path.strip_prefix(ROOT_SCOPE_PREFIX).unwrap_or(path))
    }
}

/// Ordered sequence of validation failures, as produced by the validation
/// collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    #[serde(default)]
    pub failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    pub fn new(failures: Vec<ValidationFailure>) -> Self {
        Self { failures }
    }

    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.failures
            .iter()
            .any(|f| f.severity == ValidationSeverity::Error)
    }
}

/// Map one failure to a message of the matching category.
pub(crate) fn failure_to_message(
    trace: &TraceInfo,
    failure: &ValidationFailure,
    with_property_name: bool,
) -> Arc<Message> {
    let severity = match failure.severity {
        ValidationSeverity::Error => Severity::Error,
        ValidationSeverity::Warning => Severity::Warn,
    };

    let text = if with_property_name {
        failure
            .message_with_property_name
            .as_deref()
            .unwrap_or(&failure.message)
    } else {
        &failure.message
    };

    let mut builder = MessageBuilder::new(trace)
        .severity(severity)
        .code(MessageCode::Validation)
        .client_message(text);
    if let Some(property_name) = failure.property_name() {
        builder = builder.property_name(property_name);
    }
    if let Some(detail) = &failure.detail {
        builder = builder.detail(detail.clone());
    }
    builder.build()
}
