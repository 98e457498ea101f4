//! Read-only JSON representation of outcomes.
//!
//! Deserialization rebuilds the shared in-memory shapes from the wire form;
//! the write direction is intentionally unsupported (see the `Serialize`
//! impl on [`Outcome`]).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::message::{Message, MessageBuilder, MessageCode, Severity};
use crate::outcome::{Outcome, OutcomeBuilder};
use crate::trace::TraceInfo;

/// Wire form of one message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub created_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source_system: Option<String>,
    #[serde(default)]
    pub correlation_id: Option<Uuid>,
    #[serde(default)]
    pub code: Option<MessageCode>,
    #[serde(default)]
    pub internal_message: Option<String>,
    #[serde(default)]
    pub client_message: Option<String>,
    #[serde(default)]
    pub property_name: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub source_error: Option<String>,
    #[serde(default)]
    pub disable_transaction_rollback: bool,
}

impl MessageDto {
    /// Rebuild a [`Message`], falling back to `default_severity` for the
    /// list the message was found in.
    pub(crate) fn into_message(self, default_severity: Severity) -> Arc<Message> {
        let mut trace = TraceInfo::new(self.source_system.as_deref().unwrap_or("unknown"));
        trace.correlation_id = self.correlation_id;

        let mut builder =
            MessageBuilder::new(&trace).severity(self.severity.unwrap_or(default_severity));
        if let Some(created_utc) = self.created_utc {
            builder = builder.created_utc(created_utc);
        }
        if let Some(code) = self.code {
            builder = builder.code(code);
        }
        if let Some(text) = self.internal_message {
            builder = builder.internal_message(text);
        }
        if let Some(text) = self.client_message {
            builder = builder.client_message(text);
        }
        if let Some(name) = self.property_name {
            builder = builder.property_name(name);
        }
        if let Some(detail) = self.detail {
            builder = builder.detail(detail);
        }
        if let Some(rendered) = self.source_error {
            builder = builder.source_error(rendered);
        }
        builder
            .disable_transaction_rollback(self.disable_transaction_rollback)
            .build()
    }
}

/// Wire form of an outcome. Every field is optional on the wire; missing
/// lists deserialize as empty.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct OutcomeDto<T = ()> {
    #[serde(default)]
    pub success_messages: Vec<MessageDto>,
    #[serde(default)]
    pub warning_messages: Vec<MessageDto>,
    #[serde(default)]
    pub error_messages: Vec<MessageDto>,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub data_was_set: bool,
    #[serde(default)]
    pub affected_entities: Option<u64>,
}

impl<T> From<OutcomeDto<T>> for Outcome<T> {
    fn from(dto: OutcomeDto<T>) -> Self {
        let builder = OutcomeBuilder::<T>::new();
        for message in dto.success_messages {
            builder.with_success(message.into_message(Severity::Info));
        }
        for message in dto.warning_messages {
            builder.with_warn(message.into_message(Severity::Warn));
        }
        for message in dto.error_messages {
            builder.with_error(message.into_message(Severity::Error));
        }
        if dto.data_was_set || dto.data.is_some() {
            builder.with_data(dto.data);
        }
        if let Some(count) = dto.affected_entities {
            builder.with_affected_entities(count);
        }
        builder.build()
    }
}

/// Deserialize an outcome from its JSON wire form.
pub fn outcome_from_json<T: DeserializeOwned>(json: &str) -> Result<Outcome<T>, serde_json::Error> {
    let dto: OutcomeDto<T> = serde_json::from_str(json)?;
    Ok(dto.into())
}
