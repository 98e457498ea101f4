//! The single bridge from the outcome world back to `?`-style control flow.
//!
//! Converting never loses information: the first error message seeds the
//! error, every remaining one is flattened into its message log in order.
//! A clean outcome converts to nothing; "no error" is the default, not an
//! exceptional case.

use thiserror::Error;

use crate::logging::{MessageSink, log_error_messages};
use crate::message::MessageCode;
use crate::outcome::Outcome;

/// A flattened rendering of an outcome's error messages.
///
/// Seeded with the first error message's text; the texts of all error
/// messages (the seed included) are kept in order in
/// [`message_log`](Self::message_log). There is deliberately no nested chain
/// per message.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct OutcomeError {
    message: String,
    code: Option<MessageCode>,
    message_log: Vec<String>,
}

impl OutcomeError {
    /// The first error message's machine-readable code, if it carried one.
    pub fn code(&self) -> Option<MessageCode> {
        self.code
    }

    /// Texts of every error message, in accumulation order.
    pub fn message_log(&self) -> &[String] {
        &self.message_log
    }
}

impl<T> Outcome<T> {
    /// Convert the error messages into one [`OutcomeError`].
    ///
    /// Returns `None` when the outcome has no error.
    pub fn to_error(&self) -> Option<OutcomeError> {
        let errors = self.error_messages();
        let first = errors.first()?;

        Some(OutcomeError {
            message: first.text().to_string(),
            code: first.code(),
            message_log: errors.iter().map(|m| m.text().to_string()).collect(),
        })
    }

    /// `Err` with the converted error when the outcome has one, `Ok`
    /// otherwise.
    pub fn fail_on_error(&self) -> Result<(), OutcomeError> {
        match self.to_error() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Like [`Outcome::to_error`], but first writes the full error set through
/// `sink` exactly once. Sink failures are discarded: logging must never
/// prevent the error from being produced.
pub fn to_error_logged<T>(
    outcome: &Outcome<T>,
    sink: &dyn MessageSink,
    skip_if_already_logged: bool,
) -> Option<OutcomeError> {
    if !outcome.has_error() {
        return None;
    }

    let _ = log_error_messages(sink, outcome, skip_if_already_logged);

    outcome.to_error()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::logging::SinkError;
    use crate::message::{Message, MessageBuilder, Severity};
    use crate::outcome::OutcomeBuilder;
    use crate::trace::TraceInfo;

    fn error_message(trace: &TraceInfo, text: &str) -> std::sync::Arc<Message> {
        MessageBuilder::new(trace)
            .severity(Severity::Error)
            .internal_message(text)
            .build()
    }

    #[test]
    fn test_to_error_none_without_errors() {
        let trace = TraceInfo::new("test");
        let builder = OutcomeBuilder::<()>::new();
        builder.warn_with(&trace, |m| m.internal_message("just a warning"));

        assert!(builder.build().to_error().is_none());
        assert!(builder.build().fail_on_error().is_ok());
    }

    #[test]
    fn test_to_error_seeds_first_and_appends_rest() {
        let trace = TraceInfo::new("test");
        let builder = OutcomeBuilder::<()>::new();
        builder
            .with_error(error_message(&trace, "e1"))
            .with_error(error_message(&trace, "e2"))
            .with_error(error_message(&trace, "e3"));

        let error = builder.build().to_error().unwrap();
        assert_eq!(error.to_string(), "e1");
        assert_eq!(error.message_log(), ["e1", "e2", "e3"]);
    }

    #[test]
    fn test_to_error_carries_code() {
        let trace = TraceInfo::new("test");
        let builder = OutcomeBuilder::<()>::new();
        builder.invalid_operation(&trace, "bad state", None);

        let error = builder.build().to_error().unwrap();
        assert_eq!(error.code(), Some(MessageCode::InvalidOperation));
    }

    #[test]
    fn test_fail_on_error_returns_err() {
        let trace = TraceInfo::new("test");
        let builder = OutcomeBuilder::<()>::new();
        builder.with_error(error_message(&trace, "boom"));

        let err = builder.build().fail_on_error().unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    struct FailingSink {
        calls: Mutex<usize>,
    }

    impl MessageSink for FailingSink {
        fn log(&self, _message: &Message, _skip_if_already_logged: bool) -> Result<(), SinkError> {
            *self.calls.lock().unwrap() += 1;
            Err(SinkError::Failed("sink down".to_string()))
        }
    }

    #[test]
    fn test_to_error_logged_swallows_sink_failures() {
        let trace = TraceInfo::new("test");
        let builder = OutcomeBuilder::<()>::new();
        builder.with_error(error_message(&trace, "boom"));

        let sink = FailingSink {
            calls: Mutex::new(0),
        };
        let error = to_error_logged(&builder.build(), &sink, true);

        assert_eq!(error.unwrap().to_string(), "boom");
        assert_eq!(*sink.calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_to_error_logged_clean_outcome_skips_sink() {
        let sink = FailingSink {
            calls: Mutex::new(0),
        };
        let outcome = OutcomeBuilder::<()>::new().build();

        assert!(to_error_logged(&outcome, &sink, true).is_none());
        assert_eq!(*sink.calls.lock().unwrap(), 0);
    }
}
