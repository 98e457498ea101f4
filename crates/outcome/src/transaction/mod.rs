//! Transaction-bounded execution of outcome-returning actions.
//!
//! The wrappers in this module run one unit of work against a transaction
//! collaborator, merge its outcome into an accumulator, and decide commit vs.
//! rollback from the merged state. Every infrastructure failure along the way
//! (action, commit, rollback, finalize, dispose, even the error-reporting
//! hook itself) is captured as an additional error message on the same
//! outcome instead of being re-thrown; the single exception is the read-only
//! contract violation, which is always surfaced as a hard fault.
//!
//! Two flavors with identical control-flow shape: [`execute`] over a
//! synchronous [`TransactionController`], and [`execute_async`] over an
//! asynchronous [`TransactionContext`].

mod interceptor;
mod interceptor_async;

pub use interceptor::{FinalizeFn, execute};
pub use interceptor_async::{AsyncFinalizeFn, execute_async};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::message::Message;
use crate::trace::TraceInfo;

/// Default detail attached to a failure the action let escape.
pub const UNHANDLED_ERROR_INFO: &str = "unhandled error";
/// Default detail attached to a rollback failure.
pub const ROLLBACK_ERROR_INFO: &str = "transaction rollback failed";
/// Default detail attached to a finalize-callback failure.
pub const FINALIZE_ERROR_INFO: &str = "finalize callback failed";
/// Default detail attached to a dispose failure.
pub const DISPOSE_ERROR_INFO: &str = "transaction dispose failed";

/// State of the transaction as scheduled by the unit of work.
///
/// Owned by the controller/context; the wrappers only read it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionResult {
    /// Nothing scheduled; the unit of work did not touch the transaction.
    #[default]
    None,
    /// The unit of work asked for a commit.
    Commit,
    /// Rollback has been scheduled.
    Rollback,
}

/// Contract violation by the action implementation. Always surfaced as the
/// wrapper's `Err`, never as an accumulated error message: it signals a
/// programming error, not a business failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransactionFault {
    #[error("read-only execution finished with transaction state {state:?}")]
    ReadOnlyStateMutated { state: TransactionResult },
}

/// Options for one wrapper invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExecuteOptions {
    /// Declares that the action must not touch the transaction. Any
    /// non-`None` state after the action is a [`TransactionFault`].
    #[serde(default)]
    pub read_only: bool,

    /// Overrides the default detail strings attached to captured
    /// infrastructure failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unhandled_error_detail: Option<String>,

    /// Whether the wrapper disposes the controller/context when done
    /// (default: true).
    #[serde(default = "default_dispose")]
    pub dispose: bool,
}

fn default_dispose() -> bool {
    true
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            read_only: false,
            unhandled_error_detail: None,
            dispose: true,
        }
    }
}

impl ExecuteOptions {
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }
}

/// Synchronous transaction collaborator: scheduling state plus the
/// commit/rollback/dispose primitives, behind interior mutability.
pub trait TransactionController {
    fn transaction_result(&self) -> TransactionResult;

    /// Schedule a rollback. Idempotent; the wrapper calls it at most once
    /// per invocation.
    fn schedule_rollback(&self, reason: Option<&str>);

    /// Diagnostic attached by whoever scheduled the rollback, folded into
    /// the detail of rollback-failure messages.
    fn rollback_error_info(&self) -> Option<String>;

    fn commit(&self) -> anyhow::Result<()>;

    /// Best-effort rollback; must be safe to call when already rolled back.
    fn try_rollback(&self, cause: Option<&anyhow::Error>) -> anyhow::Result<()>;

    fn dispose(&self) -> anyhow::Result<()>;
}

/// Asynchronous transaction collaborator. Same surface as
/// [`TransactionController`] with awaited primitives and cooperative
/// cancellation threaded through the transactional calls.
#[async_trait]
pub trait TransactionContext: Send + Sync {
    fn transaction_result(&self) -> TransactionResult;

    fn schedule_rollback(&self, reason: Option<&str>);

    fn rollback_error_info(&self) -> Option<String>;

    async fn commit(&self, cancel: &CancellationToken) -> anyhow::Result<()>;

    async fn try_rollback(
        &self,
        cause: Option<&anyhow::Error>,
        cancel: &CancellationToken,
    ) -> anyhow::Result<()>;

    async fn dispose(&self) -> anyhow::Result<()>;
}

/// Reporting hook turning a captured failure into an error message. May
/// itself fail; the wrappers then fall back to a pair of internally built
/// messages so no failure is ever lost.
pub trait ErrorReporter {
    fn on_error(
        &self,
        trace: &TraceInfo,
        source: Option<&anyhow::Error>,
        detail: Option<&str>,
    ) -> anyhow::Result<Arc<Message>>;
}

/// Asynchronous flavor of [`ErrorReporter`].
#[async_trait]
pub trait AsyncErrorReporter: Send + Sync {
    async fn on_error(
        &self,
        trace: &TraceInfo,
        source: Option<&anyhow::Error>,
        detail: Option<&str>,
    ) -> anyhow::Result<Arc<Message>>;
}

/// Resolve the effective detail: a non-blank configured override wins over
/// the context default.
pub(crate) fn resolve_detail<'a>(configured: Option<&'a str>, default: &'a str) -> &'a str {
    match configured {
        Some(detail) if !detail.trim().is_empty() => detail,
        _ => default,
    }
}

/// Detail for a rollback failure in the cleanup phase, folding in the
/// controller's rollback diagnostic when one is present.
pub(crate) fn compose_rollback_detail(
    configured: Option<&str>,
    rollback_error_info: Option<&str>,
) -> String {
    match rollback_error_info {
        Some(info) if !info.trim().is_empty() => {
            let prefix = match configured {
                Some(detail) if !detail.trim().is_empty() => format!("{detail} "),
                _ => String::new(),
            };
            format!("{prefix}{info} {ROLLBACK_ERROR_INFO}")
        }
        _ => resolve_detail(configured, ROLLBACK_ERROR_INFO).to_string(),
    }
}
