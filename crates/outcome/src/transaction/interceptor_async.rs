//! Asynchronous, context-based execution wrapper.
//!
//! Identical control-flow shape to the synchronous wrapper; the only
//! difference is that each collaborator call is awaited and the cancellation
//! token is threaded through the action and the transactional calls.

use std::future::Future;
use std::sync::Arc;

use anyhow::Error;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::outcome::{Outcome, OutcomeBuilder};
use crate::trace::TraceInfo;
use crate::transaction::{
    AsyncErrorReporter, DISPOSE_ERROR_INFO, ExecuteOptions, FINALIZE_ERROR_INFO,
    ROLLBACK_ERROR_INFO, TransactionContext, TransactionFault, TransactionResult,
    UNHANDLED_ERROR_INFO, compose_rollback_detail, resolve_detail,
};

/// Caller-supplied asynchronous cleanup callback.
pub type AsyncFinalizeFn = Box<dyn FnOnce() -> BoxFuture<'static, anyhow::Result<()>> + Send>;

/// Asynchronous flavor of [`execute`](crate::transaction::execute).
///
/// Semantics are identical: `merge_all` of the action outcome, rollback
/// decision on the merged `has_transaction_rollback_error`, every
/// infrastructure failure captured into the outcome with the on_error /
/// fallback-pair pattern, read-only violations surfaced as the only `Err`
/// after the cleanup phase has run. Cancellation is cooperative: the token
/// is handed to the action and to the transactional context calls, and a
/// cancelled action surfaces as an ordinary captured failure.
pub async fn execute_async<T, C, A, Fut>(
    options: &ExecuteOptions,
    trace: &TraceInfo,
    context: Arc<C>,
    action: A,
    on_error: &dyn AsyncErrorReporter,
    finalize: Option<AsyncFinalizeFn>,
    cancel: CancellationToken,
) -> Result<Outcome<T>, TransactionFault>
where
    T: Clone,
    C: TransactionContext + ?Sized,
    A: FnOnce(TraceInfo, Arc<C>, CancellationToken) -> Fut + Send,
    Fut: Future<Output = anyhow::Result<Outcome<T>>> + Send,
{
    let trace = trace.derived();
    let builder = OutcomeBuilder::<T>::new();
    let configured = options.unhandled_error_detail.as_deref();
    let mut fault: Option<TransactionFault> = None;
    let mut caught: Option<Error> = None;

    debug!(
        read_only = options.read_only,
        correlation_id = ?trace.correlation_id,
        "starting transactional execution"
    );

    match action(trace.clone(), Arc::clone(&context), cancel.clone()).await {
        Ok(action_outcome) => {
            builder.merge_all(&action_outcome);

            let state = context.transaction_result();
            if options.read_only && state != TransactionResult::None {
                fault = Some(TransactionFault::ReadOnlyStateMutated { state });
            } else if builder.has_transaction_rollback_error() {
                if state != TransactionResult::Rollback {
                    warn!(correlation_id = ?trace.correlation_id, "scheduling rollback for failed outcome");
                    context.schedule_rollback(None);
                }
            } else if state == TransactionResult::Commit {
                if let Err(commit_err) = context.commit(&cancel).await {
                    caught = Some(commit_err);
                }
            }

            if caught.is_none() && fault.is_none() && action_outcome.data_was_set() {
                builder.with_data(action_outcome.data());
            }
        }
        Err(action_err) => caught = Some(action_err),
    }

    if let Some(failure) = caught {
        error!(
            error = %failure,
            correlation_id = ?trace.correlation_id,
            "transactional execution failed"
        );
        let detail = resolve_detail(configured, UNHANDLED_ERROR_INFO);
        report(&builder, on_error, &trace, &failure, detail, detail).await;

        let state = context.transaction_result();
        if options.read_only && state != TransactionResult::None {
            fault = Some(TransactionFault::ReadOnlyStateMutated { state });
        } else if let Err(rollback_err) = context.try_rollback(Some(&failure), &cancel).await {
            report(
                &builder,
                on_error,
                &trace,
                &rollback_err,
                resolve_detail(configured, ROLLBACK_ERROR_INFO),
                resolve_detail(configured, UNHANDLED_ERROR_INFO),
            )
            .await;
        }
    }

    // cleanup phase; runs on every path, a pending fault included
    if context.transaction_result() == TransactionResult::Rollback {
        if let Err(rollback_err) = context.try_rollback(None, &cancel).await {
            let detail =
                compose_rollback_detail(configured, context.rollback_error_info().as_deref());
            report(
                &builder,
                on_error,
                &trace,
                &rollback_err,
                &detail,
                resolve_detail(configured, UNHANDLED_ERROR_INFO),
            )
            .await;
        }
    }

    if let Some(finalize) = finalize {
        if let Err(finalize_err) = finalize().await {
            report(
                &builder,
                on_error,
                &trace,
                &finalize_err,
                resolve_detail(configured, FINALIZE_ERROR_INFO),
                resolve_detail(configured, UNHANDLED_ERROR_INFO),
            )
            .await;
        }
    }

    if options.dispose {
        if let Err(dispose_err) = context.dispose().await {
            report(
                &builder,
                on_error,
                &trace,
                &dispose_err,
                resolve_detail(configured, DISPOSE_ERROR_INFO),
                resolve_detail(configured, UNHANDLED_ERROR_INFO),
            )
            .await;
        }
    }

    match fault {
        Some(fault) => Err(fault),
        None => Ok(builder.build()),
    }
}

/// Report `failure` through the hook; on hook failure, append the fallback
/// pair (reporting failure first, original failure second).
async fn report<T>(
    builder: &OutcomeBuilder<T>,
    on_error: &dyn AsyncErrorReporter,
    trace: &TraceInfo,
    failure: &Error,
    detail: &str,
    fallback_detail: &str,
) {
    match on_error.on_error(trace, Some(failure), Some(detail)).await {
        Ok(message) => {
            builder.with_error(message);
        }
        Err(report_err) => {
            builder.invalid_operation(trace, fallback_detail, Some(&report_err));
            builder.invalid_operation(trace, detail, Some(failure));
        }
    }
}
