//! Synchronous, controller-based execution wrapper.

use anyhow::Error;
use tracing::{debug, error, warn};

use crate::outcome::{Outcome, OutcomeBuilder};
use crate::trace::TraceInfo;
use crate::transaction::{
    DISPOSE_ERROR_INFO, ErrorReporter, ExecuteOptions, FINALIZE_ERROR_INFO, ROLLBACK_ERROR_INFO,
    TransactionController, TransactionFault, TransactionResult, UNHANDLED_ERROR_INFO,
    compose_rollback_detail, resolve_detail,
};

/// Caller-supplied cleanup callback, invoked once in the cleanup phase.
pub type FinalizeFn = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

/// Run one unit of work against a transaction controller.
///
/// The action's outcome is merged into a fresh accumulator (`merge_all`);
/// the rollback decision uses the merged outcome's
/// `has_transaction_rollback_error` — an error flagged with
/// `disable_transaction_rollback` is returned to the caller without forcing
/// a rollback. Every failure raised by the action or by the
/// commit/rollback/finalize/dispose collaborator calls is captured as an
/// error message on the same outcome; if `on_error` itself fails, a fallback
/// pair of internally built messages records both the reporting failure and
/// the original one.
///
/// The only `Err` is the read-only contract violation: a `read_only`
/// invocation whose action left the transaction state non-`None`. The
/// cleanup phase (pending rollback, `finalize`, dispose) still runs before
/// the fault is surfaced.
pub fn execute<T, C, A>(
    options: &ExecuteOptions,
    trace: &TraceInfo,
    controller: &C,
    action: A,
    on_error: &dyn ErrorReporter,
    finalize: Option<FinalizeFn>,
) -> Result<Outcome<T>, TransactionFault>
where
    T: Clone,
    C: TransactionController + ?Sized,
    A: FnOnce(&TraceInfo, &C) -> anyhow::Result<Outcome<T>>,
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

    match action(&trace, controller) {
        Ok(action_outcome) => {
            builder.merge_all(&action_outcome);

            let state = controller.transaction_result();
            if options.read_only && state != TransactionResult::None {
                fault = Some(TransactionFault::ReadOnlyStateMutated { state });
            } else if builder.has_transaction_rollback_error() {
                if state != TransactionResult::Rollback {
                    warn!(correlation_id = ?trace.correlation_id, "scheduling rollback for failed outcome");
                    controller.schedule_rollback(None);
                }
            } else if state == TransactionResult::Commit {
                if let Err(commit_err) = controller.commit() {
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
        report(&builder, on_error, &trace, &failure, detail, detail);

        let state = controller.transaction_result();
        if options.read_only && state != TransactionResult::None {
            fault = Some(TransactionFault::ReadOnlyStateMutated { state });
        } else if let Err(rollback_err) = controller.try_rollback(Some(&failure)) {
            report(
                &builder,
                on_error,
                &trace,
                &rollback_err,
                resolve_detail(configured, ROLLBACK_ERROR_INFO),
                resolve_detail(configured, UNHANDLED_ERROR_INFO),
            );
        }
    }

    // cleanup phase; runs on every path, a pending fault included
    if controller.transaction_result() == TransactionResult::Rollback {
        if let Err(rollback_err) = controller.try_rollback(None) {
            let detail =
                compose_rollback_detail(configured, controller.rollback_error_info().as_deref());
            report(
                &builder,
                on_error,
                &trace,
                &rollback_err,
                &detail,
                resolve_detail(configured, UNHANDLED_ERROR_INFO),
            );
        }
    }

    if let Some(finalize) = finalize {
        if let Err(finalize_err) = finalize() {
            report(
                &builder,
                on_error,
                &trace,
                &finalize_err,
                resolve_detail(configured, FINALIZE_ERROR_INFO),
                resolve_detail(configured, UNHANDLED_ERROR_INFO),
            );
        }
    }

    if options.dispose {
        if let Err(dispose_err) = controller.dispose() {
            report(
                &builder,
                on_error,
                &trace,
                &dispose_err,
                resolve_detail(configured, DISPOSE_ERROR_INFO),
                resolve_detail(configured, UNHANDLED_ERROR_INFO),
            );
        }
    }

    match fault {
        Some(fault) => Err(fault),
        None => Ok(builder.build()),
    }
}

/// Report `failure` through the hook; on hook failure, append the fallback
/// pair (reporting failure first, original failure second).
fn report<T>(
    builder: &OutcomeBuilder<T>,
    on_error: &dyn ErrorReporter,
    trace: &TraceInfo,
    failure: &Error,
    detail: &str,
    fallback_detail: &str,
) {
    match on_error.on_error(trace, Some(failure), Some(detail)) {
        Ok(message) => {
            builder.with_error(message);
        }
        Err(report_err) => {
            builder.invalid_operation(trace, fallback_detail, Some(&report_err));
            builder.invalid_operation(trace, detail, Some(failure));
        }
    }
}
