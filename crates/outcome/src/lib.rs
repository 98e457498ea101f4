//! Structured operation outcomes for service boundaries.
//!
//! Instead of letting failures propagate as raw errors, services return an
//! [`Outcome`]: an inspectable accumulator of success/warning/error
//! [`Message`]s plus an optional typed payload. Sub-operation outcomes are
//! merged, never re-thrown, so the caller always sees the complete picture —
//! including failures that happened purely during transactional cleanup.
//!
//! The pieces:
//!
//! - [`Outcome`] / [`OutcomeBuilder`] — the accumulator and its fluent
//!   merge algebra.
//! - [`Message`] / [`MessageBuilder`] — immutable, trace-correlated
//!   diagnostic entries, shared by reference between merged outcomes.
//! - [`OutcomeError`] — the narrow bridge back to `?`-style control flow.
//! - [`transaction`] — wrappers that run one unit of work against a
//!   transaction collaborator and decide commit vs. rollback from the merged
//!   outcome.
//! - [`validation`] — ingestion of validation-failure reports.
//! - [`logging`] — best-effort message sinks on top of `tracing`.
//!
//! # Example
//!
//! ```
//! use outcome::{Outcome, OutcomeBuilder, TraceInfo};
//!
//! let trace = TraceInfo::new("billing");
//!
//! let charge: Outcome<u64> = Outcome::from_data(42);
//! let builder = OutcomeBuilder::<u64>::new();
//! builder
//!     .success_with(&trace, |m| m.internal_message("charge accepted"))
//!     .merge_all_with_data(&charge);
//!
//! let outcome = builder.build();
//! assert!(!outcome.has_error());
//! assert_eq!(outcome.data(), Some(42));
//! outcome.fail_on_error()?;
//! # Ok::<(), outcome::OutcomeError>(())
//! ```

pub mod logging;
pub mod message;
pub mod outcome;
pub mod trace;
pub mod transaction;
pub mod validation;

pub use message::{Message, MessageBuilder, MessageCode, Severity};
pub use outcome::{Outcome, OutcomeBuilder, OutcomeError};
pub use trace::{MethodScope, TraceFrame, TraceInfo, TraceSource};
pub use transaction::{ExecuteOptions, TransactionFault, TransactionResult};
