//! The outcome accumulator: ordered message lists plus an optional payload.
//!
//! An [`Outcome`] is a shared handle over one operation's accumulated state.
//! Cloning the handle (including [`OutcomeBuilder::build`]) never snapshots:
//! every handle observes later mutations made through the owning builder.
//! That same-instance behavior is load-bearing for callers that keep a handle
//! while the builder keeps accumulating, and is covered by tests.
//!
//! Outcomes carry no thread-safety guarantees beyond the lock that implements
//! the shared handle; concurrent writers must be serialized by the caller.

mod builder;
#[cfg(test)]
mod builder_tests;
mod dto;
mod error;

pub use builder::OutcomeBuilder;
pub use dto::{MessageDto, OutcomeDto, outcome_from_json};
pub use error::{OutcomeError, to_error_logged};

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use crate::message::Message;

pub(crate) struct OutcomeState<T> {
    pub(crate) success: Vec<Arc<Message>>,
    pub(crate) warnings: Vec<Arc<Message>>,
    pub(crate) errors: Vec<Arc<Message>>,
    pub(crate) data: Option<T>,
    pub(crate) data_was_set: bool,
    pub(crate) affected_entities: Option<u64>,
}

impl<T> Default for OutcomeState<T> {
    fn default() -> Self {
        Self {
            success: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            data: None,
            data_was_set: false,
            affected_entities: None,
        }
    }
}

/// Accumulated outcome of one operation: ordered success/warning/error
/// message lists plus an optional typed payload.
///
/// `Outcome<()>` (the default) is the plain variant; `Outcome<T>` carries a
/// payload with the `data_was_set` marker distinguishing "never set" from
/// "explicitly set to empty".
pub struct Outcome<T = ()> {
    state: Arc<RwLock<OutcomeState<T>>>,
}

impl<T> Clone for Outcome<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Default for Outcome<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> Outcome<T> {
    /// An outcome with no messages and no payload.
    pub fn empty() -> Self {
        Self {
            state: Arc::new(RwLock::new(OutcomeState::default())),
        }
    }

    /// An outcome carrying only a payload (`data_was_set` is true).
    pub fn from_data(data: T) -> Self {
        let outcome = Self::empty();
        {
            let mut state = outcome.state.write();
            state.data = Some(data);
            state.data_was_set = true;
        }
        outcome
    }

    /// A builder over this same instance; mutations through the builder are
    /// visible through this handle. The explicit replacement for implicit
    /// outcome/builder conversions.
    pub fn to_builder(&self) -> OutcomeBuilder<T> {
        OutcomeBuilder::from_outcome(self.clone())
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, OutcomeState<T>> {
        self.state.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, OutcomeState<T>> {
        self.state.write()
    }

    /// Whether two handles share the same underlying state.
    pub fn shares_state_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    pub fn has_success(&self) -> bool {
        !self.read().success.is_empty()
    }

    pub fn has_warning(&self) -> bool {
        !self.read().warnings.is_empty()
    }

    pub fn has_error(&self) -> bool {
        !self.read().errors.is_empty()
    }

    pub fn has_any_message(&self) -> bool {
        let state = self.read();
        !state.success.is_empty() || !state.warnings.is_empty() || !state.errors.is_empty()
    }

    /// Whether any error message forces a transactional rollback.
    ///
    /// Distinct from [`has_error`](Self::has_error): an error flagged with
    /// `disable_transaction_rollback` is reported to the caller but does not
    /// count here.
    pub fn has_transaction_rollback_error(&self) -> bool {
        self.read()
            .errors
            .iter()
            .any(|m| !m.disable_transaction_rollback())
    }

    /// Snapshot of the success list (cheap `Arc` clones, insertion order).
    pub fn success_messages(&self) -> Vec<Arc<Message>> {
        self.read().success.clone()
    }

    pub fn warning_messages(&self) -> Vec<Arc<Message>> {
        self.read().warnings.clone()
    }

    pub fn error_messages(&self) -> Vec<Arc<Message>> {
        self.read().errors.clone()
    }

    /// True once the payload has been assigned, even to `None`.
    pub fn data_was_set(&self) -> bool {
        self.read().data_was_set
    }

    pub fn affected_entities(&self) -> Option<u64> {
        self.read().affected_entities
    }
}

impl<T: Clone> Outcome<T> {
    pub fn data(&self) -> Option<T> {
        self.read().data.clone()
    }
}

impl<T> fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("Outcome")
            .field("success", &state.success.len())
            .field("warnings", &state.warnings.len())
            .field("errors", &state.errors.len())
            .field("data_was_set", &state.data_was_set)
            .field("affected_entities", &state.affected_entities)
            .finish()
    }
}

/// The wire format is read-only: outcomes deserialize from their JSON
/// representation but refuse to serialize, so the unsupported direction
/// fails loudly instead of writing an empty object.
impl<T> Serialize for Outcome<T> {
    fn serialize<S>(&self, _serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Err(serde::ser::Error::custom(
            "outcome serialization is not supported; the JSON representation is read-only",
        ))
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Outcome<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(OutcomeDto::<T>::deserialize(deserializer)?.into())
    }
}
