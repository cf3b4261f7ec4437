//! # Transition Observers
//!
//! Hooks notified around every transition invocation on a manager. The
//! manager itself returns errors without logging them; observers are how a
//! host application records attempts, successes and failures.
//!
//! [`TracingObserver`] emits `tracing` events with structured fields and is
//! the usual choice.

use coast_core::StateValue;

use crate::error::TransitionError;
use crate::transition::TransitionRecord;

/// Receives transition lifecycle notifications. All hooks default to no-ops.
pub trait TransitionObserver<E, V>: Send + Sync {
    /// The transition was rejected before any mutation
    /// (`NotPermitted` or `GuardRejected`).
    fn rejected(&self, _manager: &str, _entity: &E, _error: &TransitionError) {}

    /// Validation passed; the state value is about to change.
    fn before(&self, _manager: &str, _entity: &E, _transition: &str) {}

    /// The state value changed and the callback, if any, succeeded.
    fn after(&self, _manager: &str, _entity: &E, _record: &TransitionRecord<V>) {}

    /// The callback failed after the state value changed.
    fn failed(&self, _manager: &str, _entity: &E, _transition: &str, _error: &anyhow::Error) {}
}

/// Logs transitions through `tracing`.
///
/// Rejections at `debug`, completions at `info`, callback failures at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl<E, V: StateValue> TransitionObserver<E, V> for TracingObserver {
    fn rejected(&self, manager: &str, _entity: &E, error: &TransitionError) {
        tracing::debug!(
            manager,
            transition = error.transition(),
            error = %error,
            "transition rejected"
        );
    }

    fn before(&self, manager: &str, _entity: &E, transition: &str) {
        tracing::trace!(manager, transition, "transition starting");
    }

    fn after(&self, manager: &str, _entity: &E, record: &TransitionRecord<V>) {
        tracing::info!(
            manager,
            transition = %record.transition,
            from = ?record.from,
            to = ?record.to,
            "transition completed"
        );
    }

    fn failed(&self, manager: &str, _entity: &E, transition: &str, error: &anyhow::Error) {
        tracing::warn!(
            manager,
            transition,
            error = %error,
            "transition callback failed"
        );
    }
}
