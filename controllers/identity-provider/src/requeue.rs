//! Requeue / outcome classification.
//!
//! Maps pipeline outcomes and classified errors into the scheduling decision
//! handed back to the watch substrate.

use kube_runtime::controller::Action;
use std::time::Duration;

use crate::error::{ControllerError, ErrorClass};
use crate::triggers::Trigger;

/// Default periodic resync interval. Drift between the remote object and
/// the declared spec is corrected on this cadence even without a new event.
pub const DEFAULT_REQUEUE: Duration = Duration::from_secs(30);

/// Scheduling decision for a pipeline that ran to completion.
///
/// Create/Update completions resync periodically; a completed Delete needs
/// no further attention (the resource is released to garbage collection).
pub fn on_done(trigger: Trigger, interval: Duration) -> Action {
    match trigger {
        Trigger::Create | Trigger::Update => Action::requeue(interval),
        Trigger::Delete => Action::await_change(),
    }
}

/// Scheduling decision for a phase-requested requeue. Not an error.
pub fn on_requeue(delay: Duration) -> Action {
    Action::requeue(delay)
}

/// Scheduling decision for a failed reconcile, by error class.
///
/// * Internal defects are not retried automatically; they need a code fix.
/// * Configuration errors requeue on the bounded default interval so a
///   later correction (e.g. the secret being created) is picked up.
/// * Transient errors retry on the caller-supplied backoff delay.
/// * Permanent remote rejections retry at the normal periodic interval;
///   tight backoff buys nothing when the cause needs external correction.
pub fn on_error(error: &ControllerError, interval: Duration, backoff: Duration) -> Action {
    match error.classify() {
        ErrorClass::Internal => Action::await_change(),
        ErrorClass::Configuration => Action::requeue(DEFAULT_REQUEUE),
        ErrorClass::Transient => Action::requeue(backoff),
        ErrorClass::Permanent => Action::requeue(interval),
    }
}
