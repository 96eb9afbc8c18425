//! Status conditions
//!
//! Conditions are the user-facing surface of reconciliation health. They are
//! keyed by type: setting a condition with the same type replaces the stored
//! entry only if status, reason or message differ, and the transition time
//! is refreshed only when the status value actually flips.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition type reporting overall reconciliation health
pub const READY_CONDITION: &str = "Ready";

/// Condition type reporting the binding to the upstream cluster
pub const CLUSTER_REFERENCE_CONDITION: &str = "ClusterReference";

/// Condition type reporting the integrity of remote-assigned identifiers
pub const IDENTIFIERS_CONDITION: &str = "IdentifiersConsistent";

/// Truth value of a condition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum ConditionStatus {
    /// The condition holds
    True,

    /// The condition does not hold
    False,

    /// The controller cannot determine whether the condition holds
    #[default]
    Unknown,
}

/// A typed, timestamped status entry describing one aspect of reconciliation
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type, unique within a condition list (e.g. "Ready")
    #[serde(rename = "type")]
    pub type_: String,

    /// Truth value
    pub status: ConditionStatus,

    /// Machine-readable, CamelCase reason for the last transition
    pub reason: String,

    /// Human-readable detail for the last transition
    pub message: String,

    /// When the status value last changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl Condition {
    /// Create a condition stamped with the current time
    pub fn new(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: Some(Utc::now()),
        }
    }
}

/// Merge a condition into a condition list, keyed by type.
///
/// Returns `true` if the list changed. A re-set with identical
/// status/reason/message is a no-op and preserves the stored entry,
/// including its transition time. When only reason or message change the
/// stored transition time is kept; the timestamp moves only on an actual
/// status flip.
pub fn set_condition(conditions: &mut Vec<Condition>, mut candidate: Condition) -> bool {
    match conditions.iter_mut().find(|c| c.type_ == candidate.type_) {
        None => {
            if candidate.last_transition_time.is_none() {
                candidate.last_transition_time = Some(Utc::now());
            }
            conditions.push(candidate);
            true
        }
        Some(existing) => {
            if existing.status == candidate.status
                && existing.reason == candidate.reason
                && existing.message == candidate.message
            {
                return false;
            }

            if existing.status == candidate.status {
                // No status flip: keep the original transition time
                candidate.last_transition_time = existing.last_transition_time;
            } else if candidate.last_transition_time.is_none() {
                candidate.last_transition_time = Some(Utc::now());
            }

            *existing = candidate;
            true
        }
    }
}

/// Find a condition by type
pub fn find_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

/// Returns whether the condition of the given type is present and True
pub fn is_condition_true(conditions: &[Condition], type_: &str) -> bool {
    find_condition(conditions, type_).is_some_and(|c| c.status == ConditionStatus::True)
}
