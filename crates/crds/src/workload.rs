//! Workload capability trait
//!
//! Capabilities every reconcilable OCM workload resource must expose to the
//! generic reconciliation machinery. Keeping the pipeline generic over this
//! trait means a controller can never be dispatched a resource kind it does
//! not understand.

use crate::conditions::Condition;

/// Capabilities of a resource reconciled against an upstream OCM cluster
pub trait Workload {
    /// The cluster association key from the spec (the OCM external cluster ID)
    fn get_cluster_name(&self) -> &str;

    /// The resolved cluster ID from status; empty until first resolved
    fn get_cluster_id(&self) -> &str;

    /// Current status conditions
    fn get_conditions(&self) -> &[Condition];

    /// Replace the status conditions
    fn set_conditions(&mut self, conditions: Vec<Condition>);
}
