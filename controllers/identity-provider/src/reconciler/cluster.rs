//! Upstream cluster resolution phase.
//!
//! Resolves the cluster association key to the OCM-internal cluster ID and
//! binds it into status. The stored cluster ID is immutable once set: a
//! lookup that later returns a different-but-valid cluster never overwrites
//! it, it raises a condition and reconciliation continues against the
//! stored binding.

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use crate::error::ControllerError;
use crate::phases::{PhaseOutcome, PhaseResult};
use crate::request::IdentityProviderRequest;
use crate::triggers::Trigger;
use crds::{
    CLUSTER_REFERENCE_CONDITION, Condition, ConditionStatus, Workload, set_condition,
};
use ocm_client::{Cluster, OcmClientTrait};

/// Resolve the association key to a cluster, gating Create triggers on
/// cluster readiness.
pub(crate) async fn resolve_cluster(
    ocm: &dyn OcmClientTrait,
    key: &str,
    trigger: Trigger,
) -> Result<Cluster, ControllerError> {
    if uuid::Uuid::parse_str(key).is_err() {
        return Err(ControllerError::MalformedClusterKey(key.to_string()));
    }

    let cluster = ocm
        .get_cluster_by_key(key)
        .await?
        .ok_or_else(|| ControllerError::ClusterNotFound(key.to_string()))?;

    // New identity providers may only be attached to a ready cluster;
    // an existing binding keeps converging through upgrades and the like.
    if trigger == Trigger::Create && !cluster.is_ready() {
        return Err(ControllerError::ClusterNotReady {
            name: key.to_string(),
            state: format!("{:?}", cluster.state).to_lowercase(),
        });
    }

    Ok(cluster)
}

/// Bind the resolved cluster ID into status under the immutability guard.
///
/// Returns the condition reflecting the binding: a conflict with an
/// already-stored ID keeps the stored value and reports
/// `ClusterReference=False/ClusterIDConflict`.
pub(crate) fn bind_cluster(object: &mut crds::GitLabIdentityProvider, cluster: &Cluster) -> Condition {
    let stored = object.get_cluster_id().to_string();

    if stored.is_empty() {
        object
            .status
            .get_or_insert_with(Default::default)
            .cluster_id = cluster.id.clone();
        Condition::new(
            CLUSTER_REFERENCE_CONDITION,
            ConditionStatus::True,
            "ClusterResolved",
            format!("bound to cluster {}", cluster.id),
        )
    } else if stored != cluster.id {
        Condition::new(
            CLUSTER_REFERENCE_CONDITION,
            ConditionStatus::False,
            "ClusterIDConflict",
            format!(
                "cluster lookup returned {} but status is bound to {}; keeping the stored binding",
                cluster.id, stored
            ),
        )
    } else {
        Condition::new(
            CLUSTER_REFERENCE_CONDITION,
            ConditionStatus::True,
            "ClusterResolved",
            format!("bound to cluster {stored}"),
        )
    }
}

/// HandleUpstreamCluster phase
pub fn handle_upstream_cluster(req: &mut IdentityProviderRequest) -> BoxFuture<'_, PhaseResult> {
    async move {
        let key = req.object.get_cluster_name().to_string();
        let cluster = resolve_cluster(req.context.ocm.as_ref(), &key, req.trigger).await?;
        debug!(
            "Resolved cluster key {} to cluster {} for {}",
            key,
            cluster.id,
            req.resource_key()
        );

        let condition = bind_cluster(&mut req.object, &cluster);
        if condition.status == ConditionStatus::False {
            warn!(
                "Cluster binding conflict for {}: {}",
                req.resource_key(),
                condition.message
            );
        }

        let mut conditions = req.object.get_conditions().to_vec();
        set_condition(&mut conditions, condition);
        req.object.set_conditions(conditions);

        // Persist the binding before any provider-side effect so a partial
        // failure downstream still finds the cluster ID on the next run.
        if req.persist_status().await? {
            info!(
                "Recorded cluster binding {} for {}",
                req.object.get_cluster_id(),
                req.resource_key()
            );
        }

        req.cluster = Some(cluster);
        Ok(PhaseOutcome::Continue)
    }
    .boxed()
}
