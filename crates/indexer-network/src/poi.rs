// SPDX-License-Identifier: Apache-2.0
//! POI resolution (`spec.md` §4.4): four-step algorithm reconciling a
//! user-supplied proof of indexing against the node's own computation.

use crate::DeploymentNodeClient;
use indexer_common::{Allocation, IndexerError};

/// Resolve the POI to use when closing `allocation`.
///
/// 1. If the caller supplied a POI and `force`, return it unchanged.
/// 2. Otherwise compute the canonical POI at the allocation's
///    `closedAtEpoch` start block.
/// 3. If the caller also supplied a POI, it must match; disagreement is
///    fatal for this action.
/// 4. If neither a computed nor a supplied POI is available, fail with
///    `"no-POI"`.
pub async fn resolve(
    node: &dyn DeploymentNodeClient,
    allocation: &Allocation,
    user_poi: Option<&str>,
    force: bool,
) -> Result<String, IndexerError> {
    if let (Some(poi), true) = (user_poi, force) {
        return Ok(poi.to_owned());
    }

    let closed_at_epoch = allocation.closed_at_epoch.unwrap_or(allocation.created_at_epoch);
    let computed = node
        .resolve_poi_at_block(&allocation.subgraph_deployment, closed_at_epoch)
        .await?;

    match (computed, user_poi) {
        (Some(computed), Some(user)) if computed == user => Ok(computed),
        (Some(computed), Some(user)) => Err(IndexerError::Execution(format!(
            "supplied POI '{user}' disagrees with the computed POI '{computed}' for allocation \
             '{}'",
            allocation.id
        ))),
        (Some(computed), None) => Ok(computed),
        (None, Some(user)) => Ok(user.to_owned()),
        (None, None) => Err(IndexerError::Execution(format!(
            "no-POI: unable to resolve a proof of indexing for allocation '{}'",
            allocation.id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use indexer_common::{AllocationId, AllocationStatus, DeploymentId, Grt, NetworkIdentifier};
    use std::sync::Mutex;

    struct FakeNode {
        computed: Mutex<Option<String>>,
    }

    #[async_trait]
    impl DeploymentNodeClient for FakeNode {
        async fn ensure_deployed(&self, _deployment: &DeploymentId) -> Result<(), IndexerError> {
            Ok(())
        }

        async fn reassign(&self, _deployment: &DeploymentId, _node_id: &str) -> Result<(), IndexerError> {
            Ok(())
        }

        async fn pause(&self, _deployment: &DeploymentId) -> Result<(), IndexerError> {
            Ok(())
        }

        async fn resolve_poi_at_block(
            &self,
            _deployment: &DeploymentId,
            _block_number: u64,
        ) -> Result<Option<String>, IndexerError> {
            Ok(self
                .computed
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone())
        }
    }

    fn allocation() -> Allocation {
        Allocation {
            id: AllocationId::from("0xalloc"),
            status: AllocationStatus::Closed,
            subgraph_deployment: DeploymentId::from("Qmfoo"),
            indexer: "0xindexer".to_owned(),
            allocated_tokens: Grt(1_000),
            created_at_epoch: 10,
            closed_at_epoch: Some(20),
            poi: None,
            protocol_network: NetworkIdentifier::new("eip155:1"),
        }
    }

    #[tokio::test]
    async fn force_returns_user_poi_unchanged() {
        let node = FakeNode { computed: Mutex::new(Some("0xcomputed".to_owned())) };
        let result = resolve(&node, &allocation(), Some("0xuser"), true).await;
        assert_eq!(result.as_deref(), Ok("0xuser"));
    }

    #[tokio::test]
    async fn disagreement_between_user_and_computed_is_fatal() {
        let node = FakeNode { computed: Mutex::new(Some("0xcomputed".to_owned())) };
        let result = resolve(&node, &allocation(), Some("0xuser"), false).await;
        assert!(matches!(result, Err(IndexerError::Execution(_))));
    }

    #[tokio::test]
    async fn no_poi_anywhere_fails_with_no_poi_code() {
        let node = FakeNode { computed: Mutex::new(None) };
        let result = resolve(&node, &allocation(), None, false).await;
        let message = result.map_or_else(|e| e.to_string(), |ok| ok);
        assert!(message.contains("no-POI"));
    }

    #[tokio::test]
    async fn computed_alone_is_used() {
        let node = FakeNode { computed: Mutex::new(Some("0xcomputed".to_owned())) };
        let result = resolve(&node, &allocation(), None, false).await;
        assert_eq!(result.as_deref(), Ok("0xcomputed"));
    }
}
