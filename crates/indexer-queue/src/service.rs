// SPDX-License-Identifier: Apache-2.0
//! The queue's public contract (`spec.md` §4.5): `queue`, `approve`,
//! `cancel`, `delete`, `fetch`.

use crate::throttle::recently_executed;
use chrono::{Duration, Utc};
use indexer_common::{
    Action, ActionStatus, ActionType, AllocationStatus, IndexerError,
};
use indexer_network::NetworkMonitor;
use indexer_store::{ActionColumn, ActionFilter, OrderDirection, Store};

/// Wraps a [`Store`] and a [`NetworkMonitor`] with the validation,
/// uniqueness, and throttling rules the queue's public contract requires.
pub struct QueueService<S> {
    store: S,
    network: NetworkMonitor,
    throttle_window: Duration,
}

impl<S> QueueService<S> {
    /// Construct a queue service. `throttle_window` is the "recently
    /// executed" lookback (`spec.md` §4.5, design note 9).
    pub fn new(store: S, network: NetworkMonitor, throttle_window: Duration) -> Self {
        Self { store, network, throttle_window }
    }
}

impl<S> QueueService<S>
where
    S: Store,
{
    /// Queue every action in `actions`, in order. The first rejection
    /// (validation, unpublished deployment, inactive allocation,
    /// throttle, or non-overwritable duplicate) stops the batch and is
    /// returned; actions queued before it remain queued.
    pub async fn queue(&self, actions: Vec<Action>) -> Result<Vec<Action>, IndexerError> {
        let mut queued = Vec::with_capacity(actions.len());
        for action in actions {
            queued.push(self.queue_one(action).await?);
        }
        Ok(queued)
    }

    async fn queue_one(&self, mut action: Action) -> Result<Action, IndexerError> {
        action.validate_required_fields()?;

        let metadata = self
            .network
            .deployment_metadata(&action.protocol_network, &action.deployment_id)
            .await?;
        if metadata.is_none() {
            return Err(IndexerError::unpublished_deployment(&action.deployment_id.to_string()));
        }

        if matches!(action.action_type, ActionType::Unallocate | ActionType::Reallocate) {
            if let Some(allocation_id) = action.allocation_id.clone() {
                let state = self
                    .network
                    .allocation_state(&action.protocol_network, &allocation_id)
                    .await?;
                if state != AllocationStatus::Active {
                    return Err(IndexerError::inactive_allocation(&allocation_id.to_string()));
                }
            }
        }

        let now = Utc::now();
        let recent = self
            .store
            .find_actions(
                &ActionFilter {
                    deployment_id: Some(action.deployment_id.clone()),
                    protocol_network: Some(action.protocol_network.clone()),
                    updated_at_within: Some(self.throttle_window),
                    ..ActionFilter::default()
                },
                None,
                OrderDirection::Asc,
            )
            .await?;
        if recently_executed(
            &recent,
            &action.deployment_id,
            &action.protocol_network,
            action.action_type,
            self.throttle_window,
            now,
        ) {
            return Err(IndexerError::recently_executed(
                &action.action_type.to_string(),
                &action.deployment_id.to_string(),
            ));
        }

        let existing = self
            .store
            .find_actions(
                &ActionFilter::by_deployment(
                    action.deployment_id.clone(),
                    action.protocol_network.clone(),
                ),
                None,
                OrderDirection::Asc,
            )
            .await?
            .into_iter()
            .find(|candidate| candidate.status.is_non_terminal());

        if let Some(existing) = existing {
            if existing.source == action.source {
                action.id = existing.id;
                return self.store.upsert_action(action).await;
            }
            return Err(IndexerError::duplicate_action(&action.deployment_id.to_string()));
        }

        action.id = None;
        self.store.upsert_action(action).await
    }

    /// Move `queued` actions to `approved`. Refuses with
    /// [`IndexerError::actions_not_found`] if any id is missing.
    pub async fn approve(&self, ids: &[i64]) -> Result<Vec<Action>, IndexerError> {
        self.transition(ids, ActionStatus::Approved).await
    }

    /// Move actions to `canceled`, symmetric with `approve`.
    pub async fn cancel(&self, ids: &[i64]) -> Result<Vec<Action>, IndexerError> {
        self.transition(ids, ActionStatus::Canceled).await
    }

    /// Delete actions by id. Refuses if any id does not exist (enforced by
    /// the store).
    pub async fn delete(&self, ids: &[i64]) -> Result<u64, IndexerError> {
        self.store.delete_actions(ids).await
    }

    /// Query actions with the given filter and ordering.
    pub async fn fetch(
        &self,
        filter: &ActionFilter,
        order_by: Option<ActionColumn>,
        order_dir: OrderDirection,
    ) -> Result<Vec<Action>, IndexerError> {
        self.store.find_actions(filter, order_by, order_dir).await
    }

    async fn transition(&self, ids: &[i64], to: ActionStatus) -> Result<Vec<Action>, IndexerError> {
        let found = self
            .store
            .find_actions(
                &ActionFilter { ids: Some(ids.to_vec()), ..ActionFilter::default() },
                None,
                OrderDirection::Asc,
            )
            .await?;
        let missing: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|id| !found.iter().any(|action| action.id == Some(*id)))
            .collect();
        if !missing.is_empty() {
            return Err(IndexerError::actions_not_found(&missing));
        }

        let mut updated = Vec::with_capacity(found.len());
        for mut action in found {
            action.status = to;
            updated.push(self.store.upsert_action(action).await?);
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use indexer_common::{AllocationId, DeploymentId, Grt, NetworkIdentifier};
    use indexer_network::{DeploymentMetadata, EpochInfo, StakingContractReader, SubgraphClient};
    use indexer_store::MemoryStore;
    use std::sync::Arc;

    struct FakeChain;

    #[async_trait]
    impl StakingContractReader for FakeChain {
        async fn epoch_info(&self, _network: &NetworkIdentifier) -> Result<EpochInfo, IndexerError> {
            Ok(EpochInfo { number: 100, start_block: 1_000, elapsed_blocks: 5 })
        }

        async fn max_allocation_epochs(&self, _network: &NetworkIdentifier) -> Result<u64, IndexerError> {
            Ok(28)
        }

        async fn indexer_capacity(
            &self,
            _network: &NetworkIdentifier,
            _indexer: &str,
        ) -> Result<Grt, IndexerError> {
            Ok(Grt(1_000_000))
        }

        async fn allocation_state(
            &self,
            _network: &NetworkIdentifier,
            allocation_id: &AllocationId,
        ) -> Result<AllocationStatus, IndexerError> {
            if allocation_id.0 == "0xactive" {
                Ok(AllocationStatus::Active)
            } else {
                Ok(AllocationStatus::Null)
            }
        }
    }

    struct FakeSubgraph {
        published: bool,
    }

    #[async_trait]
    impl SubgraphClient for FakeSubgraph {
        async fn indexer_allocations(
            &self,
            _network: &NetworkIdentifier,
            _indexer: &str,
            _statuses: &[AllocationStatus],
        ) -> Result<Vec<indexer_common::Allocation>, IndexerError> {
            Ok(Vec::new())
        }

        async fn allocation_by_id(
            &self,
            _network: &NetworkIdentifier,
            _id: &AllocationId,
        ) -> Result<Option<indexer_common::Allocation>, IndexerError> {
            Ok(None)
        }

        async fn deployment_metadata(
            &self,
            _network: &NetworkIdentifier,
            deployment: &DeploymentId,
        ) -> Result<Option<DeploymentMetadata>, IndexerError> {
            if self.published {
                Ok(Some(DeploymentMetadata {
                    deployment_id: deployment.clone(),
                    display_name: None,
                    synced: true,
                }))
            } else {
                Ok(None)
            }
        }
    }

    struct FakeNode;

    #[async_trait]
    impl indexer_network::DeploymentNodeClient for FakeNode {
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
            Ok(None)
        }
    }

    fn service(published: bool) -> QueueService<MemoryStore> {
        let monitor = NetworkMonitor::new(
            Arc::new(FakeChain),
            Arc::new(FakeSubgraph { published }),
            Arc::new(FakeNode),
        );
        QueueService::new(MemoryStore::new(), monitor, Duration::minutes(10))
    }

    fn allocate_action(deployment: &str, source: &str, amount: u128) -> Action {
        Action {
            id: None,
            status: ActionStatus::Queued,
            action_type: ActionType::Allocate,
            deployment_id: DeploymentId::from(deployment),
            allocation_id: None,
            amount: Some(Grt(amount)),
            poi: None,
            force: false,
            priority: 0,
            source: source.to_owned(),
            reason: None,
            is_legacy: false,
            syncing_network: None,
            transaction: None,
            failure_reason: None,
            protocol_network: NetworkIdentifier::new("eip155:1"),
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn unpublished_deployment_is_refused() {
        let service = service(false);
        let result = service.queue(vec![allocate_action("Qmfoo", "indexerAgent", 10_000)]).await;
        assert!(matches!(result, Err(IndexerError::Validation(_))));
    }

    #[tokio::test]
    async fn duplicate_from_different_source_is_rejected() {
        let service = service(true);
        let first = service
            .queue(vec![allocate_action("Qmfoo", "indexerAgent", 10_000)])
            .await;
        assert!(first.is_ok());

        let second = service
            .queue(vec![allocate_action("Qmfoo", "different", 10_000)])
            .await;
        assert!(matches!(second, Err(IndexerError::Constraint(_))));
        if let Err(IndexerError::Constraint(message)) = second {
            assert!(message.contains("Qmfoo"));
            assert!(message.contains("NOT overwritten"));
        }
    }

    #[tokio::test]
    async fn same_source_overwrites_in_place() {
        let service = service(true);
        let first = service
            .queue(vec![allocate_action("Qmfoo", "indexerAgent", 10_000)])
            .await
            .unwrap_or_default();
        let first_id = first.first().and_then(|a| a.id);

        let second = service
            .queue(vec![allocate_action("Qmfoo", "indexerAgent", 25_000)])
            .await
            .unwrap_or_default();
        assert_eq!(second.len(), 1);
        assert_eq!(second.first().and_then(|a| a.id), first_id);
        assert_eq!(second.first().and_then(|a| a.amount), Some(Grt(25_000)));

        let all = service
            .fetch(&ActionFilter::default(), None, OrderDirection::Asc)
            .await
            .unwrap_or_default();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn inactive_allocation_is_rejected_for_unallocate() {
        let service = service(true);
        let mut action = allocate_action("Qmfoo", "indexerAgent", 0);
        action.action_type = ActionType::Unallocate;
        action.amount = None;
        action.allocation_id = Some(AllocationId::from("0xnotactive"));
        let result = service.queue(vec![action]).await;
        assert!(matches!(result, Err(IndexerError::Validation(_))));
    }

    #[tokio::test]
    async fn active_allocation_is_accepted_for_unallocate() {
        let service = service(true);
        let mut action = allocate_action("Qmfoo", "indexerAgent", 0);
        action.action_type = ActionType::Unallocate;
        action.amount = None;
        action.allocation_id = Some(AllocationId::from("0xactive"));
        let result = service.queue(vec![action]).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn approve_then_cancel_round_trip() {
        let service = service(true);
        let queued = service
            .queue(vec![allocate_action("Qmfoo", "indexerAgent", 10_000)])
            .await
            .unwrap_or_default();
        let ids: Vec<i64> = queued.iter().filter_map(|a| a.id).collect();

        let approved = service.approve(&ids).await;
        assert!(approved.is_ok());
        if let Ok(actions) = approved {
            assert!(actions.iter().all(|a| a.status == ActionStatus::Approved));
        }

        let canceled = service.cancel(&ids).await;
        assert!(canceled.is_ok());
        if let Ok(actions) = canceled {
            assert!(actions.iter().all(|a| a.status == ActionStatus::Canceled));
        }
    }

    #[tokio::test]
    async fn approve_unknown_id_is_refused() {
        let service = service(true);
        let result = service.approve(&[999]).await;
        assert!(matches!(result, Err(IndexerError::Constraint(_))));
    }
}
