// SPDX-License-Identifier: Apache-2.0
//! The batch executor (`spec.md` §4.7): turns an ordered batch of approved
//! actions into prepared values, submits them as one atomic multi-call,
//! and interprets the result back onto each action plus the rule
//! back-writes a successful allocate/unallocate/reallocate triggers.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::missing_errors_doc
)]

mod executor;
mod receipts;
mod signal;
mod submit;

pub use executor::{order_actions, BatchExecutor};
pub use receipts::{NoopReceiptCollector, ReceiptCollector};
pub use signal::MarketSignalProvider;
pub use submit::{encode_call, BatchOutcome, ChainEvent, EncodedCall, TransactionSubmitter};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use indexer_allocations::AllocationManager;
    use indexer_common::{
        Action, ActionStatus, ActionType, Allocation, AllocationId, AllocationStatus, DeploymentId, Grt,
        IndexerError, NetworkIdentifier,
    };
    use indexer_network::{DeploymentNodeClient, EpochInfo, NetworkMonitor, StakingContractReader, SubgraphClient};
    use indexer_rules::MarketSignal;
    use indexer_store::MemoryStore;
    use std::sync::Mutex;

    struct FakeChain {
        epoch: u64,
        free_stake: Grt,
    }

    #[async_trait]
    impl StakingContractReader for FakeChain {
        async fn epoch_info(&self, _network: &NetworkIdentifier) -> Result<EpochInfo, IndexerError> {
            Ok(EpochInfo { number: self.epoch, start_block: 0, elapsed_blocks: 0 })
        }

        async fn max_allocation_epochs(&self, _network: &NetworkIdentifier) -> Result<u64, IndexerError> {
            Ok(28)
        }

        async fn indexer_capacity(&self, _network: &NetworkIdentifier, _indexer: &str) -> Result<Grt, IndexerError> {
            Ok(self.free_stake)
        }

        async fn allocation_state(
            &self,
            _network: &NetworkIdentifier,
            _allocation_id: &AllocationId,
        ) -> Result<AllocationStatus, IndexerError> {
            Ok(AllocationStatus::Null)
        }
    }

    struct FakeSubgraph {
        active: Mutex<Vec<Allocation>>,
    }

    #[async_trait]
    impl SubgraphClient for FakeSubgraph {
        async fn indexer_allocations(
            &self,
            _network: &NetworkIdentifier,
            _indexer: &str,
            statuses: &[AllocationStatus],
        ) -> Result<Vec<Allocation>, IndexerError> {
            let active = self.active.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            Ok(active.iter().filter(|allocation| statuses.contains(&allocation.status)).cloned().collect())
        }

        async fn allocation_by_id(
            &self,
            _network: &NetworkIdentifier,
            id: &AllocationId,
        ) -> Result<Option<Allocation>, IndexerError> {
            let active = self.active.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            Ok(active.iter().find(|allocation| &allocation.id == id).cloned())
        }

        async fn deployment_metadata(
            &self,
            _network: &NetworkIdentifier,
            _deployment: &DeploymentId,
        ) -> Result<Option<indexer_network::DeploymentMetadata>, IndexerError> {
            Ok(None)
        }
    }

    struct FakeNode;

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
            Ok(Some("0xpoi".to_owned()))
        }
    }

    struct FakeSubmitter {
        outcome: Mutex<Option<BatchOutcome>>,
    }

    #[async_trait]
    impl TransactionSubmitter for FakeSubmitter {
        async fn submit_multicall(
            &self,
            _network: &NetworkIdentifier,
            _calls: &[EncodedCall],
        ) -> Result<BatchOutcome, IndexerError> {
            let mut outcome = self.outcome.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            Ok(outcome.take().unwrap_or(BatchOutcome::Events(Vec::new())))
        }
    }

    struct FakeSignal;

    #[async_trait]
    impl MarketSignalProvider for FakeSignal {
        async fn signal(&self, _network: &NetworkIdentifier, _deployment: &DeploymentId) -> Result<MarketSignal, IndexerError> {
            Ok(MarketSignal { signal: Grt::ZERO, stake: Grt::ZERO, average_query_fees: Grt::ZERO })
        }
    }

    fn network() -> NetworkIdentifier {
        NetworkIdentifier::new("eip155:1")
    }

    fn deployment() -> DeploymentId {
        DeploymentId::from("Qmew9PZUJCoDzXqqU6vGyTENTKHrrN4dy5h94kertfudqy")
    }

    fn allocate_action(priority: i32) -> Action {
        Action {
            id: Some(1),
            status: ActionStatus::Approved,
            action_type: ActionType::Allocate,
            deployment_id: deployment(),
            allocation_id: None,
            amount: Some(Grt(1_000)),
            poi: None,
            force: false,
            priority,
            source: "indexerAgent".to_owned(),
            reason: None,
            is_legacy: false,
            syncing_network: None,
            transaction: None,
            failure_reason: None,
            protocol_network: network(),
            created_at: None,
            updated_at: None,
        }
    }

    fn executor(outcome: BatchOutcome, free_stake: Grt) -> BatchExecutor<MemoryStore> {
        let chain = FakeChain { epoch: 10, free_stake };
        let subgraph = FakeSubgraph { active: Mutex::new(Vec::new()) };
        let monitor = NetworkMonitor::new(std::sync::Arc::new(chain), std::sync::Arc::new(subgraph), std::sync::Arc::new(FakeNode));
        let allocations = AllocationManager::new(
            monitor,
            "0xindexer".to_owned(),
            "test test test test test test test test test test test junk".to_owned(),
            indexer_allocations::AllocationIdKey::from_bytes([7_u8; 32]),
        );
        BatchExecutor::new(
            MemoryStore::default(),
            allocations,
            std::sync::Arc::new(FakeSubmitter { outcome: Mutex::new(Some(outcome)) }),
            std::sync::Arc::new(NoopReceiptCollector),
            std::sync::Arc::new(FakeSignal),
        )
    }

    #[test]
    fn order_actions_sorts_by_priority_desc_then_id_asc() {
        let mut low = allocate_action(1);
        low.id = Some(2);
        let mut high = allocate_action(5);
        high.id = Some(1);
        let mut actions = vec![low.clone(), high.clone()];
        order_actions(&mut actions);
        assert_eq!(actions[0].priority, 5);
        assert_eq!(actions[1].priority, 1);
    }

    #[tokio::test]
    async fn all_failed_preparations_short_circuit_before_submission() {
        let mut action = allocate_action(0);
        action.amount = None;
        let executor = executor(BatchOutcome::Events(Vec::new()), Grt(10_000));
        let result = executor.execute_batch(&network(), vec![action]).await;
        let settled = result.unwrap_or_default();
        assert_eq!(settled.len(), 1);
        assert!(matches!(settled[0].status, ActionStatus::Failed));
    }

    #[tokio::test]
    async fn insufficient_capacity_fails_preparation_without_a_submission() {
        let action = allocate_action(0);
        let executor = executor(BatchOutcome::Events(Vec::new()), Grt::ZERO);
        let result = executor.execute_batch(&network(), vec![action]).await;
        let settled = result.unwrap_or_default();
        assert_eq!(settled.len(), 1);
        assert!(matches!(settled[0].status, ActionStatus::Failed));
    }

    #[tokio::test]
    async fn paused_outcome_fails_every_prepared_action() {
        let action = allocate_action(0);
        let executor = executor(BatchOutcome::Paused, Grt(10_000));
        let result = executor.execute_batch(&network(), vec![action]).await;
        let settled = result.unwrap_or_default();
        assert_eq!(settled.len(), 1);
        assert!(matches!(settled[0].status, ActionStatus::Failed));
        assert_eq!(settled[0].failure_reason.as_deref(), Some("Operator is paused"));
    }

    #[tokio::test]
    async fn matching_event_succeeds_and_backwrites_an_always_rule() {
        let action = allocate_action(0);
        let mnemonic = "test test test test test test test test test test test junk";
        let allocation_id =
            indexer_allocations::derive_allocation_id(mnemonic, 10, &deployment(), &std::collections::HashSet::new());

        let events = vec![ChainEvent::AllocationCreated { subgraph_deployment: deployment(), allocation_id }];
        let executor = executor(BatchOutcome::Events(events), Grt(10_000));
        let result = executor.execute_batch(&network(), vec![action]).await;
        let settled = result.unwrap_or_default();
        assert_eq!(settled.len(), 1);
        assert!(matches!(settled[0].status, ActionStatus::Success));
    }
}
