// SPDX-License-Identifier: Apache-2.0
//! Per-network reconciliation (`spec.md` §4.8): partition the deployment
//! universe, diff the target allocation set against actuals, and drive
//! the resulting actions through the queue and the batch executor once
//! per tick.
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

mod partition;
mod reconciler;
mod target;

pub use partition::{classify, Partition};
pub use reconciler::Reconciler;
pub use target::{diff_managed_deployment, per_slot_amount, unallocate_out_of_scope};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use indexer_allocations::AllocationIdKey;
    use indexer_common::{
        Action, ActionStatus, ActionType, Allocation, AllocationId, AllocationStatus, DeploymentId,
        DeploymentMetadata, EpochInfo, Grt, IndexingRule, NetworkIdentifier,
    };
    use indexer_executor::{BatchOutcome, MarketSignalProvider, NoopReceiptCollector, TransactionSubmitter};
    use indexer_network::{DeploymentNodeClient, NetworkMonitor, StakingContractReader, SubgraphClient};
    use indexer_rules::MarketSignal;
    use indexer_store::MemoryStore;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn network() -> NetworkIdentifier {
        NetworkIdentifier::new("eip155:1")
    }

    struct FakeChain {
        free_stake: Grt,
    }

    #[async_trait]
    impl StakingContractReader for FakeChain {
        async fn epoch_info(&self, _network: &NetworkIdentifier) -> Result<EpochInfo, indexer_common::IndexerError> {
            Ok(EpochInfo { number: 10, start_block: 0, elapsed_blocks: 1 })
        }

        async fn max_allocation_epochs(&self, _network: &NetworkIdentifier) -> Result<u64, indexer_common::IndexerError> {
            Ok(28)
        }

        async fn indexer_capacity(&self, _network: &NetworkIdentifier, _indexer: &str) -> Result<Grt, indexer_common::IndexerError> {
            Ok(self.free_stake)
        }

        async fn allocation_state(
            &self,
            _network: &NetworkIdentifier,
            _allocation_id: &AllocationId,
        ) -> Result<AllocationStatus, indexer_common::IndexerError> {
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
            _statuses: &[AllocationStatus],
        ) -> Result<Vec<Allocation>, indexer_common::IndexerError> {
            Ok(self.active.lock().map_or_else(|_| Vec::new(), |guard| guard.clone()))
        }

        async fn allocation_by_id(
            &self,
            _network: &NetworkIdentifier,
            _id: &AllocationId,
        ) -> Result<Option<Allocation>, indexer_common::IndexerError> {
            Ok(None)
        }

        async fn deployment_metadata(
            &self,
            _network: &NetworkIdentifier,
            deployment: &DeploymentId,
        ) -> Result<Option<DeploymentMetadata>, indexer_common::IndexerError> {
            Ok(Some(DeploymentMetadata {
                deployment_id: deployment.clone(),
                display_name: Some("test".to_owned()),
                synced: true,
            }))
        }
    }

    struct FakeNode;

    #[async_trait]
    impl DeploymentNodeClient for FakeNode {
        async fn ensure_deployed(&self, _deployment: &DeploymentId) -> Result<(), indexer_common::IndexerError> {
            Ok(())
        }

        async fn reassign(&self, _deployment: &DeploymentId, _node_id: &str) -> Result<(), indexer_common::IndexerError> {
            Ok(())
        }

        async fn pause(&self, _deployment: &DeploymentId) -> Result<(), indexer_common::IndexerError> {
            Ok(())
        }

        async fn resolve_poi_at_block(
            &self,
            _deployment: &DeploymentId,
            _block_number: u64,
        ) -> Result<Option<String>, indexer_common::IndexerError> {
            Ok(Some("0xpoi".to_owned()))
        }
    }

    struct FakeSubmitter;

    #[async_trait]
    impl TransactionSubmitter for FakeSubmitter {
        async fn submit_multicall(
            &self,
            _network: &NetworkIdentifier,
            _calls: &[indexer_executor::EncodedCall],
        ) -> Result<BatchOutcome, indexer_common::IndexerError> {
            Ok(BatchOutcome::Events(Vec::new()))
        }
    }

    struct FakeSignal;

    #[async_trait]
    impl MarketSignalProvider for FakeSignal {
        async fn signal(
            &self,
            _network: &NetworkIdentifier,
            _deployment: &DeploymentId,
        ) -> Result<MarketSignal, indexer_common::IndexerError> {
            Ok(MarketSignal { signal: Grt::ZERO, stake: Grt::ZERO, average_query_fees: Grt::ZERO })
        }
    }

    fn always_rule() -> IndexingRule {
        let mut rule = IndexingRule::default_global(network());
        rule.identifier = "Qmfoo".to_owned();
        rule.identifier_type = indexer_common::IdentifierType::Deployment;
        rule.decision_basis = indexer_common::DecisionBasis::Always;
        rule.allocation_amount = Some(Grt(1_000));
        rule.parallel_allocations = Some(1);
        rule
    }

    fn reconciler(free_stake: Grt) -> (Reconciler<Arc<MemoryStore>>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let monitor = NetworkMonitor::new(
            Arc::new(FakeChain { free_stake }),
            Arc::new(FakeSubgraph { active: Mutex::new(Vec::new()) }),
            Arc::new(FakeNode),
        );
        let allocations = indexer_allocations::AllocationManager::new(
            monitor.clone(),
            "0xindexer".to_owned(),
            "test test test test test test test test test test test junk".to_owned(),
            AllocationIdKey::from_bytes([7u8; 32]),
        );
        let reconciler = Reconciler::new(
            store.clone(),
            monitor,
            allocations,
            Arc::new(FakeSubmitter),
            Arc::new(NoopReceiptCollector),
            Arc::new(FakeSignal),
            "0xindexer".to_owned(),
            network(),
            chrono::Duration::hours(1),
            Duration::from_secs(5),
        );
        (reconciler, store)
    }

    #[tokio::test]
    async fn a_manage_rule_with_no_active_allocations_queues_and_executes_an_allocate() {
        let (r, store) = reconciler(Grt(10_000));
        store.upsert_rule(always_rule()).await.expect("seed rule");
        let settled = r.tick().await.expect("pass succeeds");
        assert_eq!(settled.len(), 1);
        assert!(matches!(settled[0].action_type, ActionType::Allocate));
        assert_eq!(settled[0].status, ActionStatus::Success);
    }

    #[tokio::test]
    async fn a_second_tick_while_the_first_is_running_is_skipped() {
        let (r, store) = reconciler(Grt(10_000));
        let r = Arc::new(r);
        store.upsert_rule(always_rule()).await.expect("seed rule");
        let a = r.clone();
        let b = r.clone();
        let (first, second) = tokio::join!(a.tick(), b.tick());
        let total = first.expect("first pass ok").len() + second.expect("second pass ok").len();
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn no_manage_rules_produces_an_empty_settled_batch() {
        let (r, _store) = reconciler(Grt(10_000));
        let settled = r.tick().await.expect("pass succeeds");
        assert!(settled.is_empty());
    }
}
