// SPDX-License-Identifier: Apache-2.0
//! Allocation manager — parameter preparation (`spec.md` §4.6):
//! deterministic allocation-id derivation, allocation-id proof signing,
//! and the capacity/epoch/state guards for `allocate`/`unallocate`/
//! `reallocate`. Produces pure value objects; the batch executor
//! (`indexer-executor`) turns them into call data and submits.
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

mod derive;
mod prepare;
mod proof;

pub use derive::derive_allocation_id;
pub use prepare::{AllocationManager, PreparedAction};
pub use proof::{sign_allocation_id, AllocationIdKey};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use indexer_common::{
        Allocation, AllocationId, AllocationStatus, DeploymentId, Grt, IndexerError, NetworkIdentifier,
    };
    use indexer_network::{DeploymentNodeClient, EpochInfo, NetworkMonitor, StakingContractReader, SubgraphClient};
    use std::sync::Arc;

    struct FakeChain {
        epoch: u64,
        free_stake: Grt,
    }

    #[async_trait]
    impl StakingContractReader for FakeChain {
        async fn epoch_info(&self, _network: &NetworkIdentifier) -> Result<EpochInfo, IndexerError> {
            Ok(EpochInfo { number: self.epoch, start_block: self.epoch * 100, elapsed_blocks: 1 })
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
        active: Vec<Allocation>,
    }

    #[async_trait]
    impl SubgraphClient for FakeSubgraph {
        async fn indexer_allocations(
            &self,
            _network: &NetworkIdentifier,
            _indexer: &str,
            _statuses: &[AllocationStatus],
        ) -> Result<Vec<Allocation>, IndexerError> {
            Ok(self.active.clone())
        }

        async fn allocation_by_id(
            &self,
            _network: &NetworkIdentifier,
            id: &AllocationId,
        ) -> Result<Option<Allocation>, IndexerError> {
            Ok(self.active.iter().find(|allocation| &allocation.id == id).cloned())
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
            Ok(Some("0xcanonical".to_owned()))
        }
    }

    fn manager(epoch: u64, free_stake: u128, active: Vec<Allocation>) -> AllocationManager {
        let monitor = NetworkMonitor::new(
            Arc::new(FakeChain { epoch, free_stake: Grt(free_stake) }),
            Arc::new(FakeSubgraph { active }),
            Arc::new(FakeNode),
        );
        AllocationManager::new(
            monitor,
            "0xindexer".to_owned(),
            "test test test test test test test test test test test junk".to_owned(),
            AllocationIdKey::from_bytes([9u8; 32]),
        )
    }

    fn network() -> NetworkIdentifier {
        NetworkIdentifier::new("eip155:1")
    }

    #[tokio::test]
    async fn allocate_requires_positive_amount() {
        let manager = manager(100, 1_000_000, Vec::new());
        let result = manager
            .allocate(&network(), DeploymentId::from("Qmfoo"), Grt::ZERO)
            .await;
        assert!(matches!(result, Err(IndexerError::Preparation(_))));
    }

    #[tokio::test]
    async fn allocate_refuses_existing_active_allocation() {
        let existing = Allocation {
            id: AllocationId::from("0xexisting"),
            status: AllocationStatus::Active,
            subgraph_deployment: DeploymentId::from("Qmfoo"),
            indexer: "0xindexer".to_owned(),
            allocated_tokens: Grt(10_000),
            created_at_epoch: 99,
            closed_at_epoch: None,
            poi: None,
            protocol_network: network(),
        };
        let manager = manager(100, 1_000_000, vec![existing]);
        let result = manager
            .allocate(&network(), DeploymentId::from("Qmfoo"), Grt(5_000))
            .await;
        assert!(matches!(result, Err(IndexerError::Preparation(_))));
    }

    #[tokio::test]
    async fn allocate_refuses_insufficient_capacity() {
        let manager = manager(100, 1_000, Vec::new());
        let result = manager
            .allocate(&network(), DeploymentId::from("Qmfoo"), Grt(5_000))
            .await;
        assert!(matches!(&result, Err(IndexerError::Preparation(_))));
        if let Err(IndexerError::Preparation(message)) = result {
            assert!(message.contains("insufficient-capacity"));
        }
    }

    #[tokio::test]
    async fn allocate_succeeds_and_derives_a_stable_id() {
        let manager = manager(100, 1_000_000, Vec::new());
        let first = manager
            .allocate(&network(), DeploymentId::from("Qmfoo"), Grt(5_000))
            .await;
        let second = manager
            .allocate(&network(), DeploymentId::from("Qmfoo"), Grt(5_000))
            .await;
        assert!(matches!(&first, Ok(PreparedAction::Allocate { .. })));
        assert!(matches!(&second, Ok(PreparedAction::Allocate { .. })));
        if let (Ok(PreparedAction::Allocate { allocation_id: a, .. }), Ok(PreparedAction::Allocate { allocation_id: b, .. })) =
            (first, second)
        {
            assert_eq!(a, b);
        }
    }

    #[tokio::test]
    async fn unallocate_refuses_same_epoch_close() {
        let existing = Allocation {
            id: AllocationId::from("0xexisting"),
            status: AllocationStatus::Active,
            subgraph_deployment: DeploymentId::from("Qmfoo"),
            indexer: "0xindexer".to_owned(),
            allocated_tokens: Grt(10_000),
            created_at_epoch: 100,
            closed_at_epoch: None,
            poi: None,
            protocol_network: network(),
        };
        let manager = manager(100, 1_000_000, vec![existing]);
        let result = manager
            .unallocate(&network(), AllocationId::from("0xexisting"), None, false)
            .await;
        assert!(matches!(&result, Err(IndexerError::Preparation(_))));
        if let Err(IndexerError::Preparation(message)) = result {
            assert!(message.contains("next permissible epoch is 101"));
        }
    }

    #[tokio::test]
    async fn unallocate_resolves_poi_via_the_node() {
        let existing = Allocation {
            id: AllocationId::from("0xexisting"),
            status: AllocationStatus::Active,
            subgraph_deployment: DeploymentId::from("Qmfoo"),
            indexer: "0xindexer".to_owned(),
            allocated_tokens: Grt(10_000),
            created_at_epoch: 99,
            closed_at_epoch: None,
            poi: None,
            protocol_network: network(),
        };
        let manager = manager(100, 1_000_000, vec![existing]);
        let result = manager
            .unallocate(&network(), AllocationId::from("0xexisting"), None, false)
            .await;
        assert!(matches!(
            result,
            Ok(PreparedAction::Unallocate { poi, .. }) if poi == "0xcanonical"
        ));
    }
}
