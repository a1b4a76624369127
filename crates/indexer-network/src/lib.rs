// SPDX-License-Identifier: Apache-2.0
//! Read-only network monitor (`spec.md` §4.4): current epoch, capacity,
//! live allocations, deployment metadata, and POI resolution.
//!
//! Chain reads, subgraph reads, and deployment-node RPC are each a small
//! trait (Design Note 9: "model \[these\] as a single read-only capability
//! bundle passed into components as a dependency, not as a shared
//! singleton") so [`NetworkMonitor`] can be constructed with HTTP-backed
//! implementations in production and with fakes in tests.
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

mod chain;
mod http;
mod node;
mod poi;
mod subgraph;

pub use chain::StakingContractReader;
pub use http::{ChainEndpoint, HttpDeploymentNodeClient, HttpStakingContractReader, HttpSubgraphClient};
pub use node::DeploymentNodeClient;
pub use subgraph::{DeploymentMetadata, SubgraphClient};

use indexer_common::{Allocation, AllocationId, AllocationStatus, DeploymentId, Grt, IndexerError, NetworkIdentifier};
use std::sync::Arc;

/// Current position within the protocol's epoch clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochInfo {
    /// Current epoch number.
    pub number: u64,
    /// Block the current epoch started at.
    pub start_block: u64,
    /// Blocks elapsed since `start_block`.
    pub elapsed_blocks: u64,
}

/// The read-only capability bundle used by `indexer-allocations`,
/// `indexer-executor`, and the reconciler: chain contract reads, a
/// subgraph client, and a local deployment-node client, composed rather
/// than reached for as globals.
#[derive(Clone)]
pub struct NetworkMonitor {
    chain: Arc<dyn StakingContractReader>,
    subgraph: Arc<dyn SubgraphClient>,
    node: Arc<dyn DeploymentNodeClient>,
}

impl NetworkMonitor {
    /// Compose a monitor from its three capability traits.
    pub fn new(
        chain: Arc<dyn StakingContractReader>,
        subgraph: Arc<dyn SubgraphClient>,
        node: Arc<dyn DeploymentNodeClient>,
    ) -> Self {
        Self { chain, subgraph, node }
    }

    /// Current epoch number, start block, and elapsed blocks.
    pub async fn epoch_info(&self, network: &NetworkIdentifier) -> Result<EpochInfo, IndexerError> {
        self.chain.epoch_info(network).await
    }

    /// `maxAllocationEpochs` contract parameter.
    pub async fn max_allocation_epochs(&self, network: &NetworkIdentifier) -> Result<u64, IndexerError> {
        self.chain.max_allocation_epochs(network).await
    }

    /// The operator's uncommitted stake on `network`.
    pub async fn free_stake(
        &self,
        network: &NetworkIdentifier,
        indexer: &str,
    ) -> Result<Grt, IndexerError> {
        self.chain.indexer_capacity(network, indexer).await
    }

    /// On-chain lifecycle status of `allocation_id` (`null` if it never
    /// existed).
    pub async fn allocation_state(
        &self,
        network: &NetworkIdentifier,
        allocation_id: &AllocationId,
    ) -> Result<AllocationStatus, IndexerError> {
        self.chain.allocation_state(network, allocation_id).await
    }

    /// All of the operator's allocations on `network` matching any of
    /// `statuses` (an empty slice matches every status).
    pub async fn allocations_by_status(
        &self,
        network: &NetworkIdentifier,
        indexer: &str,
        statuses: &[AllocationStatus],
    ) -> Result<Vec<Allocation>, IndexerError> {
        self.subgraph.indexer_allocations(network, indexer, statuses).await
    }

    /// A single allocation by id, if the subgraph has indexed it.
    pub async fn allocation(
        &self,
        network: &NetworkIdentifier,
        id: &AllocationId,
    ) -> Result<Option<Allocation>, IndexerError> {
        self.subgraph.allocation_by_id(network, id).await
    }

    /// Subgraph deployment metadata (existence, display name, sync state).
    pub async fn deployment_metadata(
        &self,
        network: &NetworkIdentifier,
        deployment: &DeploymentId,
    ) -> Result<Option<DeploymentMetadata>, IndexerError> {
        self.subgraph.deployment_metadata(network, deployment).await
    }

    /// Resolve the POI to close `allocation` with, per `spec.md` §4.4.
    pub async fn resolve_poi(
        &self,
        allocation: &Allocation,
        user_poi: Option<&str>,
        force: bool,
    ) -> Result<String, IndexerError> {
        poi::resolve(self.node.as_ref(), allocation, user_poi, force).await
    }

    /// Ensure `deployment` is deployed to the local node, then run the
    /// Open Question 9b "virtually paused" migration exactly once: a
    /// deployment currently assigned to the `"removed"` sentinel node is
    /// reassigned to `target_node_id` and then explicitly paused. Returns
    /// `true` if the migration ran.
    pub async fn migrate_virtual_pause(
        &self,
        rule: &mut indexer_common::IndexingRule,
        current_node_id: &str,
        target_node_id: &str,
    ) -> Result<bool, IndexerError> {
        let already_migrated = rule
            .custom
            .as_ref()
            .and_then(|c| c.get("_migratedVirtualPause"))
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        if already_migrated || current_node_id != "removed" {
            return Ok(false);
        }
        let deployment = DeploymentId(rule.identifier.clone());
        self.node.reassign(&deployment, target_node_id).await?;
        self.node.pause(&deployment).await?;

        let mut custom = rule.custom.clone().unwrap_or_else(|| serde_json::json!({}));
        if let Some(object) = custom.as_object_mut() {
            object.insert("_migratedVirtualPause".to_owned(), serde_json::Value::Bool(true));
        }
        rule.custom = Some(custom);
        Ok(true)
    }

    /// Idempotently ensure `deployment` exists on the local node.
    pub async fn ensure_deployed(&self, deployment: &DeploymentId) -> Result<(), IndexerError> {
        self.node.ensure_deployed(deployment).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subgraph::DeploymentMetadata;
    use async_trait::async_trait;
    use indexer_common::{IdentifierType, IndexingRule};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NoopChain;
    #[async_trait]
    impl StakingContractReader for NoopChain {
        async fn epoch_info(&self, _network: &NetworkIdentifier) -> Result<EpochInfo, IndexerError> {
            Ok(EpochInfo { number: 0, start_block: 0, elapsed_blocks: 0 })
        }
        async fn max_allocation_epochs(&self, _network: &NetworkIdentifier) -> Result<u64, IndexerError> {
            Ok(28)
        }
        async fn indexer_capacity(
            &self,
            _network: &NetworkIdentifier,
            _indexer: &str,
        ) -> Result<Grt, IndexerError> {
            Ok(Grt(0))
        }
        async fn allocation_state(
            &self,
            _network: &NetworkIdentifier,
            _allocation_id: &AllocationId,
        ) -> Result<AllocationStatus, IndexerError> {
            Ok(AllocationStatus::Null)
        }
    }

    struct NoopSubgraph;
    #[async_trait]
    impl SubgraphClient for NoopSubgraph {
        async fn indexer_allocations(
            &self,
            _network: &NetworkIdentifier,
            _indexer: &str,
            _statuses: &[AllocationStatus],
        ) -> Result<Vec<Allocation>, IndexerError> {
            Ok(Vec::new())
        }
        async fn allocation_by_id(
            &self,
            _network: &NetworkIdentifier,
            _id: &AllocationId,
        ) -> Result<Option<Allocation>, IndexerError> {
            Ok(None)
        }
        async fn deployment_metadata(
            &self,
            _network: &NetworkIdentifier,
            _deployment: &DeploymentId,
        ) -> Result<Option<DeploymentMetadata>, IndexerError> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct CountingNode {
        reassigns: AtomicUsize,
        pauses: AtomicUsize,
    }

    #[async_trait]
    impl crate::node::DeploymentNodeClient for CountingNode {
        async fn ensure_deployed(&self, _deployment: &DeploymentId) -> Result<(), IndexerError> {
            Ok(())
        }
        async fn reassign(&self, _deployment: &DeploymentId, _node_id: &str) -> Result<(), IndexerError> {
            self.reassigns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        async fn pause(&self, _deployment: &DeploymentId) -> Result<(), IndexerError> {
            self.pauses.fetch_add(1, Ordering::SeqCst);
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

    fn monitor(node: Arc<CountingNode>) -> NetworkMonitor {
        NetworkMonitor::new(Arc::new(NoopChain), Arc::new(NoopSubgraph), node)
    }

    fn rule() -> IndexingRule {
        IndexingRule {
            identifier: "Qmfoo".to_owned(),
            identifier_type: IdentifierType::Deployment,
            protocol_network: NetworkIdentifier::new("eip155:1"),
            allocation_amount: None,
            parallel_allocations: None,
            max_allocation_percentage: None,
            min_signal: None,
            max_signal: None,
            min_stake: None,
            min_average_query_fees: None,
            allocation_lifetime: None,
            auto_renewal: None,
            custom: None,
            decision_basis: indexer_common::DecisionBasis::Rules,
            require_supported: true,
            safety: true,
        }
    }

    #[tokio::test]
    async fn virtual_pause_migration_runs_once() {
        let node = Arc::new(CountingNode::default());
        let monitor = monitor(node.clone());
        let mut r = rule();

        let ran = monitor.migrate_virtual_pause(&mut r, "removed", "node-1").await;
        assert_eq!(ran.as_ref().ok().copied(), Some(true));
        assert_eq!(node.reassigns.load(Ordering::SeqCst), 1);
        assert_eq!(node.pauses.load(Ordering::SeqCst), 1);
        assert_eq!(
            r.custom.as_ref().and_then(|c| c.get("_migratedVirtualPause")),
            Some(&serde_json::Value::Bool(true))
        );

        let ran_again = monitor.migrate_virtual_pause(&mut r, "removed", "node-1").await;
        assert_eq!(ran_again.as_ref().ok().copied(), Some(false));
        assert_eq!(node.reassigns.load(Ordering::SeqCst), 1);
        assert_eq!(node.pauses.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn non_removed_node_id_never_triggers_migration() {
        let node = Arc::new(CountingNode::default());
        let monitor = monitor(node.clone());
        let mut r = rule();
        let ran = monitor.migrate_virtual_pause(&mut r, "node-1", "node-2").await;
        assert_eq!(ran.as_ref().ok().copied(), Some(false));
        assert_eq!(node.reassigns.load(Ordering::SeqCst), 0);
    }
}
