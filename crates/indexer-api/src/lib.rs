// SPDX-License-Identifier: Apache-2.0
//! GraphQL Management API (`spec.md` §6): the operator-facing surface for
//! indexing rules, the action queue, cost models, disputes, and
//! read-only network state, served over HTTP by `async-graphql` and
//! `axum`.
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

mod context;
mod mutation;
mod query;
mod router;
mod schema;
mod types;

pub use context::{ApiContext, IndexerEndpointConfig};
pub use mutation::MutationRoot;
pub use query::QueryRoot;
pub use router::router;
pub use schema::{build_schema, ApiSchema};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use indexer_common::{
        Allocation, AllocationId, AllocationStatus, DeploymentId, Grt, IndexerError, IndexingRule, NetworkIdentifier,
    };
    use indexer_network::{DeploymentMetadata, EpochInfo, NetworkMonitor, StakingContractReader, SubgraphClient};
    use indexer_queue::QueueService;
    use indexer_store::MemoryStore;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn network() -> NetworkIdentifier {
        NetworkIdentifier::new("eip155:1")
    }

    struct FakeChain;

    #[async_trait]
    impl StakingContractReader for FakeChain {
        async fn epoch_info(&self, _network: &NetworkIdentifier) -> Result<EpochInfo, IndexerError> {
            Ok(EpochInfo { number: 1, start_block: 0, elapsed_blocks: 0 })
        }

        async fn max_allocation_epochs(&self, _network: &NetworkIdentifier) -> Result<u64, IndexerError> {
            Ok(28)
        }

        async fn indexer_capacity(&self, _network: &NetworkIdentifier, _indexer: &str) -> Result<Grt, IndexerError> {
            Ok(Grt(1_000_000))
        }

        async fn allocation_state(
            &self,
            _network: &NetworkIdentifier,
            _allocation_id: &AllocationId,
        ) -> Result<AllocationStatus, IndexerError> {
            Ok(AllocationStatus::Null)
        }
    }

    struct FakeSubgraph;

    #[async_trait]
    impl SubgraphClient for FakeSubgraph {
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
            deployment: &DeploymentId,
        ) -> Result<Option<DeploymentMetadata>, IndexerError> {
            Ok(Some(DeploymentMetadata { deployment_id: deployment.clone(), display_name: None, synced: true }))
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

        async fn resolve_poi_at_block(&self, _deployment: &DeploymentId, _block_number: u64) -> Result<Option<String>, IndexerError> {
            Ok(None)
        }
    }

    fn context() -> ApiContext {
        let store: Arc<dyn indexer_store::Store> = Arc::new(MemoryStore::new());
        let monitor = NetworkMonitor::new(Arc::new(FakeChain), Arc::new(FakeSubgraph), Arc::new(FakeNode));
        let mut queues = HashMap::new();
        queues.insert(network(), QueueService::new(store.clone(), monitor.clone(), chrono::Duration::hours(1)));
        let mut networks = HashMap::new();
        networks.insert(network(), monitor);
        let mut indexer_addresses = HashMap::new();
        indexer_addresses.insert(network(), "0xindexer".to_owned());
        ApiContext::new(store, queues, networks, indexer_addresses, HashMap::new())
    }

    #[tokio::test]
    async fn set_and_read_back_an_indexing_rule() {
        let schema = build_schema(context());
        let response = schema
            .execute(
                r#"mutation {
                    setIndexingRule(rule: {
                        identifier: "Qmfoo"
                        identifierType: DEPLOYMENT
                        protocolNetwork: "eip155:1"
                        decisionBasis: ALWAYS
                        allocationAmount: "1000"
                    }) { identifier decisionBasis }
                }"#,
            )
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);

        let response = schema
            .execute(r#"query { indexingRules(protocolNetwork: "eip155:1", merged: false) { identifier } }"#)
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
    }

    #[tokio::test]
    async fn create_allocation_queues_and_approves_in_one_call() {
        let context = context();
        let rule = IndexingRule::default_global(network());
        context.store().upsert_rule(rule).await.expect("seed global rule");
        let schema = build_schema(context);
        let response = schema
            .execute(
                r#"mutation {
                    createAllocation(input: {
                        deploymentId: "Qmfoo"
                        amount: "1000"
                        protocolNetwork: "eip155:1"
                    }) { status actionType }
                }"#,
            )
            .await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        let data = response.data.into_json().expect("json");
        assert_eq!(data["createAllocation"]["status"], "APPROVED");
    }

    #[tokio::test]
    async fn actions_query_requires_a_protocol_network_in_the_filter() {
        let schema = build_schema(context());
        let response = schema.execute(r#"query { actions(filter: {}) { id } }"#).await;
        assert!(!response.errors.is_empty());
    }

    #[test]
    fn unconfigured_network_lookup_is_a_validation_error() {
        let context = context();
        let unknown = NetworkIdentifier::new("eip155:999");
        let error = context.queue(&unknown).expect_err("unconfigured");
        assert!(matches!(error, IndexerError::Validation(_)));
    }
}
