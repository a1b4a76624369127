// SPDX-License-Identifier: Apache-2.0
//! Protocol indexing subgraph reads (`spec.md` §6): paginated by
//! `id > lastId`, page size 1000, ordered ascending, until a short page.

use async_trait::async_trait;
use indexer_common::{Allocation, AllocationId, AllocationStatus, DeploymentId, IndexerError, NetworkIdentifier};

/// Page size the wire contract specifies for `id > lastId` pagination.
pub const SUBGRAPH_PAGE_SIZE: usize = 1000;

/// Metadata about a subgraph deployment as known to the protocol
/// subgraph — existence plus sync/display state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentMetadata {
    /// The deployment this describes.
    pub deployment_id: DeploymentId,
    /// Operator-facing display name, if the subgraph has one.
    pub display_name: Option<String>,
    /// `true` once the deployment has reached chain head at least once.
    pub synced: bool,
}

/// Reads against the protocol indexing subgraph.
#[async_trait]
pub trait SubgraphClient: Send + Sync {
    /// All of the operator's allocations matching any of `statuses` (an
    /// empty slice matches every status). Internally paginates per the
    /// wire contract; callers see the fully materialized result.
    async fn indexer_allocations(
        &self,
        network: &NetworkIdentifier,
        indexer: &str,
        statuses: &[AllocationStatus],
    ) -> Result<Vec<Allocation>, IndexerError>;

    /// A single allocation by id, if the subgraph has indexed it.
    async fn allocation_by_id(
        &self,
        network: &NetworkIdentifier,
        id: &AllocationId,
    ) -> Result<Option<Allocation>, IndexerError>;

    /// Metadata for `deployment`, or `None` if it is unpublished.
    async fn deployment_metadata(
        &self,
        network: &NetworkIdentifier,
        deployment: &DeploymentId,
    ) -> Result<Option<DeploymentMetadata>, IndexerError>;
}
