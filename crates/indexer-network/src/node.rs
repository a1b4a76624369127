// SPDX-License-Identifier: Apache-2.0
//! Local deployment-node JSON-RPC surface (`spec.md` §6: `subgraph_create`,
//! `subgraph_deploy`, `subgraph_reassign`). The sentinel `node_id =
//! "removed"` both removes a deployment from indexing and, on older
//! protocol versions, marks it "virtually paused".

use async_trait::async_trait;
use indexer_common::{DeploymentId, IndexerError};

/// Sentinel node id meaning "not assigned to any indexing node" — also
/// the legacy "virtually paused" marker (Open Question 9b).
pub const REMOVED_NODE_ID: &str = "removed";

/// JSON-RPC access to the operator's local deployment node.
#[async_trait]
pub trait DeploymentNodeClient: Send + Sync {
    /// Idempotently ensure `deployment` exists on the node (`subgraph_create`
    /// followed by `subgraph_deploy` if not already present).
    async fn ensure_deployed(&self, deployment: &DeploymentId) -> Result<(), IndexerError>;

    /// Reassign `deployment` to `node_id` (`subgraph_reassign`).
    async fn reassign(&self, deployment: &DeploymentId, node_id: &str) -> Result<(), IndexerError>;

    /// Explicitly pause `deployment` (the newer pause RPC, distinct from
    /// the legacy `node_id = "removed"` convention).
    async fn pause(&self, deployment: &DeploymentId) -> Result<(), IndexerError>;

    /// Compute the canonical POI for `deployment` at `block_number`, or
    /// `None` if the node has not indexed that far.
    async fn resolve_poi_at_block(
        &self,
        deployment: &DeploymentId,
        block_number: u64,
    ) -> Result<Option<String>, IndexerError>;
}
