// SPDX-License-Identifier: Apache-2.0
//! `POIDispute` — store-only proof-of-indexing dispute record.

use crate::{AllocationId, DeploymentId, NetworkIdentifier};
use serde::{Deserialize, Serialize};

/// A proof-of-indexing dispute, keyed by `(allocationID, protocolNetwork)`.
/// Upserts must merge proof fields rather than overwrite wholesale
/// (`spec.md` §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiDispute {
    /// Disputed allocation.
    pub allocation_id: AllocationId,
    /// Network the allocation lives on.
    pub protocol_network: NetworkIdentifier,
    /// Deployment the allocation indexes.
    pub subgraph_deployment_id: DeploymentId,
    /// Epoch the dispute concerns.
    pub allocation_indexer: String,
    /// The indexer's submitted POI.
    pub indexer_proof: Option<String>,
    /// The bisection-derived reference POI, once resolved.
    pub bisection_proof: Option<String>,
    /// Current dispute status (free-form: external arbitration process
    /// owns the state machine; this crate only stores it).
    pub status: String,
}

impl PoiDispute {
    /// Merge `update` onto `self` field-by-field, keeping any existing
    /// value `update` leaves `None` (the §4.2 upsert-merge requirement).
    pub fn merged_with(&self, update: &Self) -> Self {
        Self {
            allocation_id: update.allocation_id.clone(),
            protocol_network: update.protocol_network.clone(),
            subgraph_deployment_id: update.subgraph_deployment_id.clone(),
            allocation_indexer: update.allocation_indexer.clone(),
            indexer_proof: update.indexer_proof.clone().or_else(|| self.indexer_proof.clone()),
            bisection_proof: update
                .bisection_proof
                .clone()
                .or_else(|| self.bisection_proof.clone()),
            status: update.status.clone(),
        }
    }
}
