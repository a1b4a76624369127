// SPDX-License-Identifier: Apache-2.0
//! Parameter preparation for each action type (`spec.md` §4.6): pure
//! value objects, no side effects beyond the read-only `NetworkMonitor`
//! calls needed to gather the values.

use crate::derive::derive_allocation_id;
use crate::proof::{sign_allocation_id, AllocationIdKey};
use indexer_common::{AllocationId, AllocationStatus, DeploymentId, Grt, IndexerError, NetworkIdentifier};
use indexer_network::NetworkMonitor;
use std::collections::HashSet;

/// A prepared, side-effect-free transaction value the batch executor
/// turns into call data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreparedAction {
    /// Open a new allocation.
    Allocate {
        /// Target deployment.
        deployment: DeploymentId,
        /// Stake to commit.
        amount: Grt,
        /// Deterministically derived allocation id.
        allocation_id: AllocationId,
        /// Proof the allocation-id key controls `allocation_id`.
        proof: String,
    },
    /// Close an existing allocation.
    Unallocate {
        /// Allocation to close.
        allocation_id: AllocationId,
        /// Resolved proof of indexing.
        poi: String,
    },
    /// Close an existing allocation and immediately open a new one.
    Reallocate {
        /// Allocation being closed.
        closing_allocation_id: AllocationId,
        /// Resolved proof of indexing for the close.
        poi: String,
        /// Deployment the reopened allocation indexes (the same
        /// deployment the closed allocation indexed).
        deployment: DeploymentId,
        /// Deterministically derived id for the reopened allocation.
        allocation_id: AllocationId,
        /// Stake to commit to the reopened allocation.
        amount: Grt,
        /// Proof the allocation-id key controls the new id.
        proof: String,
    },
}

/// Prepares [`PreparedAction`]s against live network state. Holds the
/// wallet mnemonic and allocation-id signing key the derivation and proof
/// steps need; never performs a write.
pub struct AllocationManager {
    network: NetworkMonitor,
    indexer: String,
    mnemonic: String,
    allocation_id_key: AllocationIdKey,
}

impl AllocationManager {
    /// Construct a manager for one operator identity.
    pub fn new(network: NetworkMonitor, indexer: String, mnemonic: String, allocation_id_key: AllocationIdKey) -> Self {
        Self { network, indexer, mnemonic, allocation_id_key }
    }

    async fn active_allocation_ids(&self, network: &NetworkIdentifier) -> Result<HashSet<AllocationId>, IndexerError> {
        let active = self
            .network
            .allocations_by_status(network, &self.indexer, &[AllocationStatus::Active])
            .await?;
        Ok(active.into_iter().map(|allocation| allocation.id).collect())
    }

    /// Prepare an `allocate` action per `spec.md` §4.6.
    pub async fn allocate(
        &self,
        network: &NetworkIdentifier,
        deployment: DeploymentId,
        amount: Grt,
    ) -> Result<PreparedAction, IndexerError> {
        if amount == Grt::ZERO {
            return Err(IndexerError::Preparation(format!(
                "allocate action for deployment '{deployment}' requires a positive amount"
            )));
        }

        let active = self
            .network
            .allocations_by_status(network, &self.indexer, &[AllocationStatus::Active])
            .await?;
        if let Some(existing) = active.iter().find(|allocation| allocation.subgraph_deployment == deployment) {
            return Err(IndexerError::existing_active_allocation(&deployment.to_string(), &existing.id.to_string()));
        }

        let free_stake = self.network.free_stake(network, &self.indexer).await?;
        if free_stake < amount {
            return Err(IndexerError::insufficient_capacity(&free_stake.to_string(), &amount.to_string()));
        }

        self.network.ensure_deployed(&deployment).await?;

        let existing_ids: HashSet<AllocationId> = active.into_iter().map(|allocation| allocation.id).collect();
        let epoch = self.network.epoch_info(network).await?;
        let allocation_id = derive_allocation_id(&self.mnemonic, epoch.number, &deployment, &existing_ids);

        let state = self.network.allocation_state(network, &allocation_id).await?;
        if state != AllocationStatus::Null {
            return Err(IndexerError::allocation_already_exists_onchain(&allocation_id.to_string()));
        }

        let proof = sign_allocation_id(&self.allocation_id_key, &self.indexer, &allocation_id);
        Ok(PreparedAction::Allocate { deployment, amount, allocation_id, proof })
    }

    /// Shared checks for `unallocate`/`reallocate`: the allocation must
    /// exist and be active, and cannot be closed in the epoch it was
    /// opened. Returns the allocation and its resolved closing POI.
    async fn prepare_close(
        &self,
        network: &NetworkIdentifier,
        allocation_id: &AllocationId,
        poi: Option<&str>,
        force: bool,
    ) -> Result<(indexer_common::Allocation, String), IndexerError> {
        let allocation = self.network.allocation(network, allocation_id).await?;
        let Some(allocation) = allocation.filter(|allocation| allocation.status == AllocationStatus::Active) else {
            return Err(IndexerError::inactive_allocation(&allocation_id.to_string()));
        };

        let epoch = self.network.epoch_info(network).await?;
        if epoch.number == allocation.created_at_epoch {
            return Err(IndexerError::same_epoch_close(epoch.number + 1));
        }

        let resolved_poi = self.network.resolve_poi(&allocation, poi, force).await?;
        Ok((allocation, resolved_poi))
    }

    /// Prepare an `unallocate` action per `spec.md` §4.6.
    pub async fn unallocate(
        &self,
        network: &NetworkIdentifier,
        allocation_id: AllocationId,
        poi: Option<&str>,
        force: bool,
    ) -> Result<PreparedAction, IndexerError> {
        let (_allocation, resolved_poi) = self.prepare_close(network, &allocation_id, poi, force).await?;
        Ok(PreparedAction::Unallocate { allocation_id, poi: resolved_poi })
    }

    /// Prepare a `reallocate` action per `spec.md` §4.6: every
    /// `unallocate` check, plus `allocate`'s checks evaluated against
    /// `postCloseFreeStake = freeStake + existingAllocatedTokens`.
    pub async fn reallocate(
        &self,
        network: &NetworkIdentifier,
        allocation_id: AllocationId,
        poi: Option<&str>,
        amount: Grt,
        force: bool,
    ) -> Result<PreparedAction, IndexerError> {
        let (allocation, resolved_poi) = self.prepare_close(network, &allocation_id, poi, force).await?;

        if amount == Grt::ZERO {
            return Err(IndexerError::Preparation(format!(
                "reallocate action for deployment '{}' requires a positive amount",
                allocation.subgraph_deployment
            )));
        }

        let free_stake = self.network.free_stake(network, &self.indexer).await?;
        let post_close_free_stake = free_stake.saturating_add(allocation.allocated_tokens);
        if post_close_free_stake < amount {
            return Err(IndexerError::insufficient_capacity(
                &post_close_free_stake.to_string(),
                &amount.to_string(),
            ));
        }

        self.network.ensure_deployed(&allocation.subgraph_deployment).await?;

        let existing_ids = self.active_allocation_ids(network).await?;
        let epoch = self.network.epoch_info(network).await?;
        let new_allocation_id = derive_allocation_id(
            &self.mnemonic,
            epoch.number,
            &allocation.subgraph_deployment,
            &existing_ids,
        );

        let state = self.network.allocation_state(network, &new_allocation_id).await?;
        if state != AllocationStatus::Null {
            return Err(IndexerError::allocation_already_exists_onchain(&new_allocation_id.to_string()));
        }

        let proof = sign_allocation_id(&self.allocation_id_key, &self.indexer, &new_allocation_id);
        Ok(PreparedAction::Reallocate {
            closing_allocation_id: allocation_id,
            poi: resolved_poi,
            deployment: allocation.subgraph_deployment,
            allocation_id: new_allocation_id,
            amount,
            proof,
        })
    }
}
