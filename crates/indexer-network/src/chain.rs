// SPDX-License-Identifier: Apache-2.0
//! Staking-contract read surface (`spec.md` §6: `getAllocationState`,
//! `getIndexerCapacity`, `maxAllocationEpochs`).

use crate::EpochInfo;
use async_trait::async_trait;
use indexer_common::{AllocationId, AllocationStatus, Grt, IndexerError, NetworkIdentifier};

/// Read-only staking contract access for one or more networks. Call
/// encoding and signing live outside this crate; an implementation here
/// owns only the read path.
#[async_trait]
pub trait StakingContractReader: Send + Sync {
    /// Current epoch number, its start block, and blocks elapsed since.
    async fn epoch_info(&self, network: &NetworkIdentifier) -> Result<EpochInfo, IndexerError>;

    /// The number of epochs an allocation may remain open before renewal
    /// or closure is expected.
    async fn max_allocation_epochs(&self, network: &NetworkIdentifier) -> Result<u64, IndexerError>;

    /// The operator's stake not currently committed to any allocation.
    async fn indexer_capacity(
        &self,
        network: &NetworkIdentifier,
        indexer: &str,
    ) -> Result<Grt, IndexerError>;

    /// On-chain lifecycle status of `allocation_id`; `Null` if it has
    /// never been opened.
    async fn allocation_state(
        &self,
        network: &NetworkIdentifier,
        allocation_id: &AllocationId,
    ) -> Result<AllocationStatus, IndexerError>;
}
