// SPDX-License-Identifier: Apache-2.0
//! The receipt-collector collaborator (`spec.md` §4.7/§6): notified of
//! every allocation opened or closed by a successful batch, independent
//! of the rule back-write the executor also performs.

use async_trait::async_trait;
use indexer_common::{AllocationId, DeploymentId, IndexerError, NetworkIdentifier};

/// Receives notifications of allocation opens/closes from a successful
/// batch. A no-op implementation is valid; production wiring hands
/// receipts to the query-fee/rebate collection pipeline, which is out of
/// scope for this crate.
#[async_trait]
pub trait ReceiptCollector: Send + Sync {
    /// A new allocation was opened.
    async fn allocation_opened(
        &self,
        network: &NetworkIdentifier,
        deployment: &DeploymentId,
        allocation_id: &AllocationId,
    ) -> Result<(), IndexerError>;

    /// An allocation was closed.
    async fn allocation_closed(
        &self,
        network: &NetworkIdentifier,
        allocation_id: &AllocationId,
    ) -> Result<(), IndexerError>;
}

/// A [`ReceiptCollector`] that does nothing, for deployments that do not
/// wire up downstream receipt processing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReceiptCollector;

#[async_trait]
impl ReceiptCollector for NoopReceiptCollector {
    async fn allocation_opened(
        &self,
        _network: &NetworkIdentifier,
        _deployment: &DeploymentId,
        _allocation_id: &AllocationId,
    ) -> Result<(), IndexerError> {
        Ok(())
    }

    async fn allocation_closed(
        &self,
        _network: &NetworkIdentifier,
        _allocation_id: &AllocationId,
    ) -> Result<(), IndexerError> {
        Ok(())
    }
}
