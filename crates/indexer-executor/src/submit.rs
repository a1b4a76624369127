// SPDX-License-Identifier: Apache-2.0
//! The external transaction primitive (`spec.md` §4.7, design note 9:
//! "batch atomicity as a design decision"): an ordered list of prepared
//! calls submitted as a single atomic multi-call, interpreted as either a
//! transaction-level outcome (`paused`/`unauthorized`) or the set of
//! on-chain events the receipt emitted.

use async_trait::async_trait;
use indexer_common::{AllocationId, DeploymentId, Grt, IndexerError, NetworkIdentifier};
use indexer_allocations::PreparedAction;

/// A single call within the multi-call, in submission order. Encoding is
/// opaque to this crate — `submit_multicall` implementations own the
/// ABI/calldata details; here it is carried as a serialized snapshot of
/// the [`PreparedAction`] it was built from.
#[derive(Debug, Clone)]
pub struct EncodedCall(pub Vec<u8>);

/// Serialize `prepared` into the call-data envelope this crate passes to
/// a [`TransactionSubmitter`]. Uses `serde_json` (already the workspace's
/// wire format) rather than real contract ABI encoding, which lives
/// outside a management-core crate.
#[must_use]
pub fn encode_call(prepared: &PreparedAction) -> EncodedCall {
    let wire = match prepared {
        PreparedAction::Allocate { deployment, amount, allocation_id, proof } => serde_json::json!({
            "kind": "allocate",
            "deployment": deployment.0,
            "amount": amount.to_string(),
            "allocationId": allocation_id.0,
            "proof": proof,
        }),
        PreparedAction::Unallocate { allocation_id, poi } => serde_json::json!({
            "kind": "unallocate",
            "allocationId": allocation_id.0,
            "poi": poi,
        }),
        PreparedAction::Reallocate { closing_allocation_id, poi, deployment, allocation_id, amount, proof } => serde_json::json!({
            "kind": "reallocate",
            "closingAllocationId": closing_allocation_id.0,
            "poi": poi,
            "deployment": deployment.0,
            "allocationId": allocation_id.0,
            "amount": amount.to_string(),
            "proof": proof,
        }),
    };
    EncodedCall(serde_json::to_vec(&wire).unwrap_or_default())
}

/// An on-chain event parsed from the multi-call's receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    /// A new allocation was opened against `subgraph_deployment`.
    AllocationCreated {
        /// Deployment the new allocation indexes.
        subgraph_deployment: DeploymentId,
        /// The allocation id that was opened.
        allocation_id: AllocationId,
    },
    /// An existing allocation was closed.
    AllocationClosed {
        /// The allocation id that was closed.
        allocation_id: AllocationId,
    },
    /// Indexing rewards were assigned to an allocation on close.
    RewardsAssigned {
        /// The allocation the rewards were assigned to.
        allocation_id: AllocationId,
        /// The reward amount.
        amount: Grt,
    },
}

/// The transaction-level result of submitting a multi-call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The operator is currently paused; every call in the batch fails.
    Paused,
    /// The operator is not authorized; every call in the batch fails.
    Unauthorized,
    /// The multi-call was mined; these are the events its receipt
    /// contained, in no particular order.
    Events(Vec<ChainEvent>),
}

/// The external transaction primitive: submits an ordered, atomic
/// multi-call and reports its outcome. Signing, gas estimation, and
/// actual chain submission all live behind this seam.
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Submit `calls` as a single atomic multi-call against `network`.
    async fn submit_multicall(
        &self,
        network: &NetworkIdentifier,
        calls: &[EncodedCall],
    ) -> Result<BatchOutcome, IndexerError>;
}
