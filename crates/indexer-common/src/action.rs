// SPDX-License-Identifier: Apache-2.0
//! `Action` — a pending on-chain state change (`spec.md` §3).

use crate::{AllocationId, DeploymentId, Grt, IndexerError, NetworkIdentifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Forward-only lifecycle state of an [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    /// Queued, awaiting operator approval.
    Queued,
    /// Approved, awaiting the next batch.
    Approved,
    /// Picked up by a batch and being prepared/submitted.
    Deploying,
    /// Submitted on chain, awaiting receipt.
    Pending,
    /// Receipt confirmed the expected on-chain event.
    Success,
    /// Preparation or execution failed.
    Failed,
    /// Canceled by an operator before execution.
    Canceled,
}

impl ActionStatus {
    /// `true` for queued/approved/deploying/pending — the "non-terminal"
    /// set that the §3 uniqueness invariant applies to.
    pub fn is_non_terminal(self) -> bool {
        matches!(
            self,
            Self::Queued | Self::Approved | Self::Deploying | Self::Pending
        )
    }

    /// `true` for success/failed — the set §4.5 throttling looks at.
    pub fn is_terminal_outcome(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

/// The closed set of mutation kinds (design note 9: "polymorphism over
/// action types" — a tagged-variant union, not open extensibility).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Open a new allocation.
    Allocate,
    /// Close an existing allocation.
    Unallocate,
    /// Close and immediately reopen an allocation (renewal).
    Reallocate,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Allocate => "allocate",
            Self::Unallocate => "unallocate",
            Self::Reallocate => "reallocate",
        };
        f.write_str(name)
    }
}

/// A pending or completed state change against the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Monotonically increasing id, assigned by the store on insert.
    pub id: Option<i64>,
    /// Current lifecycle state.
    pub status: ActionStatus,
    /// Which mutation this is.
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// Deployment this action targets.
    pub deployment_id: DeploymentId,
    /// Allocation this action targets (required for unallocate/reallocate).
    pub allocation_id: Option<AllocationId>,
    /// Stake amount (required for allocate/reallocate).
    pub amount: Option<Grt>,
    /// User-supplied proof of indexing, if any.
    pub poi: Option<String>,
    /// Skip the usual safety checks when preparing this action.
    pub force: bool,
    /// Queue ordering priority; higher runs first within a batch.
    pub priority: i32,
    /// Free-form originator tag (e.g. `"indexerAgent"`, an operator id).
    pub source: String,
    /// Human-readable justification.
    pub reason: Option<String>,
    /// `true` if this action predates the current action-queue schema.
    pub is_legacy: bool,
    /// `true` if the targeted deployment is still syncing.
    pub syncing_network: Option<String>,
    /// Chain transaction hash, once submitted.
    pub transaction: Option<String>,
    /// Why this action failed, if it did.
    pub failure_reason: Option<String>,
    /// Network this action executes against.
    pub protocol_network: NetworkIdentifier,
    /// Creation timestamp, computed at write time (design note 9a: some
    /// mutation inputs omit timestamps; they are optional on the wire and
    /// filled in by the store).
    pub created_at: Option<DateTime<Utc>>,
    /// Last-update timestamp, computed at write time.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Action {
    /// Validate the type-specific required fields from `spec.md` §3:
    /// allocate needs `(deployment_id, amount)`; unallocate needs
    /// `(deployment_id, allocation_id)`; reallocate needs
    /// `(deployment_id, allocation_id, amount)`.
    pub fn validate_required_fields(&self) -> Result<(), IndexerError> {
        match self.action_type {
            ActionType::Allocate => {
                if self.amount.is_none() {
                    return Err(IndexerError::Validation(format!(
                        "allocate action for deployment '{}' is missing required field 'amount'",
                        self.deployment_id
                    )));
                }
            }
            ActionType::Unallocate => {
                if self.allocation_id.is_none() {
                    return Err(IndexerError::Validation(format!(
                        "unallocate action for deployment '{}' is missing required field \
                         'allocationID'",
                        self.deployment_id
                    )));
                }
            }
            ActionType::Reallocate => {
                if self.allocation_id.is_none() || self.amount.is_none() {
                    return Err(IndexerError::Validation(format!(
                        "reallocate action for deployment '{}' is missing required field(s) \
                         'allocationID' and/or 'amount'",
                        self.deployment_id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Does this action target the same `(deployment, network)` pair as
    /// `other`? Used by the §3 uniqueness invariant.
    pub fn same_target(&self, other: &Self) -> bool {
        self.deployment_id == other.deployment_id && self.protocol_network == other.protocol_network
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(action_type: ActionType) -> Action {
        Action {
            id: None,
            status: ActionStatus::Queued,
            action_type,
            deployment_id: DeploymentId::from("Qmew9PZUJCoDzXqqU6vGyTENTKHrrN4dy5h94kertfudqy"),
            allocation_id: None,
            amount: None,
            poi: None,
            force: false,
            priority: 0,
            source: "indexerAgent".to_owned(),
            reason: None,
            is_legacy: false,
            syncing_network: None,
            transaction: None,
            failure_reason: None,
            protocol_network: NetworkIdentifier::new("eip155:1"),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn allocate_requires_amount() {
        let action = base(ActionType::Allocate);
        assert!(action.validate_required_fields().is_err());
        let mut with_amount = action;
        with_amount.amount = Some(Grt(10_000));
        assert!(with_amount.validate_required_fields().is_ok());
    }

    #[test]
    fn unallocate_requires_allocation_id() {
        let action = base(ActionType::Unallocate);
        assert!(action.validate_required_fields().is_err());
        let mut with_id = action;
        with_id.allocation_id = Some(AllocationId::from("0xabc"));
        assert!(with_id.validate_required_fields().is_ok());
    }

    #[test]
    fn reallocate_requires_both() {
        let action = base(ActionType::Reallocate);
        assert!(action.validate_required_fields().is_err());
        let mut partial = action.clone();
        partial.allocation_id = Some(AllocationId::from("0xabc"));
        assert!(partial.validate_required_fields().is_err());
        let mut full = action;
        full.allocation_id = Some(AllocationId::from("0xabc"));
        full.amount = Some(Grt(10_000));
        assert!(full.validate_required_fields().is_ok());
    }

    #[test]
    fn non_terminal_set_matches_spec() {
        assert!(ActionStatus::Queued.is_non_terminal());
        assert!(ActionStatus::Approved.is_non_terminal());
        assert!(ActionStatus::Deploying.is_non_terminal());
        assert!(ActionStatus::Pending.is_non_terminal());
        assert!(!ActionStatus::Success.is_non_terminal());
        assert!(!ActionStatus::Failed.is_non_terminal());
        assert!(!ActionStatus::Canceled.is_non_terminal());
    }
}
