// SPDX-License-Identifier: Apache-2.0
//! Error taxonomy (`spec.md` §7).

use thiserror::Error;

/// The six error kinds from the error handling design, realized as a
/// single enum so callers can match on kind without string-parsing
/// `Display` output (`Display` still renders the literal wording some
/// scenarios in `spec.md` §8 require verbatim).
#[derive(Debug, Clone, Error)]
pub enum IndexerError {
    /// Malformed input: bad identifier grammar, missing required field,
    /// illegal network identifier. No retry.
    #[error("{0}")]
    Validation(String),

    /// Violates a data-model invariant: duplicate non-terminal action,
    /// deletion of a nonexistent action, allocation already exists on
    /// chain. No retry; idempotent callers may treat as success.
    #[error("{0}")]
    Constraint(String),

    /// Subgraph or chain read failed. Logged and retried on the next
    /// reconciler pass; never surfaced as an action failure unless
    /// attributable to a specific action's preparation.
    #[error("external read failed: {0}")]
    ExternalRead(String),

    /// An action-specific guard failed (capacity, epoch, allocation
    /// state). Recorded on the action; the batch continues with others.
    #[error("{0}")]
    Preparation(String),

    /// The atomic batch returned `paused`/`unauthorized`, or the receipt
    /// lacked an expected event.
    #[error("{0}")]
    Execution(String),

    /// Misconfiguration the process cannot recover from.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl IndexerError {
    /// Build a [`IndexerError::Constraint`] for the §3 duplicate-action
    /// rule, with the exact wording scenario S2 quotes.
    pub fn duplicate_action(deployment: &str) -> Self {
        Self::Constraint(format!(
            "Duplicate action found in queue that effects '{deployment}' but NOT \
             overwritten because it has a different source and/or status."
        ))
    }

    /// Build the §4.5 "not found" wording used by `approve`/`delete`.
    pub fn actions_not_found(ids: &[i64]) -> Self {
        let rendered = ids
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Self::Constraint(format!("No action items found with id in [{rendered}]"))
    }

    /// Build the §4.5/scenario S4 wording for an `unallocate`/`reallocate`
    /// whose `allocationID` is not currently `active` on chain.
    pub fn inactive_allocation(allocation_id: &str) -> Self {
        Self::Validation(format!(
            "An active allocation does not exist with id = '{allocation_id}'"
        ))
    }

    /// Build the §4.5 unpublished-deployment wording `queue` uses when the
    /// network monitor has no metadata for the targeted deployment.
    pub fn unpublished_deployment(deployment_id: &str) -> Self {
        Self::Validation(format!(
            "deployment '{deployment_id}' is not a published subgraph deployment on this network"
        ))
    }

    /// Build the §4.5 throttling wording: a terminal action of the same
    /// type recently targeted the same deployment.
    pub fn recently_executed(action_type: &str, deployment_id: &str) -> Self {
        Self::Constraint(format!(
            "Recently executed '{action_type}' action found in queue targeting '{deployment_id}'"
        ))
    }

    /// Build the §4.6 "allocate" guard wording for a deployment that
    /// already has an active allocation, quoting its id.
    pub fn existing_active_allocation(deployment: &str, allocation_id: &str) -> Self {
        Self::Preparation(format!(
            "deployment '{deployment}' already has an active allocation with id = '{allocation_id}'"
        ))
    }

    /// Build the §4.6 "insufficient-capacity" wording, quoting both the
    /// available and required amounts.
    pub fn insufficient_capacity(free_stake: &str, amount: &str) -> Self {
        Self::Preparation(format!(
            "insufficient-capacity: free stake {free_stake} is less than the requested amount \
             {amount}"
        ))
    }

    /// Build the §4.6 "already exists onchain" wording for a freshly
    /// derived allocation id that is not `Null` on chain.
    pub fn allocation_already_exists_onchain(allocation_id: &str) -> Self {
        Self::Preparation(format!("allocation '{allocation_id}' already exists onchain"))
    }

    /// Build the §4.6 "next permissible epoch" wording for a close
    /// attempted in the same epoch the allocation was opened.
    pub fn same_epoch_close(next_permissible_epoch: u64) -> Self {
        Self::Preparation(format!(
            "cannot close an allocation in the epoch it was opened; next permissible epoch is \
             {next_permissible_epoch}"
        ))
    }

    /// `true` for the two kinds that are safe to retry on the next
    /// reconciler pass without operator intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ExternalRead(_))
    }
}
