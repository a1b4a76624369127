// SPDX-License-Identifier: Apache-2.0
//! Target allocation set computation and the diff against actuals
//! (`spec.md` §4.8, steps 3-5). Pure: takes already-fetched rules and
//! allocations, returns the [`Action`]s the reconciler should try to
//! queue. Duplicate-suppression against currently non-terminal actions is
//! the queue's job (§3 invariant), not this module's.

use indexer_common::{Action, ActionStatus, ActionType, Allocation, DeploymentId, Grt, IndexingRule, NetworkIdentifier};

fn new_action(
    action_type: ActionType,
    deployment_id: DeploymentId,
    allocation_id: Option<indexer_common::AllocationId>,
    amount: Option<Grt>,
    network: &NetworkIdentifier,
    reason: &str,
) -> Action {
    Action {
        id: None,
        status: ActionStatus::Queued,
        action_type,
        deployment_id,
        allocation_id,
        amount,
        poi: None,
        force: false,
        priority: 0,
        source: "indexerAgent".to_owned(),
        reason: Some(reason.to_owned()),
        is_legacy: false,
        syncing_network: None,
        transaction: None,
        failure_reason: None,
        protocol_network: network.clone(),
        created_at: None,
        updated_at: None,
    }
}

/// Per-slot stake for a `manage` rule: `allocationAmount / parallelAllocations`,
/// floor-divided and zero if either is unset or zero.
#[must_use]
pub fn per_slot_amount(rule: &IndexingRule) -> Grt {
    let parallel = u128::from(rule.parallel_allocations.unwrap_or(1).max(1));
    let total = rule.allocation_amount.unwrap_or(Grt::ZERO).0;
    Grt(total / parallel)
}

/// Diff a single `manage` deployment's live allocations against its
/// rule's target, per `spec.md` §4.8 steps 3-4.
#[must_use]
pub fn diff_managed_deployment(
    rule: &IndexingRule,
    deployment: &DeploymentId,
    active: &[Allocation],
    epoch_now: u64,
    network: &NetworkIdentifier,
) -> Vec<Action> {
    let mut actions = Vec::new();
    let target_parallel = rule.parallel_allocations.unwrap_or(1).max(1);
    let slot = per_slot_amount(rule);

    let missing = target_parallel.saturating_sub(u32::try_from(active.len()).unwrap_or(u32::MAX));
    for _ in 0..missing {
        actions.push(new_action(
            ActionType::Allocate,
            deployment.clone(),
            None,
            Some(slot),
            network,
            "reconciler: filling target allocation slot",
        ));
    }

    if let Some(lifetime) = rule.allocation_lifetime {
        for allocation in active {
            let age = epoch_now.saturating_sub(allocation.created_at_epoch);
            if age < lifetime {
                continue;
            }
            if rule.auto_renewal.unwrap_or(false) {
                actions.push(new_action(
                    ActionType::Reallocate,
                    deployment.clone(),
                    Some(allocation.id.clone()),
                    Some(allocation.allocated_tokens),
                    network,
                    "reconciler: renewing an allocation past its lifetime",
                ));
            } else {
                actions.push(new_action(
                    ActionType::Unallocate,
                    deployment.clone(),
                    Some(allocation.id.clone()),
                    None,
                    network,
                    "reconciler: closing an allocation past its lifetime",
                ));
            }
        }
    }

    actions
}

/// Close every allocation in `active` because its deployment has moved
/// out of the `manage` partition (`spec.md` §4.8 step 4, third bullet).
#[must_use]
pub fn unallocate_out_of_scope(active: &[Allocation], network: &NetworkIdentifier) -> Vec<Action> {
    active
        .iter()
        .map(|allocation| {
            new_action(
                ActionType::Unallocate,
                allocation.subgraph_deployment.clone(),
                Some(allocation.id.clone()),
                None,
                network,
                "reconciler: deployment no longer in the managed partition",
            )
        })
        .collect()
}
