// SPDX-License-Identifier: Apache-2.0
//! The "recently executed" throttle (`spec.md` §4.5, design note 9): a
//! time-bounded lookup into the Actions table, not an in-memory dedup
//! cache — modeled here as a pure predicate over whatever window of
//! actions the caller already fetched, so it stays independently
//! testable from the store.

use chrono::{DateTime, Duration, Utc};
use indexer_common::{Action, ActionType, DeploymentId, NetworkIdentifier};

/// `true` if `actions` contains a terminal (success/failed) action of
/// `action_type` against `(deployment, network)` whose `updated_at` falls
/// within `window` of `now`.
#[must_use]
pub fn recently_executed(
    actions: &[Action],
    deployment: &DeploymentId,
    network: &NetworkIdentifier,
    action_type: ActionType,
    window: Duration,
    now: DateTime<Utc>,
) -> bool {
    let cutoff = now - window;
    actions.iter().any(|action| {
        action.status.is_terminal_outcome()
            && action.action_type == action_type
            && &action.deployment_id == deployment
            && &action.protocol_network == network
            && action.updated_at.is_some_and(|updated| updated >= cutoff)
    })
}
