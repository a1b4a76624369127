// SPDX-License-Identifier: Apache-2.0
//! `findActions` filter support (`spec.md` §4.2, §6): all Action columns,
//! including relative time on `updatedAt`.

use chrono::{DateTime, Utc};
use indexer_common::{ActionStatus, ActionType, DeploymentId, NetworkIdentifier};

/// Any Action column, for ordering (`ActionParams` in `spec.md` §6) and
/// for naming which column a relative-time bound applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionColumn {
    /// `id`
    Id,
    /// `status`
    Status,
    /// `type`
    ActionType,
    /// `deploymentID`
    DeploymentId,
    /// `allocationID`
    AllocationId,
    /// `priority`
    Priority,
    /// `source`
    Source,
    /// `protocolNetwork`
    ProtocolNetwork,
    /// `createdAt`
    CreatedAt,
    /// `updatedAt`
    UpdatedAt,
}

/// Ascending or descending sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    /// Smallest/earliest first.
    #[default]
    Asc,
    /// Largest/latest first.
    Desc,
}

/// Filter for `findActions`/`actions(filter:)`. Every field is optional;
/// an empty filter matches everything. `updated_at_since` implements the
/// §4.2 relative-time requirement (`updatedAt >= now - delta`).
#[derive(Debug, Clone, Default)]
pub struct ActionFilter {
    /// Restrict to these ids.
    pub ids: Option<Vec<i64>>,
    /// Restrict to these statuses.
    pub statuses: Option<Vec<ActionStatus>>,
    /// Restrict to these action types.
    pub types: Option<Vec<ActionType>>,
    /// Restrict to this deployment.
    pub deployment_id: Option<DeploymentId>,
    /// Restrict to this allocation.
    pub allocation_id: Option<String>,
    /// Restrict to this originator tag.
    pub source: Option<String>,
    /// Restrict to this network.
    pub protocol_network: Option<NetworkIdentifier>,
    /// `updatedAt >= this` absolute bound.
    pub updated_at_at_least: Option<DateTime<Utc>>,
    /// `updatedAt >= now() - this` relative bound (mutually composable
    /// with `updated_at_at_least`; both, if present, must hold).
    pub updated_at_within: Option<chrono::Duration>,
}

impl ActionFilter {
    /// Convenience constructor matching a single non-terminal lookup by
    /// `(deployment, network)`, used by the queue's uniqueness check.
    pub fn by_deployment(deployment_id: DeploymentId, protocol_network: NetworkIdentifier) -> Self {
        Self {
            deployment_id: Some(deployment_id),
            protocol_network: Some(protocol_network),
            ..Self::default()
        }
    }

    /// `true` if `action` satisfies every populated field of this filter.
    #[must_use]
    pub fn matches(&self, action: &indexer_common::Action, now: DateTime<Utc>) -> bool {
        if let Some(ids) = &self.ids {
            if !action.id.is_some_and(|id| ids.contains(&id)) {
                return false;
            }
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&action.status) {
                return false;
            }
        }
        if let Some(types) = &self.types {
            if !types.contains(&action.action_type) {
                return false;
            }
        }
        if let Some(deployment_id) = &self.deployment_id {
            if &action.deployment_id != deployment_id {
                return false;
            }
        }
        if let Some(allocation_id) = &self.allocation_id {
            if action.allocation_id.as_ref().map(|a| &a.0) != Some(allocation_id) {
                return false;
            }
        }
        if let Some(source) = &self.source {
            if &action.source != source {
                return false;
            }
        }
        if let Some(protocol_network) = &self.protocol_network {
            if &action.protocol_network != protocol_network {
                return false;
            }
        }
        if let Some(bound) = self.updated_at_at_least {
            if action.updated_at.is_none_or(|updated| updated < bound) {
                return false;
            }
        }
        if let Some(within) = self.updated_at_within {
            let bound = now - within;
            if action.updated_at.is_none_or(|updated| updated < bound) {
                return false;
            }
        }
        true
    }
}
