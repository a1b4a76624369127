// SPDX-License-Identifier: Apache-2.0
//! In-memory `Store` test double. Implements the exact same trait as the
//! Postgres adapter so pure-logic tests elsewhere never need a database.

use crate::{ActionColumn, ActionFilter, OrderDirection, RuleKey, Store};
use async_trait::async_trait;
use chrono::Utc;
use indexer_common::{
    Action, AllocationId, CostModel, DeploymentId, IndexerError, IndexingRule, NetworkIdentifier,
    PoiDispute,
};
use std::sync::Mutex;

#[derive(Default)]
struct Tables {
    rules: Vec<IndexingRule>,
    actions: Vec<Action>,
    next_action_id: i64,
    cost_models: Vec<CostModel>,
    next_cost_model_id: i64,
    disputes: Vec<PoiDispute>,
}

/// An in-process, `Mutex`-guarded `Store`. Not persistent across process
/// restarts; intended for tests and single-node dry runs.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Construct an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        #[allow(clippy::unwrap_used)]
        self.tables.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn upsert_rule(&self, rule: IndexingRule) -> Result<IndexingRule, IndexerError> {
        let mut tables = self.lock();
        if let Some(existing) = tables
            .rules
            .iter_mut()
            .find(|r| r.identifier == rule.identifier && r.protocol_network == rule.protocol_network)
        {
            *existing = rule.clone();
        } else {
            tables.rules.push(rule.clone());
        }
        Ok(rule)
    }

    async fn fetch_rules(
        &self,
        merged: bool,
        network: Option<&NetworkIdentifier>,
    ) -> Result<Vec<IndexingRule>, IndexerError> {
        let tables = self.lock();
        let rows: Vec<IndexingRule> = tables
            .rules
            .iter()
            .filter(|r| network.is_none_or(|n| &r.protocol_network == n))
            .cloned()
            .collect();
        if !merged {
            return Ok(rows);
        }
        Ok(rows
            .iter()
            .map(|rule| {
                if rule.is_global() {
                    rule.clone()
                } else {
                    let global = rows
                        .iter()
                        .find(|g| g.is_global() && g.protocol_network == rule.protocol_network);
                    global.map_or_else(|| rule.clone(), |global| indexer_rules_merge(rule, global))
                }
            })
            .collect())
    }

    async fn delete_rules(&self, keys: &[RuleKey]) -> Result<u64, IndexerError> {
        let mut tables = self.lock();
        let mut deleted = 0u64;
        let mut reset_networks = Vec::new();
        for key in keys {
            let before = tables.rules.len();
            tables.rules.retain(|r| {
                !(r.identifier == key.identifier && r.protocol_network == key.protocol_network)
            });
            deleted += (before - tables.rules.len()) as u64;
            if key.identifier == indexer_common::GLOBAL_IDENTIFIER {
                reset_networks.push(key.protocol_network.clone());
            }
        }
        for network in reset_networks {
            tables.rules.push(IndexingRule::default_global(network));
        }
        Ok(deleted)
    }

    async fn find_actions(
        &self,
        filter: &ActionFilter,
        order_by: Option<ActionColumn>,
        order_dir: OrderDirection,
    ) -> Result<Vec<Action>, IndexerError> {
        let tables = self.lock();
        let now = Utc::now();
        let mut rows: Vec<Action> = tables
            .actions
            .iter()
            .filter(|a| filter.matches(a, now))
            .cloned()
            .collect();
        sort_actions(&mut rows, order_by, order_dir);
        Ok(rows)
    }

    async fn upsert_action(&self, mut action: Action) -> Result<Action, IndexerError> {
        let mut tables = self.lock();
        let now = Utc::now();

        if let Some(id) = action.id {
            let Some(existing) = tables.actions.iter_mut().find(|a| a.id == Some(id)) else {
                return Err(IndexerError::Constraint(format!(
                    "no action exists with id {id}"
                )));
            };
            action.created_at = existing.created_at;
            action.updated_at = Some(now);
            *existing = action.clone();
            return Ok(action);
        }

        tables.next_action_id += 1;
        action.id = Some(tables.next_action_id);
        action.created_at = Some(now);
        action.updated_at = Some(now);
        tables.actions.push(action.clone());
        Ok(action)
    }

    async fn delete_actions(&self, ids: &[i64]) -> Result<u64, IndexerError> {
        let mut tables = self.lock();
        let missing: Vec<i64> = ids
            .iter()
            .copied()
            .filter(|id| !tables.actions.iter().any(|a| a.id == Some(*id)))
            .collect();
        if !missing.is_empty() {
            return Err(IndexerError::actions_not_found(&missing));
        }
        let before = tables.actions.len();
        tables.actions.retain(|a| !a.id.is_some_and(|id| ids.contains(&id)));
        Ok((before - tables.actions.len()) as u64)
    }

    async fn latest_cost_models(
        &self,
        protocol_network: &NetworkIdentifier,
        deployments: Option<&[DeploymentId]>,
    ) -> Result<Vec<CostModel>, IndexerError> {
        let tables = self.lock();
        let mut latest: std::collections::HashMap<DeploymentId, CostModel> =
            std::collections::HashMap::new();
        for model in tables
            .cost_models
            .iter()
            .filter(|m| &m.protocol_network == protocol_network)
        {
            latest
                .entry(model.deployment.clone())
                .and_modify(|current| {
                    if model.id > current.id {
                        *current = model.clone();
                    }
                })
                .or_insert_with(|| model.clone());
        }
        let mut rows: Vec<CostModel> = match deployments {
            Some(wanted) => wanted
                .iter()
                .filter_map(|d| latest.get(d).cloned())
                .collect(),
            None => latest.into_values().collect(),
        };
        rows.sort_by(|a, b| a.deployment.cmp(&b.deployment));
        Ok(rows)
    }

    async fn insert_cost_model(&self, mut model: CostModel) -> Result<CostModel, IndexerError> {
        let mut tables = self.lock();
        tables.next_cost_model_id += 1;
        model.id = Some(tables.next_cost_model_id);
        model.created_at = Some(Utc::now());
        tables.cost_models.push(model.clone());
        Ok(model)
    }

    async fn delete_cost_models(&self, deployments: &[DeploymentId]) -> Result<u64, IndexerError> {
        let mut tables = self.lock();
        let before = tables.cost_models.len();
        tables.cost_models.retain(|m| !deployments.contains(&m.deployment));
        Ok((before - tables.cost_models.len()) as u64)
    }

    async fn upsert_dispute(&self, dispute: PoiDispute) -> Result<PoiDispute, IndexerError> {
        let mut tables = self.lock();
        if let Some(existing) = tables.disputes.iter_mut().find(|d| {
            d.allocation_id == dispute.allocation_id && d.protocol_network == dispute.protocol_network
        }) {
            let merged = existing.merged_with(&dispute);
            *existing = merged.clone();
            return Ok(merged);
        }
        tables.disputes.push(dispute.clone());
        Ok(dispute)
    }

    async fn find_disputes(
        &self,
        network: Option<&NetworkIdentifier>,
    ) -> Result<Vec<PoiDispute>, IndexerError> {
        let tables = self.lock();
        Ok(tables
            .disputes
            .iter()
            .filter(|d| network.is_none_or(|n| &d.protocol_network == n))
            .cloned()
            .collect())
    }

    async fn delete_disputes(&self, allocation_ids: &[AllocationId]) -> Result<u64, IndexerError> {
        let mut tables = self.lock();
        let before = tables.disputes.len();
        tables
            .disputes
            .retain(|d| !allocation_ids.contains(&d.allocation_id));
        Ok((before - tables.disputes.len()) as u64)
    }
}

fn sort_actions(rows: &mut [Action], order_by: Option<ActionColumn>, order_dir: OrderDirection) {
    use std::cmp::Ordering;
    rows.sort_by(|a, b| {
        let ordering = match order_by {
            None | Some(ActionColumn::Id) => a.id.cmp(&b.id),
            Some(ActionColumn::Status) => format!("{:?}", a.status).cmp(&format!("{:?}", b.status)),
            Some(ActionColumn::ActionType) => {
                format!("{:?}", a.action_type).cmp(&format!("{:?}", b.action_type))
            }
            Some(ActionColumn::DeploymentId) => a.deployment_id.cmp(&b.deployment_id),
            Some(ActionColumn::AllocationId) => a.allocation_id.cmp(&b.allocation_id),
            Some(ActionColumn::Priority) => a.priority.cmp(&b.priority),
            Some(ActionColumn::Source) => a.source.cmp(&b.source),
            Some(ActionColumn::ProtocolNetwork) => a.protocol_network.cmp(&b.protocol_network),
            Some(ActionColumn::CreatedAt) => a.created_at.cmp(&b.created_at),
            Some(ActionColumn::UpdatedAt) => a.updated_at.cmp(&b.updated_at),
        };
        let ordering = if matches!(order_dir, OrderDirection::Desc) {
            ordering.reverse()
        } else {
            ordering
        };
        // Tie-break by id ascending always, per `spec.md` §4.5.
        if ordering == Ordering::Equal {
            a.id.cmp(&b.id)
        } else {
            ordering
        }
    });
}

/// Tiny local copy of the merge algorithm so `MemoryStore::fetch_rules`
/// doesn't need to depend on `indexer-rules` (which itself depends on
/// `indexer-store` for the non-merged read path). The authoritative
/// implementation — used by the reconciler and API — lives in
/// `indexer_rules::merge`.
fn indexer_rules_merge(deployment: &IndexingRule, global: &IndexingRule) -> IndexingRule {
    IndexingRule {
        identifier: deployment.identifier.clone(),
        identifier_type: deployment.identifier_type,
        protocol_network: deployment.protocol_network.clone(),
        allocation_amount: deployment.allocation_amount.or(global.allocation_amount),
        parallel_allocations: deployment.parallel_allocations.or(global.parallel_allocations),
        max_allocation_percentage: deployment
            .max_allocation_percentage
            .or(global.max_allocation_percentage),
        min_signal: deployment.min_signal.or(global.min_signal),
        max_signal: deployment.max_signal.or(global.max_signal),
        min_stake: deployment.min_stake.or(global.min_stake),
        min_average_query_fees: deployment
            .min_average_query_fees
            .or(global.min_average_query_fees),
        allocation_lifetime: deployment.allocation_lifetime.or(global.allocation_lifetime),
        auto_renewal: deployment.auto_renewal.or(global.auto_renewal),
        custom: deployment.custom.clone().or_else(|| global.custom.clone()),
        decision_basis: deployment.decision_basis,
        require_supported: deployment.require_supported,
        safety: deployment.safety,
    }
}
