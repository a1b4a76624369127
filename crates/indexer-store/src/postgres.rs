// SPDX-License-Identifier: Apache-2.0
//! Postgres-backed `Store`, built on `sqlx`. Gated behind the
//! `integration-tests` feature so the rest of the workspace can be
//! exercised (and built) without a reachable database.

use crate::{ActionColumn, ActionFilter, OrderDirection, RuleKey, Store};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexer_common::{
    Action, ActionStatus, ActionType, AllocationId, CostModel, DecisionBasis, DeploymentId,
    IdentifierType, IndexerError, IndexingRule, NetworkIdentifier, PoiDispute,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

/// A `Store` implementation backed by a Postgres connection pool.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to `database_url` and run any pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, IndexerError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| IndexerError::Fatal(format!("could not connect to store: {e}")))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| IndexerError::Fatal(format!("migration failed: {e}")))?;
        Ok(Self { pool })
    }

    /// Wrap an already-constructed pool (used by tests that set up their
    /// own throwaway schema).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn encode_status(status: ActionStatus) -> &'static str {
    match status {
        ActionStatus::Queued => "queued",
        ActionStatus::Approved => "approved",
        ActionStatus::Deploying => "deploying",
        ActionStatus::Pending => "pending",
        ActionStatus::Success => "success",
        ActionStatus::Failed => "failed",
        ActionStatus::Canceled => "canceled",
    }
}

fn decode_status(raw: &str) -> Result<ActionStatus, IndexerError> {
    Ok(match raw {
        "queued" => ActionStatus::Queued,
        "approved" => ActionStatus::Approved,
        "deploying" => ActionStatus::Deploying,
        "pending" => ActionStatus::Pending,
        "success" => ActionStatus::Success,
        "failed" => ActionStatus::Failed,
        "canceled" => ActionStatus::Canceled,
        other => {
            return Err(IndexerError::Fatal(format!(
                "unknown action status stored in database: '{other}'"
            )))
        }
    })
}

fn encode_action_type(action_type: ActionType) -> &'static str {
    match action_type {
        ActionType::Allocate => "allocate",
        ActionType::Unallocate => "unallocate",
        ActionType::Reallocate => "reallocate",
    }
}

fn decode_action_type(raw: &str) -> Result<ActionType, IndexerError> {
    Ok(match raw {
        "allocate" => ActionType::Allocate,
        "unallocate" => ActionType::Unallocate,
        "reallocate" => ActionType::Reallocate,
        other => {
            return Err(IndexerError::Fatal(format!(
                "unknown action type stored in database: '{other}'"
            )))
        }
    })
}

fn encode_identifier_type(identifier_type: IdentifierType) -> &'static str {
    match identifier_type {
        IdentifierType::Deployment => "deployment",
        IdentifierType::Subgraph => "subgraph",
        IdentifierType::Group => "group",
    }
}

fn decode_identifier_type(raw: &str) -> Result<IdentifierType, IndexerError> {
    Ok(match raw {
        "deployment" => IdentifierType::Deployment,
        "subgraph" => IdentifierType::Subgraph,
        "group" => IdentifierType::Group,
        other => {
            return Err(IndexerError::Fatal(format!(
                "unknown identifier type stored in database: '{other}'"
            )))
        }
    })
}

fn encode_decision_basis(basis: DecisionBasis) -> &'static str {
    match basis {
        DecisionBasis::Rules => "rules",
        DecisionBasis::Never => "never",
        DecisionBasis::Always => "always",
        DecisionBasis::Offchain => "offchain",
        DecisionBasis::Dips => "dips",
    }
}

fn decode_decision_basis(raw: &str) -> Result<DecisionBasis, IndexerError> {
    Ok(match raw {
        "rules" => DecisionBasis::Rules,
        "never" => DecisionBasis::Never,
        "always" => DecisionBasis::Always,
        "offchain" => DecisionBasis::Offchain,
        "dips" => DecisionBasis::Dips,
        other => {
            return Err(IndexerError::Fatal(format!(
                "unknown decision basis stored in database: '{other}'"
            )))
        }
    })
}

fn grt_to_sql(value: Option<indexer_common::Grt>) -> Option<String> {
    value.map(|g| g.to_string())
}

fn grt_from_sql(raw: Option<String>) -> Result<Option<indexer_common::Grt>, IndexerError> {
    raw.map(|s| {
        s.parse::<indexer_common::Grt>()
            .map_err(|e| IndexerError::Fatal(format!("corrupt GRT value in database: {e}")))
    })
    .transpose()
}

#[derive(sqlx::FromRow)]
struct RuleRow {
    identifier: String,
    identifier_type: String,
    protocol_network: String,
    allocation_amount: Option<String>,
    parallel_allocations: Option<i32>,
    max_allocation_percentage: Option<f64>,
    min_signal: Option<String>,
    max_signal: Option<String>,
    min_stake: Option<String>,
    min_average_query_fees: Option<String>,
    allocation_lifetime: Option<i64>,
    auto_renewal: Option<bool>,
    custom: Option<serde_json::Value>,
    decision_basis: String,
    require_supported: bool,
    safety: bool,
}

impl RuleRow {
    fn into_domain(self) -> Result<IndexingRule, IndexerError> {
        Ok(IndexingRule {
            identifier: self.identifier,
            identifier_type: decode_identifier_type(&self.identifier_type)?,
            protocol_network: NetworkIdentifier::new(self.protocol_network),
            allocation_amount: grt_from_sql(self.allocation_amount)?,
            parallel_allocations: self.parallel_allocations.map(|v| v.max(0) as u32),
            max_allocation_percentage: self.max_allocation_percentage,
            min_signal: grt_from_sql(self.min_signal)?,
            max_signal: grt_from_sql(self.max_signal)?,
            min_stake: grt_from_sql(self.min_stake)?,
            min_average_query_fees: grt_from_sql(self.min_average_query_fees)?,
            allocation_lifetime: self.allocation_lifetime.map(|v| v.max(0) as u64),
            auto_renewal: self.auto_renewal,
            custom: self.custom,
            decision_basis: decode_decision_basis(&self.decision_basis)?,
            require_supported: self.require_supported,
            safety: self.safety,
        })
    }
}

async fn reinsert_default_global(
    tx: &mut Transaction<'_, Postgres>,
    network: &NetworkIdentifier,
) -> Result<(), IndexerError> {
    let defaults = IndexingRule::default_global(network.clone());
    sqlx::query(
        r#"INSERT INTO "IndexingRules"
            (identifier, identifier_type, protocol_network, allocation_amount,
             parallel_allocations, max_allocation_percentage, min_signal, max_signal,
             min_stake, min_average_query_fees, allocation_lifetime, auto_renewal,
             custom, decision_basis, require_supported, safety)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
           ON CONFLICT (identifier, protocol_network) DO UPDATE SET
             identifier_type = EXCLUDED.identifier_type,
             allocation_amount = EXCLUDED.allocation_amount,
             parallel_allocations = EXCLUDED.parallel_allocations,
             max_allocation_percentage = EXCLUDED.max_allocation_percentage,
             min_signal = EXCLUDED.min_signal,
             max_signal = EXCLUDED.max_signal,
             min_stake = EXCLUDED.min_stake,
             min_average_query_fees = EXCLUDED.min_average_query_fees,
             allocation_lifetime = EXCLUDED.allocation_lifetime,
             auto_renewal = EXCLUDED.auto_renewal,
             custom = EXCLUDED.custom,
             decision_basis = EXCLUDED.decision_basis,
             require_supported = EXCLUDED.require_supported,
             safety = EXCLUDED.safety"#,
    )
    .bind(&defaults.identifier)
    .bind(encode_identifier_type(defaults.identifier_type))
    .bind(&defaults.protocol_network.0)
    .bind(grt_to_sql(defaults.allocation_amount))
    .bind(defaults.parallel_allocations.map(|v| v as i32))
    .bind(defaults.max_allocation_percentage)
    .bind(grt_to_sql(defaults.min_signal))
    .bind(grt_to_sql(defaults.max_signal))
    .bind(grt_to_sql(defaults.min_stake))
    .bind(grt_to_sql(defaults.min_average_query_fees))
    .bind(defaults.allocation_lifetime.map(|v| v as i64))
    .bind(defaults.auto_renewal)
    .bind(defaults.custom)
    .bind(encode_decision_basis(defaults.decision_basis))
    .bind(defaults.require_supported)
    .bind(defaults.safety)
    .execute(&mut **tx)
    .await
    .map_err(|e| IndexerError::Fatal(format!("store write failed: {e}")))?;
    Ok(())
}

#[async_trait]
impl Store for PostgresStore {
    async fn upsert_rule(&self, rule: IndexingRule) -> Result<IndexingRule, IndexerError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| IndexerError::Fatal(e.to_string()))?;
        sqlx::query(
            r#"INSERT INTO "IndexingRules"
                (identifier, identifier_type, protocol_network, allocation_amount,
                 parallel_allocations, max_allocation_percentage, min_signal, max_signal,
                 min_stake, min_average_query_fees, allocation_lifetime, auto_renewal,
                 custom, decision_basis, require_supported, safety)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
               ON CONFLICT (identifier, protocol_network) DO UPDATE SET
                 identifier_type = EXCLUDED.identifier_type,
                 allocation_amount = EXCLUDED.allocation_amount,
                 parallel_allocations = EXCLUDED.parallel_allocations,
                 max_allocation_percentage = EXCLUDED.max_allocation_percentage,
                 min_signal = EXCLUDED.min_signal,
                 max_signal = EXCLUDED.max_signal,
                 min_stake = EXCLUDED.min_stake,
                 min_average_query_fees = EXCLUDED.min_average_query_fees,
                 allocation_lifetime = EXCLUDED.allocation_lifetime,
                 auto_renewal = EXCLUDED.auto_renewal,
                 custom = EXCLUDED.custom,
                 decision_basis = EXCLUDED.decision_basis,
                 require_supported = EXCLUDED.require_supported,
                 safety = EXCLUDED.safety"#,
        )
        .bind(&rule.identifier)
        .bind(encode_identifier_type(rule.identifier_type))
        .bind(&rule.protocol_network.0)
        .bind(grt_to_sql(rule.allocation_amount))
        .bind(rule.parallel_allocations.map(|v| v as i32))
        .bind(rule.max_allocation_percentage)
        .bind(grt_to_sql(rule.min_signal))
        .bind(grt_to_sql(rule.max_signal))
        .bind(grt_to_sql(rule.min_stake))
        .bind(grt_to_sql(rule.min_average_query_fees))
        .bind(rule.allocation_lifetime.map(|v| v as i64))
        .bind(rule.auto_renewal)
        .bind(rule.custom.clone())
        .bind(encode_decision_basis(rule.decision_basis))
        .bind(rule.require_supported)
        .bind(rule.safety)
        .execute(&mut *tx)
        .await
        .map_err(|e| IndexerError::Fatal(format!("store write failed: {e}")))?;
        tx.commit().await.map_err(|e| IndexerError::Fatal(e.to_string()))?;
        Ok(rule)
    }

    async fn fetch_rules(
        &self,
        merged: bool,
        network: Option<&NetworkIdentifier>,
    ) -> Result<Vec<IndexingRule>, IndexerError> {
        let rows: Vec<RuleRow> = sqlx::query_as(
            r#"SELECT identifier, identifier_type, protocol_network, allocation_amount,
                      parallel_allocations, max_allocation_percentage, min_signal, max_signal,
                      min_stake, min_average_query_fees, allocation_lifetime, auto_renewal,
                      custom, decision_basis, require_supported, safety
               FROM "IndexingRules"
               WHERE $1::text IS NULL OR protocol_network = $1"#,
        )
        .bind(network.map(|n| n.0.clone()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| IndexerError::ExternalRead(e.to_string()))?;

        let rules = rows
            .into_iter()
            .map(RuleRow::into_domain)
            .collect::<Result<Vec<_>, _>>()?;

        if !merged {
            return Ok(rules);
        }
        Ok(rules
            .iter()
            .map(|rule| {
                if rule.is_global() {
                    rule.clone()
                } else {
                    rules
                        .iter()
                        .find(|g| g.is_global() && g.protocol_network == rule.protocol_network)
                        .map_or_else(|| rule.clone(), |global| indexer_rules_merge(rule, global))
                }
            })
            .collect())
    }

    async fn delete_rules(&self, keys: &[RuleKey]) -> Result<u64, IndexerError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| IndexerError::Fatal(e.to_string()))?;
        let mut deleted = 0u64;
        let mut reset_networks = Vec::new();
        for key in keys {
            let result = sqlx::query(
                r#"DELETE FROM "IndexingRules" WHERE identifier = $1 AND protocol_network = $2"#,
            )
            .bind(&key.identifier)
            .bind(&key.protocol_network.0)
            .execute(&mut *tx)
            .await
            .map_err(|e| IndexerError::Fatal(e.to_string()))?;
            deleted += result.rows_affected();
            if key.identifier == indexer_common::GLOBAL_IDENTIFIER {
                reset_networks.push(key.protocol_network.clone());
            }
        }
        for network in &reset_networks {
            reinsert_default_global(&mut tx, network).await?;
        }
        tx.commit().await.map_err(|e| IndexerError::Fatal(e.to_string()))?;
        Ok(deleted)
    }

    async fn find_actions(
        &self,
        filter: &ActionFilter,
        order_by: Option<ActionColumn>,
        order_dir: OrderDirection,
    ) -> Result<Vec<Action>, IndexerError> {
        // A hand-built WHERE clause (rather than `query_as!`) because the
        // filter is fully dynamic — every field is independently optional.
        let mut clauses: Vec<String> = Vec::new();
        let mut binder = sqlx::QueryBuilder::<Postgres>::new(
            r#"SELECT id, status, type, deployment_id, allocation_id, amount, poi, force,
                      priority, source, reason, is_legacy, syncing_network, transaction,
                      failure_reason, protocol_network, created_at, updated_at
               FROM "Actions""#,
        );
        let mut first = true;
        macro_rules! push_clause {
            ($cond:expr) => {{
                binder.push(if first { " WHERE " } else { " AND " });
                first = false;
                $cond
            }};
        }
        if let Some(ids) = &filter.ids {
            push_clause!({
                binder.push("id = ANY(");
                binder.push_bind(ids.clone());
                binder.push(")");
            });
        }
        if let Some(deployment_id) = &filter.deployment_id {
            push_clause!({
                binder.push("deployment_id = ");
                binder.push_bind(deployment_id.0.clone());
            });
        }
        if let Some(source) = &filter.source {
            push_clause!({
                binder.push("source = ");
                binder.push_bind(source.clone());
            });
        }
        if let Some(protocol_network) = &filter.protocol_network {
            push_clause!({
                binder.push("protocol_network = ");
                binder.push_bind(protocol_network.0.clone());
            });
        }
        if let Some(allocation_id) = &filter.allocation_id {
            push_clause!({
                binder.push("allocation_id = ");
                binder.push_bind(allocation_id.clone());
            });
        }
        if let Some(bound) = filter.updated_at_at_least {
            push_clause!({
                binder.push("updated_at >= ");
                binder.push_bind(bound);
            });
        }
        if let Some(within) = filter.updated_at_within {
            push_clause!({
                binder.push("updated_at >= now() - ");
                binder.push_bind(within);
            });
        }
        let _ = &clauses;

        let order_column = match order_by {
            None | Some(ActionColumn::Id) => "id",
            Some(ActionColumn::Status) => "status",
            Some(ActionColumn::ActionType) => "type",
            Some(ActionColumn::DeploymentId) => "deployment_id",
            Some(ActionColumn::AllocationId) => "allocation_id",
            Some(ActionColumn::Priority) => "priority",
            Some(ActionColumn::Source) => "source",
            Some(ActionColumn::ProtocolNetwork) => "protocol_network",
            Some(ActionColumn::CreatedAt) => "created_at",
            Some(ActionColumn::UpdatedAt) => "updated_at",
        };
        let direction = if matches!(order_dir, OrderDirection::Desc) {
            "DESC"
        } else {
            "ASC"
        };
        binder.push(format!(" ORDER BY {order_column} {direction}, id ASC"));

        let rows = binder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| IndexerError::ExternalRead(e.to_string()))?;

        rows.into_iter().map(row_to_action).collect()
    }

    async fn upsert_action(&self, action: Action) -> Result<Action, IndexerError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| IndexerError::Fatal(e.to_string()))?;

        let existing_id: Option<i64> = if let Some(id) = action.id {
            Some(id)
        } else {
            sqlx::query_scalar(
                r#"SELECT id FROM "Actions"
                   WHERE deployment_id = $1 AND protocol_network = $2
                     AND status IN ('queued', 'approved', 'deploying', 'pending')"#,
            )
            .bind(&action.deployment_id.0)
            .bind(&action.protocol_network.0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| IndexerError::Fatal(e.to_string()))?
        };

        let stored: ActionRow = if let Some(id) = existing_id {
            sqlx::query_as(
                r#"UPDATE "Actions" SET
                    status = $2, type = $3, deployment_id = $4, allocation_id = $5,
                    amount = $6, poi = $7, force = $8, priority = $9, source = $10,
                    reason = $11, is_legacy = $12, syncing_network = $13, transaction = $14,
                    failure_reason = $15, protocol_network = $16, updated_at = now()
                   WHERE id = $1
                   RETURNING id, status, type, deployment_id, allocation_id, amount, poi,
                             force, priority, source, reason, is_legacy, syncing_network,
                             transaction, failure_reason, protocol_network, created_at, updated_at"#,
            )
            .bind(id)
            .bind(encode_status(action.status))
            .bind(encode_action_type(action.action_type))
            .bind(&action.deployment_id.0)
            .bind(action.allocation_id.as_ref().map(|a| a.0.clone()))
            .bind(grt_to_sql(action.amount))
            .bind(&action.poi)
            .bind(action.force)
            .bind(action.priority)
            .bind(&action.source)
            .bind(&action.reason)
            .bind(action.is_legacy)
            .bind(&action.syncing_network)
            .bind(&action.transaction)
            .bind(&action.failure_reason)
            .bind(&action.protocol_network.0)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| IndexerError::Fatal(format!("store write failed: {e}")))?
        } else {
            sqlx::query_as(
                r#"INSERT INTO "Actions"
                    (status, type, deployment_id, allocation_id, amount, poi, force,
                     priority, source, reason, is_legacy, syncing_network, transaction,
                     failure_reason, protocol_network)
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                   RETURNING id, status, type, deployment_id, allocation_id, amount, poi,
                             force, priority, source, reason, is_legacy, syncing_network,
                             transaction, failure_reason, protocol_network, created_at, updated_at"#,
            )
            .bind(encode_status(action.status))
            .bind(encode_action_type(action.action_type))
            .bind(&action.deployment_id.0)
            .bind(action.allocation_id.as_ref().map(|a| a.0.clone()))
            .bind(grt_to_sql(action.amount))
            .bind(&action.poi)
            .bind(action.force)
            .bind(action.priority)
            .bind(&action.source)
            .bind(&action.reason)
            .bind(action.is_legacy)
            .bind(&action.syncing_network)
            .bind(&action.transaction)
            .bind(&action.failure_reason)
            .bind(&action.protocol_network.0)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| IndexerError::Fatal(format!("store write failed: {e}")))?
        };

        tx.commit().await.map_err(|e| IndexerError::Fatal(e.to_string()))?;
        row_to_action(stored)
    }

    async fn delete_actions(&self, ids: &[i64]) -> Result<u64, IndexerError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| IndexerError::Fatal(e.to_string()))?;
        let existing: Vec<i64> = sqlx::query_scalar(r#"SELECT id FROM "Actions" WHERE id = ANY($1)"#)
            .bind(ids)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| IndexerError::Fatal(e.to_string()))?;
        let missing: Vec<i64> = ids.iter().copied().filter(|id| !existing.contains(id)).collect();
        if !missing.is_empty() {
            return Err(IndexerError::actions_not_found(&missing));
        }
        let result = sqlx::query(r#"DELETE FROM "Actions" WHERE id = ANY($1)"#)
            .bind(ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| IndexerError::Fatal(e.to_string()))?;
        tx.commit().await.map_err(|e| IndexerError::Fatal(e.to_string()))?;
        Ok(result.rows_affected())
    }

    async fn latest_cost_models(
        &self,
        protocol_network: &NetworkIdentifier,
        deployments: Option<&[DeploymentId]>,
    ) -> Result<Vec<CostModel>, IndexerError> {
        let wanted: Option<Vec<String>> =
            deployments.map(|ds| ds.iter().map(|d| d.0.clone()).collect());
        let rows: Vec<CostModelRow> = sqlx::query_as(
            r#"SELECT DISTINCT ON (deployment) id, deployment, protocol_network, model,
                      variables, created_at
               FROM "CostModelsHistory"
               WHERE protocol_network = $1
                 AND ($2::text[] IS NULL OR deployment = ANY($2))
               ORDER BY deployment, id DESC"#,
        )
        .bind(&protocol_network.0)
        .bind(wanted)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| IndexerError::ExternalRead(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|r| CostModel {
                id: Some(r.id),
                deployment: DeploymentId(r.deployment),
                protocol_network: NetworkIdentifier::new(r.protocol_network),
                model: r.model,
                variables: r.variables,
                created_at: Some(r.created_at),
            })
            .collect())
    }

    async fn insert_cost_model(&self, model: CostModel) -> Result<CostModel, IndexerError> {
        let row: (i64, DateTime<Utc>) = sqlx::query_as(
            r#"INSERT INTO "CostModelsHistory" (deployment, protocol_network, model, variables)
               VALUES ($1, $2, $3, $4)
               RETURNING id, created_at"#,
        )
        .bind(&model.deployment.0)
        .bind(&model.protocol_network.0)
        .bind(&model.model)
        .bind(&model.variables)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| IndexerError::Fatal(format!("store write failed: {e}")))?;
        Ok(CostModel {
            id: Some(row.0),
            created_at: Some(row.1),
            ..model
        })
    }

    async fn delete_cost_models(&self, deployments: &[DeploymentId]) -> Result<u64, IndexerError> {
        let names: Vec<String> = deployments.iter().map(|d| d.0.clone()).collect();
        let result = sqlx::query(r#"DELETE FROM "CostModelsHistory" WHERE deployment = ANY($1)"#)
            .bind(&names)
            .execute(&self.pool)
            .await
            .map_err(|e| IndexerError::Fatal(e.to_string()))?;
        Ok(result.rows_affected())
    }

    async fn upsert_dispute(&self, dispute: PoiDispute) -> Result<PoiDispute, IndexerError> {
        let existing: Option<DisputeRow> = sqlx::query_as(
            r#"SELECT allocation_id, protocol_network, subgraph_deployment_id,
                      allocation_indexer, indexer_proof, bisection_proof, status
               FROM "POIDisputes" WHERE allocation_id = $1 AND protocol_network = $2"#,
        )
        .bind(&dispute.allocation_id.0)
        .bind(&dispute.protocol_network.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IndexerError::ExternalRead(e.to_string()))?;
        let existing = existing.map(DisputeRow::into_domain);

        let merged = match existing {
            Some(existing) => existing.merged_with(&dispute),
            None => dispute,
        };

        sqlx::query(
            r#"INSERT INTO "POIDisputes"
                (allocation_id, protocol_network, subgraph_deployment_id, allocation_indexer,
                 indexer_proof, bisection_proof, status)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               ON CONFLICT (allocation_id, protocol_network) DO UPDATE SET
                 subgraph_deployment_id = EXCLUDED.subgraph_deployment_id,
                 allocation_indexer = EXCLUDED.allocation_indexer,
                 indexer_proof = EXCLUDED.indexer_proof,
                 bisection_proof = EXCLUDED.bisection_proof,
                 status = EXCLUDED.status"#,
        )
        .bind(&merged.allocation_id.0)
        .bind(&merged.protocol_network.0)
        .bind(&merged.subgraph_deployment_id.0)
        .bind(&merged.allocation_indexer)
        .bind(&merged.indexer_proof)
        .bind(&merged.bisection_proof)
        .bind(&merged.status)
        .execute(&self.pool)
        .await
        .map_err(|e| IndexerError::Fatal(format!("store write failed: {e}")))?;

        Ok(merged)
    }

    async fn find_disputes(
        &self,
        network: Option<&NetworkIdentifier>,
    ) -> Result<Vec<PoiDispute>, IndexerError> {
        let rows: Vec<DisputeRow> = sqlx::query_as(
            r#"SELECT allocation_id, protocol_network, subgraph_deployment_id,
                      allocation_indexer, indexer_proof, bisection_proof, status
               FROM "POIDisputes" WHERE $1::text IS NULL OR protocol_network = $1"#,
        )
        .bind(network.map(|n| n.0.clone()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| IndexerError::ExternalRead(e.to_string()))?;
        Ok(rows.into_iter().map(DisputeRow::into_domain).collect())
    }

    async fn delete_disputes(&self, allocation_ids: &[AllocationId]) -> Result<u64, IndexerError> {
        let names: Vec<String> = allocation_ids.iter().map(|a| a.0.clone()).collect();
        let result = sqlx::query(r#"DELETE FROM "POIDisputes" WHERE allocation_id = ANY($1)"#)
            .bind(&names)
            .execute(&self.pool)
            .await
            .map_err(|e| IndexerError::Fatal(e.to_string()))?;
        Ok(result.rows_affected())
    }
}

#[derive(sqlx::FromRow)]
struct CostModelRow {
    id: i64,
    deployment: String,
    protocol_network: String,
    model: String,
    variables: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ActionRow {
    id: i64,
    status: String,
    #[allow(clippy::struct_field_names)]
    r#type: String,
    deployment_id: String,
    allocation_id: Option<String>,
    amount: Option<String>,
    poi: Option<String>,
    force: bool,
    priority: i32,
    source: String,
    reason: Option<String>,
    is_legacy: bool,
    syncing_network: Option<String>,
    transaction: Option<String>,
    failure_reason: Option<String>,
    protocol_network: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn row_to_action(row: ActionRow) -> Result<Action, IndexerError> {
    Ok(Action {
        id: Some(row.id),
        status: decode_status(&row.status)?,
        action_type: decode_action_type(&row.r#type)?,
        deployment_id: DeploymentId(row.deployment_id),
        allocation_id: row.allocation_id.map(AllocationId),
        amount: grt_from_sql(row.amount)?,
        poi: row.poi,
        force: row.force,
        priority: row.priority,
        source: row.source,
        reason: row.reason,
        is_legacy: row.is_legacy,
        syncing_network: row.syncing_network,
        transaction: row.transaction,
        failure_reason: row.failure_reason,
        protocol_network: NetworkIdentifier::new(row.protocol_network),
        created_at: Some(row.created_at),
        updated_at: Some(row.updated_at),
    })
}

#[derive(sqlx::FromRow)]
struct DisputeRow {
    allocation_id: String,
    protocol_network: String,
    subgraph_deployment_id: String,
    allocation_indexer: String,
    indexer_proof: Option<String>,
    bisection_proof: Option<String>,
    status: String,
}

impl DisputeRow {
    fn into_domain(self) -> PoiDispute {
        PoiDispute {
            allocation_id: AllocationId(self.allocation_id),
            protocol_network: NetworkIdentifier::new(self.protocol_network),
            subgraph_deployment_id: DeploymentId(self.subgraph_deployment_id),
            allocation_indexer: self.allocation_indexer,
            indexer_proof: self.indexer_proof,
            bisection_proof: self.bisection_proof,
            status: self.status,
        }
    }
}

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
