// SPDX-License-Identifier: Apache-2.0
//! Persistence adapter (`spec.md` §4.2): typed CRUD for rules, actions,
//! cost models, and disputes, with upsert and transactional-delete
//! semantics.
//!
//! The [`Store`] trait is the seam: `PostgresStore` is the production
//! implementation (backed by `sqlx`), and `MemoryStore` is a test double
//! implementing the identical trait, so every pure-logic path in the rest
//! of the workspace can be exercised without a reachable Postgres
//! instance (`SPEC_FULL.md` §4.13).
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::missing_errors_doc
)]

mod filter;
mod memory;
#[cfg(feature = "integration-tests")]
mod postgres;

pub use filter::{ActionColumn, ActionFilter, OrderDirection};
pub use memory::MemoryStore;
#[cfg(feature = "integration-tests")]
pub use postgres::PostgresStore;

use async_trait::async_trait;
use indexer_common::{
    Action, AllocationId, CostModel, DeploymentId, IndexerError, NetworkIdentifier, PoiDispute,
};

/// Identifies a stored rule for deletion: the sentinel
/// [`indexer_common::rule`]-level `"global"` identifier is handled
/// specially (the global row is recreated at defaults in the same
/// transaction, per `spec.md` §3/§4.2, scenario S5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleKey {
    /// Rule identifier, or the `"global"` sentinel.
    pub identifier: String,
    /// Network the rule applies to.
    pub protocol_network: NetworkIdentifier,
}

/// Typed CRUD surface other components depend on. All multi-row mutations
/// run inside a transaction; readers never observe partial writes
/// (`spec.md` §4.2, §5).
#[async_trait]
pub trait Store: Send + Sync {
    /// Atomic insert-or-update on `(identifier, protocolNetwork)`. Returns
    /// the stored rule.
    async fn upsert_rule(
        &self,
        rule: indexer_common::IndexingRule,
    ) -> Result<indexer_common::IndexingRule, IndexerError>;

    /// Fetch rules, optionally merged with their network's global rule and
    /// optionally restricted to one network. See `indexer-rules` for the
    /// merge algorithm itself — this only returns the raw rows when
    /// `merged` is `false`.
    async fn fetch_rules(
        &self,
        merged: bool,
        network: Option<&NetworkIdentifier>,
    ) -> Result<Vec<indexer_common::IndexingRule>, IndexerError>;

    /// Delete the given rule keys, grouped by network. For every network
    /// where a `"global"` key was deleted, reinsert that network's global
    /// rule at defaults in the same transaction. Returns the number of
    /// rows actually deleted (not counting the defaults reinsert).
    async fn delete_rules(&self, keys: &[RuleKey]) -> Result<u64, IndexerError>;

    /// Query actions with the given filter and ordering. Ties break by id
    /// ascending unless `order_by`/`order_dir` override it.
    async fn find_actions(
        &self,
        filter: &ActionFilter,
        order_by: Option<ActionColumn>,
        order_dir: OrderDirection,
    ) -> Result<Vec<Action>, IndexerError>;

    /// Apply the §3 uniqueness invariant and insert/update the action.
    /// Returns the stored row (with its assigned id and timestamps).
    async fn upsert_action(&self, action: Action) -> Result<Action, IndexerError>;

    /// Delete actions by id. Refuses (returns
    /// [`IndexerError::Constraint`]) if any id does not exist.
    async fn delete_actions(&self, ids: &[i64]) -> Result<u64, IndexerError>;

    /// Latest cost model per deployment (`MAX(id) GROUP BY deployment`),
    /// optionally restricted to the given deployments. Falls back to the
    /// network's `global` model for any deployment with no row of its own.
    async fn latest_cost_models(
        &self,
        protocol_network: &NetworkIdentifier,
        deployments: Option<&[DeploymentId]>,
    ) -> Result<Vec<CostModel>, IndexerError>;

    /// Append a new cost-model history row.
    async fn insert_cost_model(&self, model: CostModel) -> Result<CostModel, IndexerError>;

    /// Delete all history rows for the given deployments (Open Question
    /// 9c, resolved as a direct delete — see `SPEC_FULL.md` §3).
    async fn delete_cost_models(&self, deployments: &[DeploymentId]) -> Result<u64, IndexerError>;

    /// Upsert a dispute, merging proof fields with any existing row at the
    /// same `(allocationID, protocolNetwork)` key.
    async fn upsert_dispute(&self, dispute: PoiDispute) -> Result<PoiDispute, IndexerError>;

    /// Fetch disputes, optionally restricted to one network.
    async fn find_disputes(
        &self,
        network: Option<&NetworkIdentifier>,
    ) -> Result<Vec<PoiDispute>, IndexerError>;

    /// Delete disputes by allocation id.
    async fn delete_disputes(&self, allocation_ids: &[AllocationId]) -> Result<u64, IndexerError>;
}

/// Forward [`Store`] through an `Arc`, so the reconciler can hand the same
/// underlying store to the queue service and the batch executor without
/// either owning it outright.
#[async_trait]
impl<T> Store for std::sync::Arc<T>
where
    T: Store + ?Sized,
{
    async fn upsert_rule(
        &self,
        rule: indexer_common::IndexingRule,
    ) -> Result<indexer_common::IndexingRule, IndexerError> {
        (**self).upsert_rule(rule).await
    }

    async fn fetch_rules(
        &self,
        merged: bool,
        network: Option<&NetworkIdentifier>,
    ) -> Result<Vec<indexer_common::IndexingRule>, IndexerError> {
        (**self).fetch_rules(merged, network).await
    }

    async fn delete_rules(&self, keys: &[RuleKey]) -> Result<u64, IndexerError> {
        (**self).delete_rules(keys).await
    }

    async fn find_actions(
        &self,
        filter: &ActionFilter,
        order_by: Option<ActionColumn>,
        order_dir: OrderDirection,
    ) -> Result<Vec<Action>, IndexerError> {
        (**self).find_actions(filter, order_by, order_dir).await
    }

    async fn upsert_action(&self, action: Action) -> Result<Action, IndexerError> {
        (**self).upsert_action(action).await
    }

    async fn delete_actions(&self, ids: &[i64]) -> Result<u64, IndexerError> {
        (**self).delete_actions(ids).await
    }

    async fn latest_cost_models(
        &self,
        protocol_network: &NetworkIdentifier,
        deployments: Option<&[DeploymentId]>,
    ) -> Result<Vec<CostModel>, IndexerError> {
        (**self).latest_cost_models(protocol_network, deployments).await
    }

    async fn insert_cost_model(&self, model: CostModel) -> Result<CostModel, IndexerError> {
        (**self).insert_cost_model(model).await
    }

    async fn delete_cost_models(&self, deployments: &[DeploymentId]) -> Result<u64, IndexerError> {
        (**self).delete_cost_models(deployments).await
    }

    async fn upsert_dispute(&self, dispute: PoiDispute) -> Result<PoiDispute, IndexerError> {
        (**self).upsert_dispute(dispute).await
    }

    async fn find_disputes(&self, network: Option<&NetworkIdentifier>) -> Result<Vec<PoiDispute>, IndexerError> {
        (**self).find_disputes(network).await
    }

    async fn delete_disputes(&self, allocation_ids: &[AllocationId]) -> Result<u64, IndexerError> {
        (**self).delete_disputes(allocation_ids).await
    }
}
