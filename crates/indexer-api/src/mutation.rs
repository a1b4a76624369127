// SPDX-License-Identifier: Apache-2.0
//! Write-side resolvers (`spec.md` §6).
//!
//! `createAllocation`/`closeAllocation`/`reallocateAllocation` are the
//! "synchronous equivalents of queueing and approving one action" the
//! management API table describes: each constructs the matching
//! [`indexer_common::Action`], queues it, and approves it in the same
//! call. Actual on-chain execution still happens on the targeted
//! network's next reconciler pass.

use crate::context::ApiContext;
use crate::types::{
    ActionInput, CloseAllocationInput, CostModelInput, CreateAllocationInput, GqlAction, GqlCostModel,
    GqlIndexingRule, GqlPoiDispute, IndexingRuleInput, PoiDisputeInput, ReallocateAllocationInput,
};
use async_graphql::{Context, Object, Result};
use indexer_common::{Action, ActionStatus, ActionType, AllocationId, DeploymentId, Grt, NetworkIdentifier};
use indexer_store::RuleKey;

/// Root of every GraphQL mutation.
pub struct MutationRoot;

fn ctx_data<'a>(ctx: &Context<'a>) -> Result<&'a ApiContext> {
    Ok(ctx.data::<ApiContext>()?)
}

fn network_of(raw: &str) -> NetworkIdentifier {
    NetworkIdentifier::new(raw.to_owned())
}

async fn queue_and_approve(api: &ApiContext, action: Action) -> Result<Action> {
    let network = action.protocol_network.clone();
    let queue = api.queue(&network)?;
    let mut queued = queue.queue(vec![action]).await?;
    let queued = queued.pop().ok_or_else(|| async_graphql::Error::new("queue returned no action"))?;
    let id = queued.id.ok_or_else(|| async_graphql::Error::new("queued action was not assigned an id"))?;
    let approved = queue.approve(&[id]).await?;
    approved.into_iter().next().ok_or_else(|| async_graphql::Error::new("approve returned no action"))
}

#[Object]
impl MutationRoot {
    /// Create or replace an indexing rule.
    async fn set_indexing_rule(&self, ctx: &Context<'_>, rule: IndexingRuleInput) -> Result<GqlIndexingRule> {
        let api = ctx_data(ctx)?;
        let rule = indexer_common::IndexingRule::try_from(rule)?;
        Ok(api.rules().set_rule(rule).await?.into())
    }

    /// Delete indexing rules by `(identifier, protocolNetwork)`.
    async fn delete_indexing_rules(&self, ctx: &Context<'_>, identifiers: Vec<String>, protocol_network: String) -> Result<u64> {
        let api = ctx_data(ctx)?;
        let network = network_of(&protocol_network);
        let keys: Vec<RuleKey> = identifiers
            .into_iter()
            .map(|identifier| RuleKey { identifier, protocol_network: network.clone() })
            .collect();
        Ok(api.rules().delete_rules(&keys).await?)
    }

    /// Queue a batch of actions. The first rejection stops the batch.
    async fn queue_actions(&self, ctx: &Context<'_>, actions: Vec<ActionInput>) -> Result<Vec<GqlAction>> {
        let api = ctx_data(ctx)?;
        let mut by_network: std::collections::HashMap<NetworkIdentifier, Vec<Action>> = std::collections::HashMap::new();
        for input in actions {
            let action = Action::try_from(input)?;
            by_network.entry(action.protocol_network.clone()).or_default().push(action);
        }
        let mut queued = Vec::new();
        for (network, actions) in by_network {
            queued.extend(api.queue(&network)?.queue(actions).await?);
        }
        Ok(queued.into_iter().map(Into::into).collect())
    }

    /// Approve queued actions by id.
    async fn approve_actions(&self, ctx: &Context<'_>, ids: Vec<i64>, protocol_network: String) -> Result<Vec<GqlAction>> {
        let api = ctx_data(ctx)?;
        let network = network_of(&protocol_network);
        let approved = api.queue(&network)?.approve(&ids).await?;
        Ok(approved.into_iter().map(Into::into).collect())
    }

    /// Cancel queued actions by id.
    async fn cancel_actions(&self, ctx: &Context<'_>, ids: Vec<i64>, protocol_network: String) -> Result<Vec<GqlAction>> {
        let api = ctx_data(ctx)?;
        let network = network_of(&protocol_network);
        let canceled = api.queue(&network)?.cancel(&ids).await?;
        Ok(canceled.into_iter().map(Into::into).collect())
    }

    /// Delete actions by id.
    async fn delete_actions(&self, ctx: &Context<'_>, ids: Vec<i64>, protocol_network: String) -> Result<u64> {
        let api = ctx_data(ctx)?;
        let network = network_of(&protocol_network);
        Ok(api.queue(&network)?.delete(&ids).await?)
    }

    /// Set (append) a cost model.
    async fn set_cost_model(&self, ctx: &Context<'_>, cost_model: CostModelInput) -> Result<GqlCostModel> {
        let api = ctx_data(ctx)?;
        Ok(api.store().insert_cost_model(cost_model.into()).await?.into())
    }

    /// Delete all cost-model history for the given deployments.
    async fn delete_cost_models(&self, ctx: &Context<'_>, deployments: Vec<String>) -> Result<u64> {
        let api = ctx_data(ctx)?;
        let ids: Vec<DeploymentId> = deployments.into_iter().map(DeploymentId::from).collect();
        Ok(api.store().delete_cost_models(&ids).await?)
    }

    /// Record or merge POI disputes.
    async fn store_disputes(&self, ctx: &Context<'_>, disputes: Vec<PoiDisputeInput>) -> Result<Vec<GqlPoiDispute>> {
        let api = ctx_data(ctx)?;
        let mut stored = Vec::with_capacity(disputes.len());
        for dispute in disputes {
            stored.push(api.store().upsert_dispute(dispute.into()).await?.into());
        }
        Ok(stored.into_iter().map(Into::into).collect())
    }

    /// Delete disputes by allocation id.
    async fn delete_disputes(&self, ctx: &Context<'_>, allocation_ids: Vec<String>) -> Result<u64> {
        let api = ctx_data(ctx)?;
        let ids: Vec<AllocationId> = allocation_ids.into_iter().map(AllocationId::from).collect();
        Ok(api.store().delete_disputes(&ids).await?)
    }

    /// Open a new allocation: queues and approves an `allocate` action.
    async fn create_allocation(&self, ctx: &Context<'_>, input: CreateAllocationInput) -> Result<GqlAction> {
        let api = ctx_data(ctx)?;
        let network = network_of(&input.protocol_network);
        let amount: Grt = input
            .amount
            .parse()
            .map_err(|_| async_graphql::Error::new(format!("'{}' is not a valid GRT amount", input.amount)))?;
        let action = Action {
            id: None,
            status: ActionStatus::Queued,
            action_type: ActionType::Allocate,
            deployment_id: DeploymentId::from(input.deployment_id),
            allocation_id: None,
            amount: Some(amount),
            poi: None,
            force: false,
            priority: 0,
            source: "indexerAgent".to_owned(),
            reason: Some("createAllocation mutation".to_owned()),
            is_legacy: false,
            syncing_network: None,
            transaction: None,
            failure_reason: None,
            protocol_network: network,
            created_at: None,
            updated_at: None,
        };
        Ok(queue_and_approve(api, action).await?.into())
    }

    /// Close an allocation: queues and approves an `unallocate` action.
    async fn close_allocation(&self, ctx: &Context<'_>, input: CloseAllocationInput) -> Result<GqlAction> {
        let api = ctx_data(ctx)?;
        let network = network_of(&input.protocol_network);
        let action = Action {
            id: None,
            status: ActionStatus::Queued,
            action_type: ActionType::Unallocate,
            deployment_id: DeploymentId::from(input.deployment_id),
            allocation_id: Some(AllocationId::from(input.allocation_id)),
            amount: None,
            poi: input.poi,
            force: false,
            priority: 0,
            source: "indexerAgent".to_owned(),
            reason: Some("closeAllocation mutation".to_owned()),
            is_legacy: false,
            syncing_network: None,
            transaction: None,
            failure_reason: None,
            protocol_network: network,
            created_at: None,
            updated_at: None,
        };
        Ok(queue_and_approve(api, action).await?.into())
    }

    /// Close and reopen an allocation: queues and approves a `reallocate` action.
    async fn reallocate_allocation(&self, ctx: &Context<'_>, input: ReallocateAllocationInput) -> Result<GqlAction> {
        let api = ctx_data(ctx)?;
        let network = network_of(&input.protocol_network);
        let amount: Grt = input
            .amount
            .parse()
            .map_err(|_| async_graphql::Error::new(format!("'{}' is not a valid GRT amount", input.amount)))?;
        let action = Action {
            id: None,
            status: ActionStatus::Queued,
            action_type: ActionType::Reallocate,
            deployment_id: DeploymentId::from(input.deployment_id),
            allocation_id: Some(AllocationId::from(input.allocation_id)),
            amount: Some(amount),
            poi: input.poi,
            force: false,
            priority: 0,
            source: "indexerAgent".to_owned(),
            reason: Some("reallocateAllocation mutation".to_owned()),
            is_legacy: false,
            syncing_network: None,
            transaction: None,
            failure_reason: None,
            protocol_network: network,
            created_at: None,
            updated_at: None,
        };
        Ok(queue_and_approve(api, action).await?.into())
    }
}
