// SPDX-License-Identifier: Apache-2.0
//! Read-side resolvers (`spec.md` §6).

use crate::context::ApiContext;
use crate::types::{
    ActionFilterInput, ActionParams, GqlAction, GqlAllocation, GqlCostModel, GqlIndexingRule,
    GqlPoiDispute, IndexerDeployment, IndexerEndpoint, IndexerRegistration, OrderDirection,
};
use async_graphql::{Context, Object, Result};
use indexer_common::{DeploymentId, NetworkIdentifier};
use indexer_store::ActionFilter;

/// Root of every GraphQL query.
pub struct QueryRoot;

fn ctx_data<'a>(ctx: &Context<'a>) -> Result<&'a ApiContext> {
    Ok(ctx.data::<ApiContext>()?)
}

fn network_of(raw: &str) -> NetworkIdentifier {
    NetworkIdentifier::new(raw.to_owned())
}

#[Object]
impl QueryRoot {
    /// A single indexing rule by identifier and network, if one exists.
    async fn indexing_rule(
        &self,
        ctx: &Context<'_>,
        identifier: String,
        protocol_network: String,
        merged: bool,
    ) -> Result<Option<GqlIndexingRule>> {
        let api = ctx_data(ctx)?;
        let network = network_of(&protocol_network);
        let rules = api.rules().rules(merged, Some(&network)).await?;
        Ok(rules.into_iter().find(|rule| rule.identifier == identifier).map(Into::into))
    }

    /// All indexing rules, optionally restricted to one network.
    async fn indexing_rules(
        &self,
        ctx: &Context<'_>,
        protocol_network: Option<String>,
        merged: bool,
    ) -> Result<Vec<GqlIndexingRule>> {
        let api = ctx_data(ctx)?;
        let network = protocol_network.as_deref().map(network_of);
        let rules = api.rules().rules(merged, network.as_ref()).await?;
        Ok(rules.into_iter().map(Into::into).collect())
    }

    /// Actions matching `filter`, ordered by `order_by`/`order_direction`.
    async fn actions(
        &self,
        ctx: &Context<'_>,
        filter: Option<ActionFilterInput>,
        order_by: Option<ActionParams>,
        #[graphql(default)] order_direction: OrderDirection,
    ) -> Result<Vec<GqlAction>> {
        let api = ctx_data(ctx)?;
        let filter: ActionFilter = filter.unwrap_or_default().into();
        let network = filter
            .protocol_network
            .clone()
            .ok_or_else(|| async_graphql::Error::new("filter.protocolNetwork is required"))?;
        let actions = api.queue(&network)?.fetch(&filter, order_by.map(Into::into), order_direction.into()).await?;
        Ok(actions.into_iter().map(Into::into).collect())
    }

    /// Latest cost models, optionally restricted to the given deployments.
    async fn cost_models(
        &self,
        ctx: &Context<'_>,
        protocol_network: String,
        deployments: Option<Vec<String>>,
    ) -> Result<Vec<GqlCostModel>> {
        let api = ctx_data(ctx)?;
        let network = network_of(&protocol_network);
        let deployment_ids: Option<Vec<DeploymentId>> =
            deployments.map(|ids| ids.into_iter().map(DeploymentId::from).collect());
        let models = api.store().latest_cost_models(&network, deployment_ids.as_deref()).await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    /// The single latest cost model for one deployment, if any.
    async fn cost_model(
        &self,
        ctx: &Context<'_>,
        protocol_network: String,
        deployment: String,
    ) -> Result<Option<GqlCostModel>> {
        let api = ctx_data(ctx)?;
        let network = network_of(&protocol_network);
        let deployment_id = DeploymentId::from(deployment);
        let models = api.store().latest_cost_models(&network, Some(std::slice::from_ref(&deployment_id))).await?;
        Ok(models.into_iter().next().map(Into::into))
    }

    /// POI disputes, optionally restricted to one network.
    async fn disputes(&self, ctx: &Context<'_>, protocol_network: Option<String>) -> Result<Vec<GqlPoiDispute>> {
        let api = ctx_data(ctx)?;
        let network = protocol_network.as_deref().map(network_of);
        let disputes = api.store().find_disputes(network.as_ref()).await?;
        Ok(disputes.into_iter().map(Into::into).collect())
    }

    /// The operator's currently active allocations on `protocol_network`.
    async fn indexer_allocations(&self, ctx: &Context<'_>, protocol_network: String) -> Result<Vec<GqlAllocation>> {
        let api = ctx_data(ctx)?;
        let network = network_of(&protocol_network);
        let indexer = api.indexer_address(&network)?.to_owned();
        let allocations = api.monitor(&network)?.allocations_by_status(&network, &indexer, &[]).await?;
        Ok(allocations.into_iter().map(Into::into).collect())
    }

    /// A single allocation by id, if the subgraph has indexed it.
    async fn allocation(
        &self,
        ctx: &Context<'_>,
        protocol_network: String,
        allocation_id: String,
    ) -> Result<Option<GqlAllocation>> {
        let api = ctx_data(ctx)?;
        let network = network_of(&protocol_network);
        let allocation = api
            .monitor(&network)?
            .allocation(&network, &indexer_common::AllocationId::from(allocation_id))
            .await?;
        Ok(allocation.map(Into::into))
    }

    /// Deployments the agent is currently indexing, derived from the
    /// deployment-scoped indexing rules configured for `protocol_network`.
    async fn indexer_deployments(&self, ctx: &Context<'_>, protocol_network: String) -> Result<Vec<IndexerDeployment>> {
        let api = ctx_data(ctx)?;
        let network = network_of(&protocol_network);
        let monitor = api.monitor(&network)?;
        let rules = api.rules().rules(false, Some(&network)).await?;
        let mut deployments = Vec::new();
        for rule in rules.iter().filter(|rule| !rule.is_global()) {
            let deployment = DeploymentId::from(rule.identifier.clone());
            if let Some(metadata) = monitor.deployment_metadata(&network, &deployment).await? {
                deployments.push(IndexerDeployment {
                    deployment_id: metadata.deployment_id.0,
                    display_name: metadata.display_name,
                    synced: metadata.synced,
                });
            }
        }
        Ok(deployments)
    }

    /// The configured operator registration for every network, or just
    /// `protocol_network` when given.
    async fn indexer_registration(&self, ctx: &Context<'_>, protocol_network: Option<String>) -> Result<Vec<IndexerRegistration>> {
        let api = ctx_data(ctx)?;
        let wanted = protocol_network.as_deref().map(network_of);
        Ok(api
            .indexer_addresses()
            .filter(|(network, _)| wanted.as_ref().is_none_or(|wanted| *network == wanted))
            .map(|(network, address)| IndexerRegistration { protocol_network: network.to_string(), address: address.to_owned() })
            .collect())
    }

    /// Configured query/status endpoints, per network.
    async fn indexer_endpoints(&self, ctx: &Context<'_>) -> Result<Vec<IndexerEndpoint>> {
        let api = ctx_data(ctx)?;
        Ok(api
            .endpoints()
            .map(|(network, endpoint)| IndexerEndpoint {
                protocol_network: network.to_string(),
                url: endpoint.url.clone(),
                status_url: endpoint.status_url.clone(),
            })
            .collect())
    }
}

