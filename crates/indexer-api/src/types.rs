// SPDX-License-Identifier: Apache-2.0
//! GraphQL-facing mirrors of the domain model (`spec.md` §3, §6).
//!
//! `indexer-common` stays transport-agnostic, so every type that crosses
//! the GraphQL boundary is defined here and converted to/from its domain
//! counterpart explicitly. Monetary and id-like fields cross the wire as
//! plain strings (`SPEC_FULL.md` §3's wire representation decision),
//! parsed back with the domain newtype's own `FromStr`.

use async_graphql::{Enum, InputObject, SimpleObject};
use chrono::{DateTime, Utc};
use indexer_common::{
    Action, ActionStatus, ActionType, AllocationId, AllocationStatus, CostModel, DecisionBasis,
    DeploymentId, Grt, IdentifierType, IndexerError, IndexingRule, NetworkIdentifier, PoiDispute,
};

fn invalid(field: &str, value: &str) -> IndexerError {
    IndexerError::Validation(format!("'{value}' is not a valid {field}"))
}

/// `decisionBasis`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum GqlDecisionBasis {
    /// Evaluate thresholds against live network data.
    Rules,
    /// Never allocate.
    Never,
    /// Always allocate.
    Always,
    /// Keep syncing, never allocate.
    Offchain,
    /// Driven by direct indexer payments.
    Dips,
}

impl From<DecisionBasis> for GqlDecisionBasis {
    fn from(value: DecisionBasis) -> Self {
        match value {
            DecisionBasis::Rules => Self::Rules,
            DecisionBasis::Never => Self::Never,
            DecisionBasis::Always => Self::Always,
            DecisionBasis::Offchain => Self::Offchain,
            DecisionBasis::Dips => Self::Dips,
        }
    }
}

impl From<GqlDecisionBasis> for DecisionBasis {
    fn from(value: GqlDecisionBasis) -> Self {
        match value {
            GqlDecisionBasis::Rules => Self::Rules,
            GqlDecisionBasis::Never => Self::Never,
            GqlDecisionBasis::Always => Self::Always,
            GqlDecisionBasis::Offchain => Self::Offchain,
            GqlDecisionBasis::Dips => Self::Dips,
        }
    }
}

/// `identifierType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum GqlIdentifierType {
    /// A single deployment.
    Deployment,
    /// A subgraph.
    Subgraph,
    /// A named group.
    Group,
}

impl From<IdentifierType> for GqlIdentifierType {
    fn from(value: IdentifierType) -> Self {
        match value {
            IdentifierType::Deployment => Self::Deployment,
            IdentifierType::Subgraph => Self::Subgraph,
            IdentifierType::Group => Self::Group,
        }
    }
}

impl From<GqlIdentifierType> for IdentifierType {
    fn from(value: GqlIdentifierType) -> Self {
        match value {
            GqlIdentifierType::Deployment => Self::Deployment,
            GqlIdentifierType::Subgraph => Self::Subgraph,
            GqlIdentifierType::Group => Self::Group,
        }
    }
}

/// `Action.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum GqlActionStatus {
    /// Queued, awaiting approval.
    Queued,
    /// Approved, awaiting the next batch.
    Approved,
    /// Being prepared/submitted.
    Deploying,
    /// Submitted, awaiting receipt.
    Pending,
    /// Confirmed.
    Success,
    /// Failed.
    Failed,
    /// Canceled.
    Canceled,
}

impl From<ActionStatus> for GqlActionStatus {
    fn from(value: ActionStatus) -> Self {
        match value {
            ActionStatus::Queued => Self::Queued,
            ActionStatus::Approved => Self::Approved,
            ActionStatus::Deploying => Self::Deploying,
            ActionStatus::Pending => Self::Pending,
            ActionStatus::Success => Self::Success,
            ActionStatus::Failed => Self::Failed,
            ActionStatus::Canceled => Self::Canceled,
        }
    }
}

impl From<GqlActionStatus> for ActionStatus {
    fn from(value: GqlActionStatus) -> Self {
        match value {
            GqlActionStatus::Queued => Self::Queued,
            GqlActionStatus::Approved => Self::Approved,
            GqlActionStatus::Deploying => Self::Deploying,
            GqlActionStatus::Pending => Self::Pending,
            GqlActionStatus::Success => Self::Success,
            GqlActionStatus::Failed => Self::Failed,
            GqlActionStatus::Canceled => Self::Canceled,
        }
    }
}

/// `Action.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum GqlActionType {
    /// Open a new allocation.
    Allocate,
    /// Close an existing allocation.
    Unallocate,
    /// Close and reopen.
    Reallocate,
}

impl From<ActionType> for GqlActionType {
    fn from(value: ActionType) -> Self {
        match value {
            ActionType::Allocate => Self::Allocate,
            ActionType::Unallocate => Self::Unallocate,
            ActionType::Reallocate => Self::Reallocate,
        }
    }
}

impl From<GqlActionType> for ActionType {
    fn from(value: GqlActionType) -> Self {
        match value {
            GqlActionType::Allocate => Self::Allocate,
            GqlActionType::Unallocate => Self::Unallocate,
            GqlActionType::Reallocate => Self::Reallocate,
        }
    }
}

/// Any `Action` column, used for `orderBy` (`spec.md` §6's `ActionParams`).
/// `async-graphql` rejects an unrecognized wire value with its own
/// enum-suggestion diagnostic, satisfying the "closest match" requirement
/// without any code here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum ActionParams {
    /// `id`
    Id,
    /// `status`
    Status,
    /// `type`
    Type,
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

impl From<ActionParams> for indexer_store::ActionColumn {
    fn from(value: ActionParams) -> Self {
        match value {
            ActionParams::Id => Self::Id,
            ActionParams::Status => Self::Status,
            ActionParams::Type => Self::ActionType,
            ActionParams::DeploymentId => Self::DeploymentId,
            ActionParams::AllocationId => Self::AllocationId,
            ActionParams::Priority => Self::Priority,
            ActionParams::Source => Self::Source,
            ActionParams::ProtocolNetwork => Self::ProtocolNetwork,
            ActionParams::CreatedAt => Self::CreatedAt,
            ActionParams::UpdatedAt => Self::UpdatedAt,
        }
    }
}

/// Ascending or descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Enum)]
pub enum OrderDirection {
    /// Smallest/earliest first.
    #[default]
    Asc,
    /// Largest/latest first.
    Desc,
}

impl From<OrderDirection> for indexer_store::OrderDirection {
    fn from(value: OrderDirection) -> Self {
        match value {
            OrderDirection::Asc => Self::Asc,
            OrderDirection::Desc => Self::Desc,
        }
    }
}

/// `IndexingRule`, as returned by `indexingRule`/`indexingRules`.
#[derive(Debug, Clone, SimpleObject)]
pub struct GqlIndexingRule {
    /// Deployment content id, or the `"global"` sentinel.
    pub identifier: String,
    /// What `identifier` names.
    pub identifier_type: GqlIdentifierType,
    /// CAIP-2 network this rule applies to.
    pub protocol_network: String,
    /// Total stake to commit, as a decimal string.
    pub allocation_amount: Option<String>,
    /// Parallel allocation count.
    pub parallel_allocations: Option<u32>,
    /// Fraction of total network stake, in `[0, 1]`.
    pub max_allocation_percentage: Option<f64>,
    /// Minimum curation signal, as a decimal string.
    pub min_signal: Option<String>,
    /// Maximum curation signal, as a decimal string.
    pub max_signal: Option<String>,
    /// Minimum own stake, as a decimal string.
    pub min_stake: Option<String>,
    /// Minimum average query fees, as a decimal string.
    pub min_average_query_fees: Option<String>,
    /// Epochs before renewal/closure.
    pub allocation_lifetime: Option<u64>,
    /// Reallocate instead of close on expiry.
    pub auto_renewal: Option<bool>,
    /// Free-form extension bag, as JSON.
    pub custom: Option<serde_json::Value>,
    /// Which decision basis governs this rule.
    pub decision_basis: GqlDecisionBasis,
    /// Require the deployment be marked "supported".
    pub require_supported: bool,
    /// Apply conservative safety checks.
    pub safety: bool,
}

impl From<IndexingRule> for GqlIndexingRule {
    fn from(rule: IndexingRule) -> Self {
        Self {
            identifier: rule.identifier,
            identifier_type: rule.identifier_type.into(),
            protocol_network: rule.protocol_network.0,
            allocation_amount: rule.allocation_amount.map(|amount| amount.to_string()),
            parallel_allocations: rule.parallel_allocations,
            max_allocation_percentage: rule.max_allocation_percentage,
            min_signal: rule.min_signal.map(|amount| amount.to_string()),
            max_signal: rule.max_signal.map(|amount| amount.to_string()),
            min_stake: rule.min_stake.map(|amount| amount.to_string()),
            min_average_query_fees: rule.min_average_query_fees.map(|amount| amount.to_string()),
            allocation_lifetime: rule.allocation_lifetime,
            auto_renewal: rule.auto_renewal,
            custom: rule.custom,
            decision_basis: rule.decision_basis.into(),
            require_supported: rule.require_supported,
            safety: rule.safety,
        }
    }
}

/// `setIndexingRule(rule: IndexingRuleInput!)`.
#[derive(Debug, Clone, InputObject)]
pub struct IndexingRuleInput {
    /// Deployment content id, or `"global"`.
    pub identifier: String,
    /// What `identifier` names.
    pub identifier_type: GqlIdentifierType,
    /// CAIP-2 network this rule applies to.
    pub protocol_network: String,
    /// Total stake to commit, as a decimal string.
    pub allocation_amount: Option<String>,
    /// Parallel allocation count.
    pub parallel_allocations: Option<u32>,
    /// Fraction of total network stake, in `[0, 1]`.
    pub max_allocation_percentage: Option<f64>,
    /// Minimum curation signal, as a decimal string.
    pub min_signal: Option<String>,
    /// Maximum curation signal, as a decimal string.
    pub max_signal: Option<String>,
    /// Minimum own stake, as a decimal string.
    pub min_stake: Option<String>,
    /// Minimum average query fees, as a decimal string.
    pub min_average_query_fees: Option<String>,
    /// Epochs before renewal/closure.
    pub allocation_lifetime: Option<u64>,
    /// Reallocate instead of close on expiry.
    pub auto_renewal: Option<bool>,
    /// Free-form extension bag, as JSON.
    pub custom: Option<serde_json::Value>,
    /// Which decision basis governs this rule.
    pub decision_basis: GqlDecisionBasis,
    /// Require the deployment be marked "supported". Defaults to `true`.
    #[graphql(default = true)]
    pub require_supported: bool,
    /// Apply conservative safety checks. Defaults to `true`.
    #[graphql(default = true)]
    pub safety: bool,
}

impl TryFrom<IndexingRuleInput> for IndexingRule {
    type Error = IndexerError;

    fn try_from(input: IndexingRuleInput) -> Result<Self, Self::Error> {
        Ok(Self {
            identifier: input.identifier,
            identifier_type: input.identifier_type.into(),
            protocol_network: NetworkIdentifier::new(input.protocol_network),
            allocation_amount: parse_amount(input.allocation_amount, "allocationAmount")?,
            parallel_allocations: input.parallel_allocations,
            max_allocation_percentage: input.max_allocation_percentage,
            min_signal: parse_amount(input.min_signal, "minSignal")?,
            max_signal: parse_amount(input.max_signal, "maxSignal")?,
            min_stake: parse_amount(input.min_stake, "minStake")?,
            min_average_query_fees: parse_amount(input.min_average_query_fees, "minAverageQueryFees")?,
            allocation_lifetime: input.allocation_lifetime,
            auto_renewal: input.auto_renewal,
            custom: input.custom,
            decision_basis: input.decision_basis.into(),
            require_supported: input.require_supported,
            safety: input.safety,
        })
    }
}

fn parse_amount(value: Option<String>, field: &str) -> Result<Option<Grt>, IndexerError> {
    value.map(|raw| raw.parse::<Grt>().map_err(|_| invalid(field, &raw))).transpose()
}

/// `CostModel`, as returned by `costModel`/`costModels`.
#[derive(Debug, Clone, SimpleObject)]
pub struct GqlCostModel {
    /// Deployment this prices, or `"global"`.
    pub deployment: String,
    /// Network the deployment lives on.
    pub protocol_network: String,
    /// Agora cost-model source text.
    pub model: String,
    /// Variables referenced by `model`, as JSON.
    pub variables: Option<serde_json::Value>,
    /// Insert timestamp.
    pub created_at: Option<DateTime<Utc>>,
}

impl From<CostModel> for GqlCostModel {
    fn from(model: CostModel) -> Self {
        Self {
            deployment: model.deployment.0,
            protocol_network: model.protocol_network.0,
            model: model.model,
            variables: model.variables,
            created_at: model.created_at,
        }
    }
}

/// `setCostModel(costModel: CostModelInput!)`.
#[derive(Debug, Clone, InputObject)]
pub struct CostModelInput {
    /// Deployment this prices, or `"global"`.
    pub deployment: String,
    /// Network the deployment lives on.
    pub protocol_network: String,
    /// Agora cost-model source text.
    pub model: String,
    /// Variables referenced by `model`, as JSON.
    pub variables: Option<serde_json::Value>,
}

impl From<CostModelInput> for CostModel {
    fn from(input: CostModelInput) -> Self {
        Self {
            id: None,
            deployment: DeploymentId::from(input.deployment),
            protocol_network: NetworkIdentifier::new(input.protocol_network),
            model: input.model,
            variables: input.variables,
            created_at: None,
        }
    }
}

/// `Action`, as returned by `actions`/`queueActions`/etc.
#[derive(Debug, Clone, SimpleObject)]
pub struct GqlAction {
    /// Assigned id, once stored.
    pub id: Option<i64>,
    /// Current lifecycle state.
    pub status: GqlActionStatus,
    /// Which mutation this is.
    pub action_type: GqlActionType,
    /// Targeted deployment.
    pub deployment_id: String,
    /// Targeted allocation, if any.
    pub allocation_id: Option<String>,
    /// Stake amount, as a decimal string.
    pub amount: Option<String>,
    /// User-supplied POI, if any.
    pub poi: Option<String>,
    /// Skip the usual safety checks.
    pub force: bool,
    /// Queue ordering priority.
    pub priority: i32,
    /// Originator tag.
    pub source: String,
    /// Human-readable justification.
    pub reason: Option<String>,
    /// Predates the current schema.
    pub is_legacy: bool,
    /// Still-syncing network tag, if any.
    pub syncing_network: Option<String>,
    /// Chain transaction hash, once submitted.
    pub transaction: Option<String>,
    /// Failure reason, if failed.
    pub failure_reason: Option<String>,
    /// Network this executes against.
    pub protocol_network: String,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Last-update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Action> for GqlAction {
    fn from(action: Action) -> Self {
        Self {
            id: action.id,
            status: action.status.into(),
            action_type: action.action_type.into(),
            deployment_id: action.deployment_id.0,
            allocation_id: action.allocation_id.map(|id| id.0),
            amount: action.amount.map(|amount| amount.to_string()),
            poi: action.poi,
            force: action.force,
            priority: action.priority,
            source: action.source,
            reason: action.reason,
            is_legacy: action.is_legacy,
            syncing_network: action.syncing_network,
            transaction: action.transaction,
            failure_reason: action.failure_reason,
            protocol_network: action.protocol_network.0,
            created_at: action.created_at,
            updated_at: action.updated_at,
        }
    }
}

/// `queueActions([ActionInput!]!)`.
#[derive(Debug, Clone, InputObject)]
pub struct ActionInput {
    /// Which mutation this is.
    pub action_type: GqlActionType,
    /// Targeted deployment.
    pub deployment_id: String,
    /// Targeted allocation (required for unallocate/reallocate).
    pub allocation_id: Option<String>,
    /// Stake amount, as a decimal string (required for allocate/reallocate).
    pub amount: Option<String>,
    /// User-supplied POI, if any.
    pub poi: Option<String>,
    /// Skip the usual safety checks. Defaults to `false`.
    #[graphql(default)]
    pub force: bool,
    /// Queue ordering priority. Defaults to `0`.
    #[graphql(default)]
    pub priority: i32,
    /// Originator tag. Defaults to `"indexerAgent"`.
    #[graphql(default = "\"indexerAgent\".to_owned()")]
    pub source: String,
    /// Human-readable justification.
    pub reason: Option<String>,
    /// Network this executes against.
    pub protocol_network: String,
}

impl TryFrom<ActionInput> for Action {
    type Error = IndexerError;

    fn try_from(input: ActionInput) -> Result<Self, Self::Error> {
        let amount = input.amount.map(|raw| raw.parse::<Grt>().map_err(|_| invalid("amount", &raw))).transpose()?;
        Ok(Self {
            id: None,
            status: ActionStatus::Queued,
            action_type: input.action_type.into(),
            deployment_id: DeploymentId::from(input.deployment_id),
            allocation_id: input.allocation_id.map(AllocationId::from),
            amount,
            poi: input.poi,
            force: input.force,
            priority: input.priority,
            source: input.source,
            reason: input.reason,
            is_legacy: false,
            syncing_network: None,
            transaction: None,
            failure_reason: None,
            protocol_network: NetworkIdentifier::new(input.protocol_network),
            created_at: None,
            updated_at: None,
        })
    }
}

/// `actions(filter: ActionFilterInput)`.
#[derive(Debug, Clone, Default, InputObject)]
pub struct ActionFilterInput {
    /// Restrict to these ids.
    pub ids: Option<Vec<i64>>,
    /// Restrict to these statuses.
    pub statuses: Option<Vec<GqlActionStatus>>,
    /// Restrict to these action types.
    pub types: Option<Vec<GqlActionType>>,
    /// Restrict to this deployment.
    pub deployment_id: Option<String>,
    /// Restrict to this allocation.
    pub allocation_id: Option<String>,
    /// Restrict to this originator tag.
    pub source: Option<String>,
    /// Restrict to this network.
    pub protocol_network: Option<String>,
    /// `updatedAt >= now() - this many seconds`.
    pub updated_at_within_seconds: Option<i64>,
}

impl From<ActionFilterInput> for indexer_store::ActionFilter {
    fn from(filter: ActionFilterInput) -> Self {
        Self {
            ids: filter.ids,
            statuses: filter.statuses.map(|statuses| statuses.into_iter().map(Into::into).collect()),
            types: filter.types.map(|types| types.into_iter().map(Into::into).collect()),
            deployment_id: filter.deployment_id.map(DeploymentId::from),
            allocation_id: filter.allocation_id,
            source: filter.source,
            protocol_network: filter.protocol_network.map(NetworkIdentifier::new),
            updated_at_at_least: None,
            updated_at_within: filter.updated_at_within_seconds.map(chrono::Duration::seconds),
        }
    }
}

/// `POIDispute`.
#[derive(Debug, Clone, SimpleObject)]
pub struct GqlPoiDispute {
    /// Disputed allocation.
    pub allocation_id: String,
    /// Network the allocation lives on.
    pub protocol_network: String,
    /// Deployment the allocation indexes.
    pub subgraph_deployment_id: String,
    /// The allocating indexer.
    pub allocation_indexer: String,
    /// The indexer's submitted POI.
    pub indexer_proof: Option<String>,
    /// The bisection-derived reference POI, once resolved.
    pub bisection_proof: Option<String>,
    /// Current dispute status.
    pub status: String,
}

impl From<PoiDispute> for GqlPoiDispute {
    fn from(dispute: PoiDispute) -> Self {
        Self {
            allocation_id: dispute.allocation_id.0,
            protocol_network: dispute.protocol_network.0,
            subgraph_deployment_id: dispute.subgraph_deployment_id.0,
            allocation_indexer: dispute.allocation_indexer,
            indexer_proof: dispute.indexer_proof,
            bisection_proof: dispute.bisection_proof,
            status: dispute.status,
        }
    }
}

/// `storeDisputes([POIDisputeInput!]!)`.
#[derive(Debug, Clone, InputObject)]
pub struct PoiDisputeInput {
    /// Disputed allocation.
    pub allocation_id: String,
    /// Network the allocation lives on.
    pub protocol_network: String,
    /// Deployment the allocation indexes.
    pub subgraph_deployment_id: String,
    /// The allocating indexer.
    pub allocation_indexer: String,
    /// The indexer's submitted POI.
    pub indexer_proof: Option<String>,
    /// The bisection-derived reference POI, once resolved.
    pub bisection_proof: Option<String>,
    /// Current dispute status. Defaults to `"potential"`.
    #[graphql(default = "\"potential\".to_owned()")]
    pub status: String,
}

impl From<PoiDisputeInput> for PoiDispute {
    fn from(input: PoiDisputeInput) -> Self {
        Self {
            allocation_id: AllocationId::from(input.allocation_id),
            protocol_network: NetworkIdentifier::new(input.protocol_network),
            subgraph_deployment_id: DeploymentId::from(input.subgraph_deployment_id),
            allocation_indexer: input.allocation_indexer,
            indexer_proof: input.indexer_proof,
            bisection_proof: input.bisection_proof,
            status: input.status,
        }
    }
}

/// `Allocation`, as returned by `allocations`/`indexerAllocations`.
#[derive(Debug, Clone, SimpleObject)]
pub struct GqlAllocation {
    /// On-chain allocation id.
    pub id: String,
    /// Current chain-observed status.
    pub status: GqlAllocationStatus,
    /// Deployment this allocation indexes.
    pub subgraph_deployment: String,
    /// Indexer address that opened this allocation.
    pub indexer: String,
    /// Stake committed, as a decimal string.
    pub allocated_tokens: String,
    /// Epoch the allocation was opened in.
    pub created_at_epoch: u64,
    /// Epoch the allocation was closed in, if closed.
    pub closed_at_epoch: Option<u64>,
    /// Proof of indexing submitted at close, if any.
    pub poi: Option<String>,
    /// Network this allocation lives on.
    pub protocol_network: String,
}

impl From<indexer_common::Allocation> for GqlAllocation {
    fn from(allocation: indexer_common::Allocation) -> Self {
        Self {
            id: allocation.id.0,
            status: allocation.status.into(),
            subgraph_deployment: allocation.subgraph_deployment.0,
            indexer: allocation.indexer,
            allocated_tokens: allocation.allocated_tokens.to_string(),
            created_at_epoch: allocation.created_at_epoch,
            closed_at_epoch: allocation.closed_at_epoch,
            poi: allocation.poi,
            protocol_network: allocation.protocol_network.0,
        }
    }
}

/// On-chain allocation lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
pub enum GqlAllocationStatus {
    /// Never existed.
    Null,
    /// Open and earning rewards.
    Active,
    /// Closed, awaiting the dispute window.
    Closed,
    /// Closed and past the dispute window.
    Finalized,
    /// Rewards claimed.
    Claimed,
}

impl From<AllocationStatus> for GqlAllocationStatus {
    fn from(value: AllocationStatus) -> Self {
        match value {
            AllocationStatus::Null => Self::Null,
            AllocationStatus::Active => Self::Active,
            AllocationStatus::Closed => Self::Closed,
            AllocationStatus::Finalized => Self::Finalized,
            AllocationStatus::Claimed => Self::Claimed,
        }
    }
}

/// `createAllocation(deploymentID, amount, protocolNetwork)`.
#[derive(Debug, Clone, InputObject)]
pub struct CreateAllocationInput {
    /// Deployment to allocate to.
    pub deployment_id: String,
    /// Stake to commit, as a decimal string.
    pub amount: String,
    /// Network to allocate on.
    pub protocol_network: String,
}

/// `closeAllocation(allocationID, poi?, protocolNetwork)`.
#[derive(Debug, Clone, InputObject)]
pub struct CloseAllocationInput {
    /// Allocation to close.
    pub allocation_id: String,
    /// User-supplied proof of indexing, if any.
    pub poi: Option<String>,
    /// Network the allocation lives on.
    pub protocol_network: String,
    /// Deployment the allocation indexes.
    pub deployment_id: String,
}

/// `reallocateAllocation(allocationID, amount, protocolNetwork)`.
#[derive(Debug, Clone, InputObject)]
pub struct ReallocateAllocationInput {
    /// Allocation to close and reopen.
    pub allocation_id: String,
    /// Stake to commit to the new allocation, as a decimal string.
    pub amount: String,
    /// User-supplied proof of indexing for the close leg, if any.
    pub poi: Option<String>,
    /// Network the allocation lives on.
    pub protocol_network: String,
    /// Deployment the allocation indexes.
    pub deployment_id: String,
}

/// `indexerRegistration(protocolNetwork)`.
#[derive(Debug, Clone, SimpleObject)]
pub struct IndexerRegistration {
    /// Network this registration is on.
    pub protocol_network: String,
    /// Configured operator address.
    pub address: String,
}

/// `indexerEndpoints`, one entry per configured network.
#[derive(Debug, Clone, SimpleObject)]
pub struct IndexerEndpoint {
    /// Network these endpoints serve.
    pub protocol_network: String,
    /// Public query endpoint URL, if configured.
    pub url: Option<String>,
    /// Indexer service status endpoint URL, if configured.
    pub status_url: Option<String>,
}

/// `indexerDeployments`.
#[derive(Debug, Clone, SimpleObject)]
pub struct IndexerDeployment {
    /// The deployment this describes.
    pub deployment_id: String,
    /// Operator-facing display name, if known.
    pub display_name: Option<String>,
    /// `true` once the deployment has reached chain head at least once.
    pub synced: bool,
}
