// SPDX-License-Identifier: Apache-2.0
//! The batch executor (`spec.md` §4.7): prepare, submit, interpret,
//! back-write.

use crate::receipts::ReceiptCollector;
use crate::signal::MarketSignalProvider;
use crate::submit::{encode_call, BatchOutcome, ChainEvent, TransactionSubmitter};
use indexer_allocations::{AllocationManager, PreparedAction};
use indexer_common::{
    Action, ActionStatus, ActionType, AllocationId, DeploymentId, IdentifierType, IndexerError,
    IndexingRule, NetworkIdentifier,
};
use indexer_rules::is_worthy;
use indexer_store::Store;
use std::sync::Arc;

/// Sort approved actions into execution order: `(priority DESC, id ASC)`.
pub fn order_actions(actions: &mut [Action]) {
    actions.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.id.cmp(&b.id)));
}

/// Consumes an ordered batch of approved actions for a single network and
/// drives them through preparation, submission, and receipt
/// interpretation.
pub struct BatchExecutor<S> {
    store: S,
    allocations: AllocationManager,
    submitter: Arc<dyn TransactionSubmitter>,
    receipts: Arc<dyn ReceiptCollector>,
    signal: Arc<dyn MarketSignalProvider>,
}

impl<S> BatchExecutor<S>
where
    S: Store,
{
    /// Construct an executor for one network's batch.
    pub fn new(
        store: S,
        allocations: AllocationManager,
        submitter: Arc<dyn TransactionSubmitter>,
        receipts: Arc<dyn ReceiptCollector>,
        signal: Arc<dyn MarketSignalProvider>,
    ) -> Self {
        Self { store, allocations, submitter, receipts, signal }
    }

    /// Execute `actions` against `network`, returning every action at its
    /// final (`success`/`failed`) status, persisted to the store.
    pub async fn execute_batch(
        &self,
        network: &NetworkIdentifier,
        mut actions: Vec<Action>,
    ) -> Result<Vec<Action>, IndexerError> {
        order_actions(&mut actions);

        let mut prepared = Vec::new();
        let mut failed = Vec::new();
        for mut action in actions {
            match self.prepare_one(network, &action).await {
                Ok(value) => prepared.push((action, value)),
                Err(err) => {
                    action.status = ActionStatus::Failed;
                    action.failure_reason = Some(err.to_string());
                    failed.push(action);
                }
            }
        }

        if prepared.is_empty() {
            return self.persist_all(failed).await;
        }

        let calls: Vec<_> = prepared.iter().map(|(_, value)| encode_call(value)).collect();
        let outcome = self.submitter.submit_multicall(network, &calls).await?;

        let mut settled = match outcome {
            BatchOutcome::Paused => fail_all(prepared, "Operator is paused"),
            BatchOutcome::Unauthorized => fail_all(prepared, "Operator not authorized"),
            BatchOutcome::Events(events) => self.settle_events(network, prepared, &events).await?,
        };
        settled.append(&mut failed);

        self.persist_all(settled).await
    }

    async fn prepare_one(&self, network: &NetworkIdentifier, action: &Action) -> Result<PreparedAction, IndexerError> {
        match action.action_type {
            ActionType::Allocate => {
                let amount = action.amount.ok_or_else(|| {
                    IndexerError::Validation("allocate action is missing required field 'amount'".to_owned())
                })?;
                self.allocations.allocate(network, action.deployment_id.clone(), amount).await
            }
            ActionType::Unallocate => {
                let allocation_id = action.allocation_id.clone().ok_or_else(|| {
                    IndexerError::Validation("unallocate action is missing required field 'allocationID'".to_owned())
                })?;
                self.allocations
                    .unallocate(network, allocation_id, action.poi.as_deref(), action.force)
                    .await
            }
            ActionType::Reallocate => {
                let allocation_id = action.allocation_id.clone().ok_or_else(|| {
                    IndexerError::Validation("reallocate action is missing required field 'allocationID'".to_owned())
                })?;
                let amount = action.amount.ok_or_else(|| {
                    IndexerError::Validation("reallocate action is missing required field 'amount'".to_owned())
                })?;
                self.allocations
                    .reallocate(network, allocation_id, action.poi.as_deref(), amount, action.force)
                    .await
            }
        }
    }

    async fn settle_events(
        &self,
        network: &NetworkIdentifier,
        prepared: Vec<(Action, PreparedAction)>,
        events: &[ChainEvent],
    ) -> Result<Vec<Action>, IndexerError> {
        let mut settled = Vec::with_capacity(prepared.len());
        for (mut action, value) in prepared {
            match value {
                PreparedAction::Allocate { deployment, allocation_id, .. } => {
                    if created_event_matches(events, &deployment, &allocation_id) {
                        action.status = ActionStatus::Success;
                        action.allocation_id = Some(allocation_id.clone());
                        self.receipts.allocation_opened(network, &deployment, &allocation_id).await?;
                        self.backwrite_always_if_unworthy(network, &deployment).await?;
                    } else {
                        action.status = ActionStatus::Failed;
                        action.failure_reason = Some("never mined".to_owned());
                    }
                }
                PreparedAction::Unallocate { allocation_id, poi } => {
                    if closed_event_matches(events, &allocation_id) {
                        action.status = ActionStatus::Success;
                        action.poi = Some(poi);
                        self.receipts.allocation_closed(network, &allocation_id).await?;
                        self.backwrite_offchain(network, &action.deployment_id.clone()).await?;
                    } else {
                        action.status = ActionStatus::Failed;
                        action.failure_reason = Some("never mined".to_owned());
                    }
                }
                PreparedAction::Reallocate { closing_allocation_id, poi, allocation_id, .. } => {
                    let deployment = action.deployment_id.clone();
                    if closed_event_matches(events, &closing_allocation_id)
                        && created_event_matches(events, &deployment, &allocation_id)
                    {
                        action.status = ActionStatus::Success;
                        action.poi = Some(poi);
                        action.allocation_id = Some(allocation_id.clone());
                        self.receipts.allocation_closed(network, &closing_allocation_id).await?;
                        self.receipts.allocation_opened(network, &deployment, &allocation_id).await?;
                        self.backwrite_always_if_unworthy(network, &deployment).await?;
                    } else {
                        action.status = ActionStatus::Failed;
                        action.failure_reason = Some("never mined".to_owned());
                    }
                }
            }
            settled.push(action);
        }
        Ok(settled)
    }

    async fn backwrite_always_if_unworthy(
        &self,
        network: &NetworkIdentifier,
        deployment: &DeploymentId,
    ) -> Result<(), IndexerError> {
        let rules = self.store.fetch_rules(true, Some(network)).await?;
        let existing = rules.iter().find(|rule| rule.identifier == deployment.0);
        let already_worthy = match existing {
            Some(rule) => {
                let signal = self.signal.signal(network, deployment).await?;
                is_worthy(rule, &signal)
            }
            None => false,
        };
        if already_worthy {
            return Ok(());
        }
        self.store
            .upsert_rule(deployment_rule(deployment, network, indexer_common::DecisionBasis::Always))
            .await?;
        Ok(())
    }

    async fn backwrite_offchain(&self, network: &NetworkIdentifier, deployment: &DeploymentId) -> Result<(), IndexerError> {
        self.store
            .upsert_rule(deployment_rule(deployment, network, indexer_common::DecisionBasis::Offchain))
            .await?;
        Ok(())
    }

    async fn persist_all(&self, actions: Vec<Action>) -> Result<Vec<Action>, IndexerError> {
        let mut persisted = Vec::with_capacity(actions.len());
        for action in actions {
            persisted.push(self.store.upsert_action(action).await?);
        }
        Ok(persisted)
    }
}

fn fail_all(prepared: Vec<(Action, PreparedAction)>, reason: &str) -> Vec<Action> {
    prepared
        .into_iter()
        .map(|(mut action, _)| {
            action.status = ActionStatus::Failed;
            action.failure_reason = Some(reason.to_owned());
            action
        })
        .collect()
}

fn created_event_matches(events: &[ChainEvent], deployment: &DeploymentId, allocation_id: &AllocationId) -> bool {
    events.iter().any(|event| {
        matches!(
            event,
            ChainEvent::AllocationCreated { subgraph_deployment, allocation_id: id }
                if subgraph_deployment == deployment && id == allocation_id
        )
    })
}

fn closed_event_matches(events: &[ChainEvent], allocation_id: &AllocationId) -> bool {
    events
        .iter()
        .any(|event| matches!(event, ChainEvent::AllocationClosed { allocation_id: id } if id == allocation_id))
}

fn deployment_rule(
    deployment: &DeploymentId,
    network: &NetworkIdentifier,
    decision_basis: indexer_common::DecisionBasis,
) -> IndexingRule {
    IndexingRule {
        identifier: deployment.0.clone(),
        identifier_type: IdentifierType::Deployment,
        protocol_network: network.clone(),
        allocation_amount: None,
        parallel_allocations: None,
        max_allocation_percentage: None,
        min_signal: None,
        max_signal: None,
        min_stake: None,
        min_average_query_fees: None,
        allocation_lifetime: None,
        auto_renewal: None,
        custom: None,
        decision_basis,
        require_supported: true,
        safety: true,
    }
}
