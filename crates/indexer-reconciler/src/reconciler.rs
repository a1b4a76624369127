// SPDX-License-Identifier: Apache-2.0
//! The per-network reconciler loop (`spec.md` §4.8, §5): one pass reads
//! merged rules, live allocations, cost models, and capacity; partitions
//! the deployment universe; diffs the target allocation set against
//! actuals; queues the resulting actions; approves and executes its own
//! queued proposals as a single batch.
//!
//! `spec.md`'s pipeline diagram shows reconciler → queue → approved →
//! batch executor as one continuous flow with no named operator-gating
//! step for the reconciler's own proposals, so this crate auto-approves
//! what it just queued each pass. Manual `queueActions` submitted through
//! the Management API remain gated behind an explicit `approveActions`
//! call — this crate never touches actions it did not itself enqueue.

use crate::{partition, target};
use indexer_common::{Action, AllocationStatus, DeploymentId, IndexerError, NetworkIdentifier, GLOBAL_IDENTIFIER};
use indexer_executor::{BatchExecutor, MarketSignalProvider, ReceiptCollector, TransactionSubmitter};
use indexer_network::NetworkMonitor;
use indexer_queue::QueueService;
use indexer_store::Store;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Drives reconciliation for exactly one `(network, operator)` pair.
/// Holds a non-blocking lock so that at most one pass is ever in flight
/// (`spec.md` §5): a tick arriving while a pass is running is skipped
/// rather than queued up behind it.
pub struct Reconciler<S> {
    store: S,
    network_monitor: NetworkMonitor,
    queue: QueueService<S>,
    executor: BatchExecutor<S>,
    signal: Arc<dyn MarketSignalProvider>,
    indexer: String,
    protocol_network: NetworkIdentifier,
    guard: Mutex<()>,
    pass_timeout: Duration,
}

impl<S> Reconciler<S>
where
    S: Store + Clone,
{
    /// Compose a reconciler for one network from its collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: S,
        network_monitor: NetworkMonitor,
        allocations: indexer_allocations::AllocationManager,
        submitter: Arc<dyn TransactionSubmitter>,
        receipts: Arc<dyn ReceiptCollector>,
        signal: Arc<dyn MarketSignalProvider>,
        indexer: String,
        protocol_network: NetworkIdentifier,
        queue_throttle_window: chrono::Duration,
        pass_timeout: Duration,
    ) -> Self {
        let queue = QueueService::new(store.clone(), network_monitor.clone(), queue_throttle_window);
        let executor = BatchExecutor::new(store.clone(), allocations, submitter, receipts, signal.clone());
        Self {
            store,
            network_monitor,
            queue,
            executor,
            signal,
            indexer,
            protocol_network,
            guard: Mutex::new(()),
            pass_timeout,
        }
    }

    /// Run one reconciler pass if none is currently in flight, bounded by
    /// `pass_timeout`. Returns the settled actions from the batch this
    /// pass executed, or an empty vec if there was nothing to do or a
    /// pass was already running.
    pub async fn tick(&self) -> Result<Vec<Action>, IndexerError> {
        let Ok(_permit) = self.guard.try_lock() else {
            tracing::info!(protocol_network = %self.protocol_network, "reconciler pass already in flight, skipping tick");
            return Ok(Vec::new());
        };

        match tokio::time::timeout(self.pass_timeout, self.run_pass()).await {
            Ok(result) => result,
            Err(_) => Err(IndexerError::ExternalRead(format!(
                "reconciler pass for network '{}' timed out",
                self.protocol_network
            ))),
        }
    }

    #[tracing::instrument(skip(self), fields(protocol_network = %self.protocol_network))]
    async fn run_pass(&self) -> Result<Vec<Action>, IndexerError> {
        let rules = self.store.fetch_rules(true, Some(&self.protocol_network)).await?;
        let active = self
            .network_monitor
            .allocations_by_status(&self.protocol_network, &self.indexer, &[AllocationStatus::Active])
            .await?;
        let _cost_models = self.store.latest_cost_models(&self.protocol_network, None).await?;
        let epoch = self.network_monitor.epoch_info(&self.protocol_network).await?;
        let capacity = self.network_monitor.free_stake(&self.protocol_network, &self.indexer).await?;
        tracing::debug!(free_stake = %capacity, epoch = epoch.number, "reconciler pass starting");

        let mut proposed = Vec::new();
        let mut managed_identifiers: HashSet<String> = HashSet::new();

        for rule in rules.iter().filter(|rule| rule.identifier != GLOBAL_IDENTIFIER) {
            let deployment = DeploymentId(rule.identifier.clone());
            let signal = self.signal.signal(&self.protocol_network, &deployment).await?;
            if partition::classify(rule, &signal) != partition::Partition::Manage {
                continue;
            }
            managed_identifiers.insert(rule.identifier.clone());
            let deployment_active: Vec<_> =
                active.iter().filter(|allocation| allocation.subgraph_deployment == deployment).cloned().collect();
            proposed.extend(target::diff_managed_deployment(
                rule,
                &deployment,
                &deployment_active,
                epoch.number,
                &self.protocol_network,
            ));
        }

        let out_of_scope: Vec<_> = active
            .iter()
            .filter(|allocation| !managed_identifiers.contains(&allocation.subgraph_deployment.0))
            .cloned()
            .collect();
        proposed.extend(target::unallocate_out_of_scope(&out_of_scope, &self.protocol_network));

        let mut queued_ids = Vec::new();
        for action in proposed {
            match self.queue.queue(vec![action]).await {
                Ok(mut queued) => {
                    if let Some(id) = queued.pop().and_then(|action| action.id) {
                        queued_ids.push(id);
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "reconciler failed to queue a proposed action");
                }
            }
        }

        if queued_ids.is_empty() {
            return Ok(Vec::new());
        }

        let approved = self.queue.approve(&queued_ids).await?;
        self.executor.execute_batch(&self.protocol_network, approved).await
    }
}
