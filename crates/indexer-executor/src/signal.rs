// SPDX-License-Identifier: Apache-2.0
//! Live market-signal lookups the rule back-write step needs to evaluate
//! the worthiness predicate (`indexer_rules::is_worthy`) before deciding
//! whether a deployment already has a matching rule.

use async_trait::async_trait;
use indexer_common::{DeploymentId, IndexerError, NetworkIdentifier};
use indexer_rules::MarketSignal;

/// Supplies the current on-chain signal/stake/query-fee snapshot a rule's
/// thresholds are evaluated against. Kept as its own small capability
/// (Design Note 9) so the executor does not need to know how signal is
/// sourced (subgraph curation reads, GNS queries, etc).
#[async_trait]
pub trait MarketSignalProvider: Send + Sync {
    /// Current market signal for `deployment` on `network`.
    async fn signal(
        &self,
        network: &NetworkIdentifier,
        deployment: &DeploymentId,
    ) -> Result<MarketSignal, IndexerError>;
}
