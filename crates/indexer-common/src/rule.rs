// SPDX-License-Identifier: Apache-2.0
//! `IndexingRule` — declarative per-deployment/global indexing policy.

use crate::{Grt, NetworkIdentifier};
use serde::{Deserialize, Serialize};

/// Sentinel identifier for the always-present global rule of a network.
pub const GLOBAL_IDENTIFIER: &str = "global";

/// What an `IndexingRule::identifier` names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentifierType {
    /// A single deployment, by content id.
    Deployment,
    /// A subgraph (a family of deployment versions).
    Subgraph,
    /// A named group of deployments.
    Group,
}

/// How a rule decides whether to allocate to its deployment(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionBasis {
    /// Evaluate thresholds against live network data.
    Rules,
    /// Never allocate.
    Never,
    /// Always allocate, independent of thresholds.
    Always,
    /// Indexing is driven off-chain (e.g. by a query-fee arrangement);
    /// keep syncing but do not allocate.
    Offchain,
    /// Driven by the direct indexer payment system (DIPS).
    Dips,
}

/// A declarative indexing rule: what to index and under what economic
/// conditions, for one `(identifier, protocolNetwork)` pair.
///
/// Every numeric field is `Option` so that a deployment-level rule can
/// leave it unset and fall back to the network's global rule — see the
/// merge semantics in `indexer-rules`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingRule {
    /// Deployment content id, or [`GLOBAL_IDENTIFIER`].
    pub identifier: String,
    /// What kind of thing `identifier` names.
    pub identifier_type: IdentifierType,
    /// CAIP-2 network this rule applies to.
    pub protocol_network: NetworkIdentifier,
    /// Total stake to commit across all parallel allocations.
    pub allocation_amount: Option<Grt>,
    /// How many simultaneous allocations to maintain.
    pub parallel_allocations: Option<u32>,
    /// Refuse to allocate more than this fraction of total network stake.
    pub max_allocation_percentage: Option<f64>,
    /// Minimum curation signal required to allocate.
    pub min_signal: Option<Grt>,
    /// Maximum curation signal permitted.
    pub max_signal: Option<Grt>,
    /// Minimum own stake required to allocate.
    pub min_stake: Option<Grt>,
    /// Minimum average query fees required to allocate.
    pub min_average_query_fees: Option<Grt>,
    /// Epochs an allocation may live before renewal/closure.
    pub allocation_lifetime: Option<u64>,
    /// Reallocate instead of closing when lifetime expires.
    pub auto_renewal: Option<bool>,
    /// Free-form extension bag (also used for internal migration markers,
    /// see `SPEC_FULL.md` §3).
    pub custom: Option<serde_json::Value>,
    /// Which decision basis governs this rule.
    pub decision_basis: DecisionBasis,
    /// Require the deployment be marked "supported" upstream.
    pub require_supported: bool,
    /// Apply conservative safety checks before allocating.
    pub safety: bool,
}

impl IndexingRule {
    /// The always-present default global rule for a network, recreated
    /// whenever the stored global rule is deleted (`spec.md` §3 invariant,
    /// scenario S5).
    pub fn default_global(protocol_network: NetworkIdentifier) -> Self {
        Self {
            identifier: GLOBAL_IDENTIFIER.to_owned(),
            identifier_type: IdentifierType::Group,
            protocol_network,
            allocation_amount: Some(Grt(100_000_000_000_000_000_000)),
            parallel_allocations: Some(1),
            max_allocation_percentage: None,
            min_signal: None,
            max_signal: None,
            min_stake: None,
            min_average_query_fees: None,
            allocation_lifetime: None,
            auto_renewal: Some(true),
            custom: None,
            decision_basis: DecisionBasis::Rules,
            require_supported: true,
            safety: true,
        }
    }

    /// `true` when this rule is the network's global rule.
    pub fn is_global(&self) -> bool {
        self.identifier == GLOBAL_IDENTIFIER
    }
}
