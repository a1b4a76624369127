// SPDX-License-Identifier: Apache-2.0
//! The §4.8 deployment partition: `manage` / `offchain` / `never`.

use indexer_common::{DecisionBasis, IndexingRule};
use indexer_rules::{is_worthy, MarketSignal};

/// Which of the three reconciler buckets a rule falls into this pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    /// Thresholds pass; the reconciler should hold the target allocation
    /// set for this deployment.
    Manage,
    /// Keep syncing but never allocate.
    Offchain,
    /// Neither indexing nor allocating is warranted right now.
    Never,
}

/// Classify `rule` against `signal`, per `spec.md` §4.8.
#[must_use]
pub fn classify(rule: &IndexingRule, signal: &MarketSignal) -> Partition {
    if rule.decision_basis == DecisionBasis::Offchain {
        return Partition::Offchain;
    }
    if is_worthy(rule, signal) {
        Partition::Manage
    } else {
        Partition::Never
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexer_common::{Grt, IdentifierType, NetworkIdentifier};

    fn rule(decision_basis: DecisionBasis) -> IndexingRule {
        IndexingRule {
            identifier: "Qmfoo".to_owned(),
            identifier_type: IdentifierType::Deployment,
            protocol_network: NetworkIdentifier::new("eip155:1"),
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

    fn zero_signal() -> MarketSignal {
        MarketSignal { signal: Grt::ZERO, stake: Grt::ZERO, average_query_fees: Grt::ZERO }
    }

    #[test]
    fn offchain_basis_is_offchain_regardless_of_signal() {
        assert_eq!(classify(&rule(DecisionBasis::Offchain), &zero_signal()), Partition::Offchain);
    }

    #[test]
    fn always_basis_is_managed() {
        assert_eq!(classify(&rule(DecisionBasis::Always), &zero_signal()), Partition::Manage);
    }

    #[test]
    fn never_basis_is_never() {
        assert_eq!(classify(&rule(DecisionBasis::Never), &zero_signal()), Partition::Never);
    }

    #[test]
    fn rules_basis_below_threshold_is_never() {
        let mut r = rule(DecisionBasis::Rules);
        r.min_signal = Some(Grt(100));
        assert_eq!(classify(&r, &zero_signal()), Partition::Never);
    }
}
