// SPDX-License-Identifier: Apache-2.0
//! The worthiness predicate (`spec.md` §4.3/§4.8): for a deployment, true
//! iff a rule matching it exists and its decision basis and thresholds
//! would select it against current on-chain signal/stake. Kept as pure
//! logic over a plain-data snapshot so it never needs live I/O — callers
//! (the allocation manager, the reconciler) fetch a `MarketSignal` from
//! `indexer-network` and pass it in.

use indexer_common::{DecisionBasis, Grt, IndexingRule};

/// A point-in-time snapshot of the on-chain signal a rule's thresholds are
/// evaluated against: curation signal on the deployment, the indexer's
/// stake, and the deployment's trailing average query fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketSignal {
    /// Curation signal currently allocated to the deployment.
    pub signal: Grt,
    /// The indexer's available stake.
    pub stake: Grt,
    /// Trailing average query fees for the deployment.
    pub average_query_fees: Grt,
}

/// Evaluate whether `rule` selects its deployment given `signal`, per
/// `spec.md` §4.8's partition rule: `always` and `dips` bases pass
/// unconditionally, `rules` passes only if every threshold set on the rule
/// is satisfied, and `never`/`offchain` never pass (the reconciler routes
/// `offchain` deployments to a separate non-allocating partition, but the
/// worthiness predicate itself only answers "would this rule allocate").
#[must_use]
pub fn is_worthy(rule: &IndexingRule, signal: &MarketSignal) -> bool {
    match rule.decision_basis {
        DecisionBasis::Always | DecisionBasis::Dips => true,
        DecisionBasis::Never | DecisionBasis::Offchain => false,
        DecisionBasis::Rules => {
            rule.min_signal.is_none_or(|min| signal.signal >= min)
                && rule.max_signal.is_none_or(|max| signal.signal <= max)
                && rule.min_stake.is_none_or(|min| signal.stake >= min)
                && rule
                    .min_average_query_fees
                    .is_none_or(|min| signal.average_query_fees >= min)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexer_common::{IdentifierType, NetworkIdentifier};

    fn base_rule(decision_basis: DecisionBasis) -> IndexingRule {
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

    fn signal(signal: u128, stake: u128, average_query_fees: u128) -> MarketSignal {
        MarketSignal {
            signal: Grt(signal),
            stake: Grt(stake),
            average_query_fees: Grt(average_query_fees),
        }
    }

    #[test]
    fn always_basis_is_always_worthy() {
        let rule = base_rule(DecisionBasis::Always);
        assert!(is_worthy(&rule, &signal(0, 0, 0)));
    }

    #[test]
    fn dips_basis_is_always_worthy() {
        let rule = base_rule(DecisionBasis::Dips);
        assert!(is_worthy(&rule, &signal(0, 0, 0)));
    }

    #[test]
    fn never_basis_is_never_worthy() {
        let rule = base_rule(DecisionBasis::Never);
        assert!(!is_worthy(&rule, &signal(1_000_000, 1_000_000, 1_000_000)));
    }

    #[test]
    fn offchain_basis_is_never_worthy() {
        let rule = base_rule(DecisionBasis::Offchain);
        assert!(!is_worthy(&rule, &signal(1_000_000, 1_000_000, 1_000_000)));
    }

    #[test]
    fn rules_basis_with_no_thresholds_is_worthy() {
        let rule = base_rule(DecisionBasis::Rules);
        assert!(is_worthy(&rule, &signal(0, 0, 0)));
    }

    #[test]
    fn rules_basis_respects_min_signal() {
        let mut rule = base_rule(DecisionBasis::Rules);
        rule.min_signal = Some(Grt(100));
        assert!(!is_worthy(&rule, &signal(50, 0, 0)));
        assert!(is_worthy(&rule, &signal(100, 0, 0)));
    }

    #[test]
    fn rules_basis_respects_max_signal() {
        let mut rule = base_rule(DecisionBasis::Rules);
        rule.max_signal = Some(Grt(100));
        assert!(!is_worthy(&rule, &signal(150, 0, 0)));
        assert!(is_worthy(&rule, &signal(100, 0, 0)));
    }

    #[test]
    fn rules_basis_respects_min_stake_and_min_average_query_fees() {
        let mut rule = base_rule(DecisionBasis::Rules);
        rule.min_stake = Some(Grt(10));
        rule.min_average_query_fees = Some(Grt(5));
        assert!(!is_worthy(&rule, &signal(0, 9, 5)));
        assert!(!is_worthy(&rule, &signal(0, 10, 4)));
        assert!(is_worthy(&rule, &signal(0, 10, 5)));
    }
}
