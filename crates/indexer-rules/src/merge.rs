// SPDX-License-Identifier: Apache-2.0
//! The authoritative deployment/global merge (`spec.md` §4.3): the
//! deployment rule is the base; any field it leaves unset falls back to
//! its network's global rule. The merged result is never stored.

use indexer_common::IndexingRule;

/// Merge `deployment` onto `global`: every `Option` field null on
/// `deployment` is replaced by `global`'s value. `decision_basis`,
/// `require_supported`, and `safety` are not `Option`s and always come
/// from `deployment` — a deployment rule always states them explicitly
/// (`IndexingRule::default_global` supplies the network-wide baseline).
pub fn merge(deployment: &IndexingRule, global: &IndexingRule) -> IndexingRule {
    if deployment.is_global() {
        return deployment.clone();
    }
    IndexingRule {
        identifier: deployment.identifier.clone(),
        identifier_type: deployment.identifier_type,
        protocol_network: deployment.protocol_network.clone(),
        allocation_amount: deployment.allocation_amount.or(global.allocation_amount),
        parallel_allocations: deployment.parallel_allocations.or(global.parallel_allocations),
        max_allocation_percentage: deployment
            .max_allocation_percentage
            .or(global.max_allocation_percentage),
        min_signal: deployment.min_signal.or(global.min_signal),
        max_signal: deployment.max_signal.or(global.max_signal),
        min_stake: deployment.min_stake.or(global.min_stake),
        min_average_query_fees: deployment
            .min_average_query_fees
            .or(global.min_average_query_fees),
        allocation_lifetime: deployment.allocation_lifetime.or(global.allocation_lifetime),
        auto_renewal: deployment.auto_renewal.or(global.auto_renewal),
        custom: deployment.custom.clone().or_else(|| global.custom.clone()),
        decision_basis: deployment.decision_basis,
        require_supported: deployment.require_supported,
        safety: deployment.safety,
    }
}

/// Merge every rule in `rules` against its network's global rule. Rules
/// for which no global rule is present in the slice are returned
/// unchanged (the store guarantees a global always exists per network,
/// but this function stays total rather than panicking if it doesn't).
pub fn merge_all(rules: &[IndexingRule]) -> Vec<IndexingRule> {
    rules
        .iter()
        .map(|rule| {
            if rule.is_global() {
                rule.clone()
            } else {
                rules
                    .iter()
                    .find(|candidate| candidate.is_global() && candidate.protocol_network == rule.protocol_network)
                    .map_or_else(|| rule.clone(), |global| merge(rule, global))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexer_common::{DecisionBasis, Grt, IdentifierType, NetworkIdentifier};

    fn global() -> IndexingRule {
        IndexingRule::default_global(NetworkIdentifier::new("eip155:1"))
    }

    fn deployment_rule() -> IndexingRule {
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
            decision_basis: DecisionBasis::Always,
            require_supported: true,
            safety: true,
        }
    }

    #[test]
    fn unset_deployment_fields_fall_back_to_global() {
        let merged = merge(&deployment_rule(), &global());
        assert_eq!(merged.allocation_amount, global().allocation_amount);
        assert_eq!(merged.parallel_allocations, global().parallel_allocations);
        assert_eq!(merged.decision_basis, DecisionBasis::Always);
    }

    #[test]
    fn set_deployment_fields_win_over_global() {
        let mut rule = deployment_rule();
        rule.allocation_amount = Some(Grt(42));
        let merged = merge(&rule, &global());
        assert_eq!(merged.allocation_amount, Some(Grt(42)));
    }

    #[test]
    fn merge_is_idempotent() {
        let once = merge(&deployment_rule(), &global());
        let twice = merge(&once, &global());
        assert_eq!(once, twice);
    }

    #[test]
    fn merge_all_skips_the_global_rule_itself() {
        let rules = vec![global(), deployment_rule()];
        let merged = merge_all(&rules);
        let global_entry = merged.iter().find(|r| r.is_global());
        assert_eq!(global_entry, Some(&global()));
    }
}
