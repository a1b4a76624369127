// SPDX-License-Identifier: Apache-2.0
//! Rule validation (`spec.md` §3 invariants): numeric fields are
//! non-negative by construction (`Grt`/`u32`/`u64` cannot be negative),
//! the one field that needs an explicit bound is `maxAllocationPercentage`.

use indexer_common::{IndexerError, IndexingRule};

/// Validate `rule` against the `spec.md` §3 invariants not already
/// enforced by the type system. Currently: `maxAllocationPercentage`, if
/// set, must lie in `[0, 1]`.
pub fn validate_rule(rule: &IndexingRule) -> Result<(), IndexerError> {
    if let Some(percentage) = rule.max_allocation_percentage {
        if !(0.0..=1.0).contains(&percentage) {
            return Err(IndexerError::Validation(format!(
                "rule '{}' on network '{}' has maxAllocationPercentage {percentage} outside \
                 the valid range [0, 1]",
                rule.identifier, rule.protocol_network
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexer_common::{DecisionBasis, IdentifierType, NetworkIdentifier};

    fn rule(max_allocation_percentage: Option<f64>) -> IndexingRule {
        IndexingRule {
            identifier: "Qmfoo".to_owned(),
            identifier_type: IdentifierType::Deployment,
            protocol_network: NetworkIdentifier::new("eip155:1"),
            allocation_amount: None,
            parallel_allocations: None,
            max_allocation_percentage,
            min_signal: None,
            max_signal: None,
            min_stake: None,
            min_average_query_fees: None,
            allocation_lifetime: None,
            auto_renewal: None,
            custom: None,
            decision_basis: DecisionBasis::Rules,
            require_supported: true,
            safety: true,
        }
    }

    #[test]
    fn in_range_percentage_is_valid() {
        assert!(validate_rule(&rule(Some(0.5))).is_ok());
        assert!(validate_rule(&rule(Some(0.0))).is_ok());
        assert!(validate_rule(&rule(Some(1.0))).is_ok());
    }

    #[test]
    fn out_of_range_percentage_is_rejected() {
        assert!(validate_rule(&rule(Some(1.5))).is_err());
        assert!(validate_rule(&rule(Some(-0.1))).is_err());
    }

    #[test]
    fn unset_percentage_is_valid() {
        assert!(validate_rule(&rule(None)).is_ok());
    }
}
