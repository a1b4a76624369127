// SPDX-License-Identifier: Apache-2.0
//! A thin service that validates rules before delegating storage to a
//! [`Store`], and applies the authoritative merge on read.

use indexer_common::{IndexerError, IndexingRule, NetworkIdentifier};
use indexer_store::{RuleKey, Store};

use crate::merge::merge_all;
use crate::validate::validate_rule;

/// Validates and merges on top of whatever `S` persists.
pub struct RuleService<S> {
    store: S,
}

impl<S> RuleService<S> {
    /// Create a new service using the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> RuleService<S>
where
    S: Store,
{
    /// Validate and persist `rule`. Rejects before reaching the store if
    /// `validate_rule` fails.
    pub async fn set_rule(&self, rule: IndexingRule) -> Result<IndexingRule, IndexerError> {
        validate_rule(&rule)?;
        self.store.upsert_rule(rule).await
    }

    /// Fetch rules for `network` (or every network if `None`). When
    /// `merged` is set, deployment rules are merged onto their network's
    /// global rule via [`crate::merge`]; this is the single authoritative
    /// merge used outside the store's own internal bookkeeping.
    pub async fn rules(
        &self,
        merged: bool,
        network: Option<&NetworkIdentifier>,
    ) -> Result<Vec<IndexingRule>, IndexerError> {
        let rows = self.store.fetch_rules(false, network).await?;
        Ok(if merged { merge_all(&rows) } else { rows })
    }

    /// Delete the given rule keys. See [`Store::delete_rules`] for the
    /// global-rule reinsertion behavior.
    pub async fn delete_rules(&self, keys: &[RuleKey]) -> Result<u64, IndexerError> {
        self.store.delete_rules(keys).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexer_common::{DecisionBasis, IdentifierType};
    use indexer_store::MemoryStore;

    fn deployment_rule(network: &NetworkIdentifier, max_allocation_percentage: f64) -> IndexingRule {
        IndexingRule {
            identifier: "Qmfoo".to_owned(),
            identifier_type: IdentifierType::Deployment,
            protocol_network: network.clone(),
            allocation_amount: None,
            parallel_allocations: None,
            max_allocation_percentage: Some(max_allocation_percentage),
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

    #[tokio::test]
    async fn set_rule_rejects_invalid_percentage() {
        let service = RuleService::new(MemoryStore::new());
        let network = NetworkIdentifier::new("eip155:1");
        let result = service.set_rule(deployment_rule(&network, 1.5)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn set_rule_then_read_merged_falls_back_to_global_defaults() {
        let service = RuleService::new(MemoryStore::new());
        let network = NetworkIdentifier::new("eip155:1");
        let stored = service.set_rule(deployment_rule(&network, 0.5)).await;
        assert!(stored.is_ok());

        let merged = service.rules(true, Some(&network)).await.unwrap_or_default();
        let deployment = merged.iter().find(|r| r.identifier == "Qmfoo");
        assert_eq!(
            deployment.and_then(|r| r.max_allocation_percentage),
            Some(0.5)
        );
        assert_eq!(
            deployment.map(|r| r.decision_basis),
            Some(DecisionBasis::Rules)
        );
    }
}
