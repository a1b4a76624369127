// SPDX-License-Identifier: Apache-2.0
//! Request-scoped dependencies shared by every resolver (`spec.md` §6).
//!
//! One `ApiContext` is built at startup and handed to `async-graphql` as
//! shared data; every resolver pulls its collaborators out of it rather
//! than constructing its own.

use indexer_common::{IndexerError, NetworkIdentifier};
use indexer_network::NetworkMonitor;
use indexer_queue::QueueService;
use indexer_rules::RuleService;
use indexer_store::Store;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-network endpoint URLs surfaced by `indexerEndpoints` (`spec.md` §6).
#[derive(Debug, Clone, Default)]
pub struct IndexerEndpointConfig {
    /// Public query endpoint, if configured.
    pub url: Option<String>,
    /// Indexer service status endpoint, if configured.
    pub status_url: Option<String>,
}

/// Everything a resolver needs, keyed per network where the operation is
/// network-scoped.
pub struct ApiContext {
    store: Arc<dyn Store>,
    rules: RuleService<Arc<dyn Store>>,
    queues: HashMap<NetworkIdentifier, QueueService<Arc<dyn Store>>>,
    networks: HashMap<NetworkIdentifier, NetworkMonitor>,
    indexer_addresses: HashMap<NetworkIdentifier, String>,
    endpoints: HashMap<NetworkIdentifier, IndexerEndpointConfig>,
}

impl ApiContext {
    /// Assemble a context from already-constructed per-network collaborators.
    pub fn new(
        store: Arc<dyn Store>,
        queues: HashMap<NetworkIdentifier, QueueService<Arc<dyn Store>>>,
        networks: HashMap<NetworkIdentifier, NetworkMonitor>,
        indexer_addresses: HashMap<NetworkIdentifier, String>,
        endpoints: HashMap<NetworkIdentifier, IndexerEndpointConfig>,
    ) -> Self {
        let rules = RuleService::new(store.clone());
        Self { store, rules, queues, networks, indexer_addresses, endpoints }
    }

    /// The shared store, for direct cost-model/dispute access.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// The shared rule service.
    pub fn rules(&self) -> &RuleService<Arc<dyn Store>> {
        &self.rules
    }

    /// All configured networks, in unspecified order.
    pub fn configured_networks(&self) -> impl Iterator<Item = &NetworkIdentifier> {
        self.networks.keys()
    }

    /// The queue for `network`, or a validation error naming the network.
    pub fn queue(&self, network: &NetworkIdentifier) -> Result<&QueueService<Arc<dyn Store>>, IndexerError> {
        self.queues.get(network).ok_or_else(|| unconfigured(network))
    }

    /// The network monitor for `network`, or a validation error.
    pub fn monitor(&self, network: &NetworkIdentifier) -> Result<&NetworkMonitor, IndexerError> {
        self.networks.get(network).ok_or_else(|| unconfigured(network))
    }

    /// The configured operator/indexer address for `network`, or a
    /// validation error.
    pub fn indexer_address(&self, network: &NetworkIdentifier) -> Result<&str, IndexerError> {
        self.indexer_addresses
            .get(network)
            .map(String::as_str)
            .ok_or_else(|| unconfigured(network))
    }

    /// Every `(network, address)` pair this agent is configured for.
    pub fn indexer_addresses(&self) -> impl Iterator<Item = (&NetworkIdentifier, &str)> {
        self.indexer_addresses.iter().map(|(network, address)| (network, address.as_str()))
    }

    /// Every configured endpoint entry, including networks with no
    /// endpoints set (an empty [`IndexerEndpointConfig`]).
    pub fn endpoints(&self) -> impl Iterator<Item = (&NetworkIdentifier, &IndexerEndpointConfig)> {
        self.endpoints.iter()
    }
}

fn unconfigured(network: &NetworkIdentifier) -> IndexerError {
    IndexerError::Validation(format!("network '{network}' is not configured on this agent"))
}
