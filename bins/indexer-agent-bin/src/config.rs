// SPDX-License-Identifier: Apache-2.0
//! Startup configuration (`SPEC_FULL.md` §4.11): a single TOML file,
//! loaded from a `clap` flag or `INDEXER_AGENT_CONFIG`, describing the
//! operator's Postgres connection and one `[[network]]` table per
//! chain this agent manages.

use indexer_common::{Grt, IndexerError, NetworkIdentifier};
use serde::Deserialize;
use std::path::Path;

/// Top-level config file shape.
#[derive(Debug, Deserialize)]
pub struct AgentConfig {
    /// Postgres connection string for the persistence adapter. When
    /// absent the agent falls back to an in-memory store, useful for
    /// local trials but never durable across restarts.
    pub database_url: Option<String>,
    /// HTTP listen address for the GraphQL management API.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    /// BIP-39 mnemonic used to derive both the allocation-id signing key
    /// and the transaction-signing wallet. Same caveat as upstream: this
    /// is operator key material, never logged.
    pub mnemonic: String,
    /// One entry per chain this agent indexes on.
    #[serde(rename = "network")]
    pub networks: Vec<NetworkConfig>,
}

fn default_listen_address() -> String {
    "0.0.0.0:7600".to_owned()
}

/// Per-network connection details and defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// CAIP-2 network tag or known alias (`"mainnet"`, `"eip155:1"`, ...).
    pub identifier: String,
    /// The operator's own address, used to derive proof signatures.
    pub operator_address: String,
    /// The indexer address whose capacity and allocations this agent
    /// manages on this network.
    pub indexer_address: String,
    /// Staking contract address on this network.
    pub staking_contract_address: String,
    /// Indexing subgraph GraphQL endpoint.
    pub subgraph_url: String,
    /// Chain JSON-RPC endpoint, used both for contract reads and for
    /// submitting signed transactions.
    pub rpc_url: String,
    /// Local deployment node JSON-RPC endpoint.
    pub deployment_node_url: String,
    /// Node id new deployments are assigned to on this network.
    pub deployment_node_id: String,
    /// Hex-encoded 32-byte allocation-id signing key, distinct from
    /// `mnemonic` (`spec.md` §4.6's allocation-id proof).
    pub allocation_id_key: String,
    /// How often the reconciler ticks for this network.
    #[serde(default = "default_reconciliation_interval_seconds")]
    pub reconciliation_interval_seconds: u64,
    /// Seed values for this network's always-present global rule.
    #[serde(default)]
    pub default_allocation_amount: Option<Grt>,
    /// Seed value for the same rule's `parallelAllocations`.
    #[serde(default = "default_parallel_allocations")]
    pub default_parallel_allocations: u32,
    /// This indexer's public query endpoint, for the `indexerEndpoints`
    /// GraphQL query. Not used for any outbound call.
    #[serde(default)]
    pub query_endpoint: Option<String>,
    /// This indexer's status endpoint, for the same query.
    #[serde(default)]
    pub status_endpoint: Option<String>,
}

fn default_reconciliation_interval_seconds() -> u64 {
    120
}

fn default_parallel_allocations() -> u32 {
    1
}

impl NetworkConfig {
    /// Canonicalise `identifier` through the CAIP-2 alias table.
    pub fn canonical_identifier(&self) -> Result<NetworkIdentifier, IndexerError> {
        indexer_ids::resolve_alias(&self.identifier)
            .map_err(|e| IndexerError::Fatal(format!("invalid network identifier '{}': {e}", self.identifier)))
    }

    /// Decode [`NetworkConfig::allocation_id_key`] into the 32 raw bytes
    /// [`indexer_allocations::AllocationIdKey`] wraps.
    pub fn allocation_id_key_bytes(&self) -> Result<[u8; 32], IndexerError> {
        let raw = self.allocation_id_key.strip_prefix("0x").unwrap_or(&self.allocation_id_key);
        let decoded = hex::decode(raw)
            .map_err(|e| IndexerError::Fatal(format!("invalid allocation-id key: {e}")))?;
        decoded
            .try_into()
            .map_err(|bytes: Vec<u8>| IndexerError::Fatal(format!("allocation-id key must be 32 bytes, got {}", bytes.len())))
    }
}

impl AgentConfig {
    /// Load and parse the config file at `path`.
    pub async fn load(path: &Path) -> Result<Self, IndexerError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| IndexerError::Fatal(format!("could not read config file '{}': {e}", path.display())))?;
        toml::from_str(&raw).map_err(|e| IndexerError::Fatal(format!("invalid config file '{}': {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_KEY: &str = "0707070707070707070707070707070707070707070707070707070707070707";

    fn sample(key: &str) -> String {
        format!(
            r#"
            mnemonic = "test test test test test test test test test test test junk"

            [[network]]
            identifier = "mainnet"
            operator_address = "0xoperator"
            indexer_address = "0xindexer"
            staking_contract_address = "0xstaking"
            subgraph_url = "https://example.test/subgraph"
            rpc_url = "https://example.test/rpc"
            deployment_node_url = "http://localhost:8030"
            deployment_node_id = "default"
            allocation_id_key = "{key}"
            "#
        )
    }

    #[test]
    fn parses_a_minimal_config_with_defaults() {
        let config: AgentConfig = toml::from_str(&sample(VALID_KEY)).expect("valid toml");
        assert_eq!(config.listen_address, "0.0.0.0:7600");
        assert_eq!(config.networks.len(), 1);
        let network = &config.networks[0];
        assert_eq!(network.reconciliation_interval_seconds, 120);
        assert_eq!(network.default_parallel_allocations, 1);
    }

    #[test]
    fn canonicalises_known_aliases() {
        let config: AgentConfig = toml::from_str(&sample(VALID_KEY)).expect("valid toml");
        let network = &config.networks[0];
        let canonical = network.canonical_identifier().expect("mainnet is a known alias");
        assert_eq!(canonical.0, "eip155:1");
    }

    #[test]
    fn rejects_an_unknown_alias() {
        let toml_str = sample(VALID_KEY).replace("mainnet", "not-a-chain");
        let config: AgentConfig = toml::from_str(&toml_str).expect("valid toml");
        assert!(config.networks[0].canonical_identifier().is_err());
    }

    #[test]
    fn a_well_formed_32_byte_key_decodes() {
        let config: AgentConfig = toml::from_str(&sample(VALID_KEY)).expect("valid toml");
        assert_eq!(config.networks[0].allocation_id_key_bytes().expect("32 bytes").len(), 32);
    }

    #[test]
    fn a_wrong_length_key_is_rejected() {
        let config: AgentConfig = toml::from_str(&sample("0707")).expect("valid toml");
        assert!(config.networks[0].allocation_id_key_bytes().is_err());
    }
}
