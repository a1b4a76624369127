// SPDX-License-Identifier: Apache-2.0
//! HTTP/JSON-RPC-backed implementations of the three capability traits:
//! [`StakingContractReader`] over an Ethereum JSON-RPC endpoint,
//! [`SubgraphClient`] over the protocol indexing subgraph's GraphQL
//! endpoint, and [`DeploymentNodeClient`] over the local deployment
//! node's JSON-RPC endpoint.

use crate::chain::StakingContractReader;
use crate::node::DeploymentNodeClient;
use crate::subgraph::{DeploymentMetadata, SubgraphClient, SUBGRAPH_PAGE_SIZE};
use crate::EpochInfo;
use async_trait::async_trait;
use ethers::abi::Abi;
use ethers::contract::Contract;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::Address;
use indexer_common::{
    Allocation, AllocationId, AllocationStatus, DeploymentId, Grt, IndexerError, NetworkIdentifier,
};
use std::str::FromStr;
use std::sync::Arc;

const STAKING_ABI_JSON: &str = r#"[
  {"name":"getAllocationState","type":"function","stateMutability":"view",
   "inputs":[{"name":"allocationID","type":"address"}],
   "outputs":[{"name":"","type":"uint8"}]},
  {"name":"getIndexerCapacity","type":"function","stateMutability":"view",
   "inputs":[{"name":"indexer","type":"address"}],
   "outputs":[{"name":"","type":"uint256"}]},
  {"name":"maxAllocationEpochs","type":"function","stateMutability":"view",
   "inputs":[],"outputs":[{"name":"","type":"uint32"}]},
  {"name":"currentEpoch","type":"function","stateMutability":"view",
   "inputs":[],"outputs":[{"name":"","type":"uint256"}]},
  {"name":"currentEpochBlock","type":"function","stateMutability":"view",
   "inputs":[],"outputs":[{"name":"","type":"uint256"}]}
]"#;

/// Per-network connection details for [`HttpStakingContractReader`].
#[derive(Debug, Clone)]
pub struct ChainEndpoint {
    /// JSON-RPC HTTP endpoint.
    pub rpc_url: String,
    /// Staking contract address on this network.
    pub staking_contract: String,
}

/// Staking contract reads over a plain Ethereum JSON-RPC endpoint, one
/// provider per configured network.
pub struct HttpStakingContractReader {
    endpoints: std::collections::HashMap<NetworkIdentifier, ChainEndpoint>,
}

impl HttpStakingContractReader {
    /// Build a reader from a per-network endpoint map.
    pub fn new(endpoints: std::collections::HashMap<NetworkIdentifier, ChainEndpoint>) -> Self {
        Self { endpoints }
    }

    fn contract(&self, network: &NetworkIdentifier) -> Result<Contract<Provider<Http>>, IndexerError> {
        let endpoint = self.endpoints.get(network).ok_or_else(|| {
            IndexerError::Fatal(format!("no chain endpoint configured for network '{network}'"))
        })?;
        let provider = Provider::<Http>::try_from(endpoint.rpc_url.as_str())
            .map_err(|e| IndexerError::Fatal(format!("invalid RPC url: {e}")))?;
        let address = Address::from_str(&endpoint.staking_contract)
            .map_err(|e| IndexerError::Fatal(format!("invalid staking contract address: {e}")))?;
        let abi: Abi = serde_json::from_str(STAKING_ABI_JSON)
            .map_err(|e| IndexerError::Fatal(format!("invalid staking ABI: {e}")))?;
        Ok(Contract::new(address, abi, Arc::new(provider)))
    }
}

#[async_trait]
impl StakingContractReader for HttpStakingContractReader {
    async fn epoch_info(&self, network: &NetworkIdentifier) -> Result<EpochInfo, IndexerError> {
        let contract = self.contract(network)?;
        let current_epoch: ethers::types::U256 = contract
            .method::<_, ethers::types::U256>("currentEpoch", ())
            .map_err(|e| IndexerError::ExternalRead(e.to_string()))?
            .call()
            .await
            .map_err(|e| IndexerError::ExternalRead(e.to_string()))?;
        let start_block: ethers::types::U256 = contract
            .method::<_, ethers::types::U256>("currentEpochBlock", ())
            .map_err(|e| IndexerError::ExternalRead(e.to_string()))?
            .call()
            .await
            .map_err(|e| IndexerError::ExternalRead(e.to_string()))?;
        let provider = Provider::<Http>::try_from(
            self.endpoints
                .get(network)
                .ok_or_else(|| IndexerError::Fatal(format!("no chain endpoint for '{network}'")))?
                .rpc_url
                .as_str(),
        )
        .map_err(|e| IndexerError::Fatal(e.to_string()))?;
        let head = provider
            .get_block_number()
            .await
            .map_err(|e| IndexerError::ExternalRead(e.to_string()))?;
        let elapsed = head.saturating_sub(start_block).as_u64();
        Ok(EpochInfo {
            number: current_epoch.as_u64(),
            start_block: start_block.as_u64(),
            elapsed_blocks: elapsed,
        })
    }

    async fn max_allocation_epochs(&self, network: &NetworkIdentifier) -> Result<u64, IndexerError> {
        let contract = self.contract(network)?;
        let value: u32 = contract
            .method::<_, u32>("maxAllocationEpochs", ())
            .map_err(|e| IndexerError::ExternalRead(e.to_string()))?
            .call()
            .await
            .map_err(|e| IndexerError::ExternalRead(e.to_string()))?;
        Ok(u64::from(value))
    }

    async fn indexer_capacity(
        &self,
        network: &NetworkIdentifier,
        indexer: &str,
    ) -> Result<Grt, IndexerError> {
        let contract = self.contract(network)?;
        let address = Address::from_str(indexer)
            .map_err(|e| IndexerError::Validation(format!("invalid indexer address '{indexer}': {e}")))?;
        let value: ethers::types::U256 = contract
            .method::<_, ethers::types::U256>("getIndexerCapacity", address)
            .map_err(|e| IndexerError::ExternalRead(e.to_string()))?
            .call()
            .await
            .map_err(|e| IndexerError::ExternalRead(e.to_string()))?;
        Ok(Grt(value.as_u128()))
    }

    async fn allocation_state(
        &self,
        network: &NetworkIdentifier,
        allocation_id: &AllocationId,
    ) -> Result<AllocationStatus, IndexerError> {
        let contract = self.contract(network)?;
        let address = Address::from_str(&allocation_id.0).map_err(|e| {
            IndexerError::Validation(format!("invalid allocation id '{allocation_id}': {e}"))
        })?;
        let raw: u8 = contract
            .method::<_, u8>("getAllocationState", address)
            .map_err(|e| IndexerError::ExternalRead(e.to_string()))?
            .call()
            .await
            .map_err(|e| IndexerError::ExternalRead(e.to_string()))?;
        Ok(match raw {
            1 => AllocationStatus::Active,
            2 => AllocationStatus::Closed,
            3 => AllocationStatus::Finalized,
            4 => AllocationStatus::Claimed,
            _ => AllocationStatus::Null,
        })
    }
}

#[derive(serde::Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(serde::Deserialize)]
struct GraphQlError {
    message: String,
}

async fn post_graphql<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    query: &str,
    variables: serde_json::Value,
) -> Result<T, IndexerError> {
    let body = serde_json::json!({ "query": query, "variables": variables });
    let response = client
        .post(url)
        .json(&body)
        .send()
        .await
        .map_err(|e| IndexerError::ExternalRead(e.to_string()))?;
    let parsed: GraphQlResponse<T> = response
        .json()
        .await
        .map_err(|e| IndexerError::ExternalRead(e.to_string()))?;
    if let Some(error) = parsed.errors.first() {
        return Err(IndexerError::ExternalRead(error.message.clone()));
    }
    parsed
        .data
        .ok_or_else(|| IndexerError::ExternalRead("subgraph response carried no data".to_owned()))
}

/// Subgraph reads over a single GraphQL endpoint (one per network).
pub struct HttpSubgraphClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSubgraphClient {
    /// Construct a client against `endpoint`.
    pub fn new(endpoint: String) -> Self {
        Self { client: reqwest::Client::new(), endpoint }
    }
}

#[derive(serde::Deserialize)]
struct RawAllocation {
    id: String,
    status: String,
    #[serde(rename = "subgraphDeployment")]
    subgraph_deployment: RawDeploymentRef,
    indexer: String,
    #[serde(rename = "allocatedTokens")]
    allocated_tokens: String,
    #[serde(rename = "createdAtEpoch")]
    created_at_epoch: u64,
    #[serde(rename = "closedAtEpoch")]
    closed_at_epoch: Option<u64>,
    poi: Option<String>,
}

#[derive(serde::Deserialize)]
struct RawDeploymentRef {
    #[serde(rename = "ipfsHash")]
    ipfs_hash: String,
}

fn decode_allocation_status(raw: &str) -> AllocationStatus {
    match raw {
        "Active" => AllocationStatus::Active,
        "Closed" => AllocationStatus::Closed,
        "Finalized" => AllocationStatus::Finalized,
        "Claimed" => AllocationStatus::Claimed,
        _ => AllocationStatus::Null,
    }
}

fn into_allocation(raw: RawAllocation, network: &NetworkIdentifier) -> Result<Allocation, IndexerError> {
    Ok(Allocation {
        id: AllocationId(raw.id),
        status: decode_allocation_status(&raw.status),
        subgraph_deployment: DeploymentId(raw.subgraph_deployment.ipfs_hash),
        indexer: raw.indexer,
        allocated_tokens: raw
            .allocated_tokens
            .parse()
            .map_err(|e| IndexerError::ExternalRead(format!("malformed allocatedTokens: {e}")))?,
        created_at_epoch: raw.created_at_epoch,
        closed_at_epoch: raw.closed_at_epoch,
        poi: raw.poi,
        protocol_network: network.clone(),
    })
}

#[async_trait]
impl SubgraphClient for HttpSubgraphClient {
    async fn indexer_allocations(
        &self,
        network: &NetworkIdentifier,
        indexer: &str,
        statuses: &[AllocationStatus],
    ) -> Result<Vec<Allocation>, IndexerError> {
        #[derive(serde::Deserialize)]
        struct Page {
            allocations: Vec<RawAllocation>,
        }

        const QUERY: &str = "query($indexer: String!, $lastId: String!, $pageSize: Int!) { \
             allocations(first: $pageSize, where: { indexer: $indexer, id_gt: $lastId }, \
             orderBy: id, orderDirection: asc) { id status subgraphDeployment { ipfsHash } \
             indexer allocatedTokens createdAtEpoch closedAtEpoch poi } }";

        let mut last_id = String::new();
        let mut out = Vec::new();
        loop {
            let page: Page = post_graphql(
                &self.client,
                &self.endpoint,
                QUERY,
                serde_json::json!({ "indexer": indexer, "lastId": last_id, "pageSize": SUBGRAPH_PAGE_SIZE }),
            )
            .await?;
            let page_len = page.allocations.len();
            for raw in page.allocations {
                last_id = raw.id.clone();
                let allocation = into_allocation(raw, network)?;
                if statuses.is_empty() || statuses.contains(&allocation.status) {
                    out.push(allocation);
                }
            }
            if page_len < SUBGRAPH_PAGE_SIZE {
                break;
            }
        }
        Ok(out)
    }

    async fn allocation_by_id(
        &self,
        network: &NetworkIdentifier,
        id: &AllocationId,
    ) -> Result<Option<Allocation>, IndexerError> {
        #[derive(serde::Deserialize)]
        struct Response {
            allocation: Option<RawAllocation>,
        }
        const QUERY: &str = "query($id: ID!) { allocation(id: $id) { id status \
             subgraphDeployment { ipfsHash } indexer allocatedTokens createdAtEpoch \
             closedAtEpoch poi } }";
        let response: Response =
            post_graphql(&self.client, &self.endpoint, QUERY, serde_json::json!({ "id": id.0 })).await?;
        response.allocation.map(|raw| into_allocation(raw, network)).transpose()
    }

    async fn deployment_metadata(
        &self,
        _network: &NetworkIdentifier,
        deployment: &DeploymentId,
    ) -> Result<Option<DeploymentMetadata>, IndexerError> {
        #[derive(serde::Deserialize)]
        struct RawDeployment {
            #[serde(rename = "ipfsHash")]
            ipfs_hash: String,
            #[serde(rename = "displayName")]
            display_name: Option<String>,
            synced: bool,
        }
        #[derive(serde::Deserialize)]
        struct Response {
            #[serde(rename = "subgraphDeployment")]
            subgraph_deployment: Option<RawDeployment>,
        }
        const QUERY: &str = "query($id: ID!) { subgraphDeployment(id: $id) { ipfsHash \
             displayName synced } }";
        let response: Response =
            post_graphql(&self.client, &self.endpoint, QUERY, serde_json::json!({ "id": deployment.0 }))
                .await?;
        Ok(response.subgraph_deployment.map(|raw| DeploymentMetadata {
            deployment_id: DeploymentId(raw.ipfs_hash),
            display_name: raw.display_name,
            synced: raw.synced,
        }))
    }
}

/// Local deployment-node JSON-RPC client, with a bounded timeout on every
/// call per `spec.md` §5's 120 s deployment-RPC ceiling.
pub struct HttpDeploymentNodeClient {
    client: reqwest::Client,
    endpoint: String,
    node_id: String,
}

const DEPLOYMENT_RPC_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(120);

impl HttpDeploymentNodeClient {
    /// Construct a client against the node's JSON-RPC `endpoint`, using
    /// `node_id` for newly created deployments.
    pub fn new(endpoint: String, node_id: String) -> Self {
        Self { client: reqwest::Client::new(), endpoint, node_id }
    }

    async fn call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, IndexerError> {
        #[derive(serde::Deserialize)]
        struct RpcResponse {
            result: Option<serde_json::Value>,
            error: Option<RpcError>,
        }
        #[derive(serde::Deserialize)]
        struct RpcError {
            message: String,
        }

        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = tokio::time::timeout(
            DEPLOYMENT_RPC_TIMEOUT,
            self.client.post(&self.endpoint).json(&body).send(),
        )
        .await
        .map_err(|_| IndexerError::ExternalRead(format!("deployment node call '{method}' timed out")))?
        .map_err(|e| IndexerError::ExternalRead(e.to_string()))?;
        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| IndexerError::ExternalRead(e.to_string()))?;
        if let Some(error) = parsed.error {
            return Err(IndexerError::ExternalRead(format!("{method}: {}", error.message)));
        }
        parsed
            .result
            .ok_or_else(|| IndexerError::ExternalRead(format!("{method}: empty RPC result")))
    }
}

#[async_trait]
impl DeploymentNodeClient for HttpDeploymentNodeClient {
    async fn ensure_deployed(&self, deployment: &DeploymentId) -> Result<(), IndexerError> {
        self.call(
            "subgraph_create",
            serde_json::json!({ "name": deployment.0 }),
        )
        .await?;
        self.call(
            "subgraph_deploy",
            serde_json::json!({ "name": deployment.0, "ipfs_hash": deployment.0, "node_id": self.node_id }),
        )
        .await?;
        Ok(())
    }

    async fn reassign(&self, deployment: &DeploymentId, node_id: &str) -> Result<(), IndexerError> {
        self.call(
            "subgraph_reassign",
            serde_json::json!({ "node_id": node_id, "ipfs_hash": deployment.0 }),
        )
        .await?;
        Ok(())
    }

    async fn pause(&self, deployment: &DeploymentId) -> Result<(), IndexerError> {
        self.call("subgraph_pause", serde_json::json!({ "ipfs_hash": deployment.0 })).await?;
        Ok(())
    }

    async fn resolve_poi_at_block(
        &self,
        deployment: &DeploymentId,
        block_number: u64,
    ) -> Result<Option<String>, IndexerError> {
        let result = self
            .call(
                "proofOfIndexing",
                serde_json::json!({ "deployment": deployment.0, "blockNumber": block_number }),
            )
            .await;
        match result {
            Ok(value) => Ok(value.as_str().map(str::to_owned)),
            Err(IndexerError::ExternalRead(message)) if message.contains("empty RPC result") => Ok(None),
            Err(other) => Err(other),
        }
    }
}
