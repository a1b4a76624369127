// SPDX-License-Identifier: Apache-2.0
//! Production implementations of the two capability traits
//! `indexer-executor` leaves as seams: [`MarketSignalProvider`] over the
//! indexing subgraph's curation fields, and [`TransactionSubmitter`] over
//! a real signed-and-broadcast Ethereum transaction.
//!
//! The submitter carries forward `indexer-executor`'s own documented
//! simplification: call data is the crate's `serde_json` envelope, not
//! real contract ABI, so a receipt's events are derived by decoding the
//! envelope this process just submitted rather than by parsing logs.
//! True atomicity across a batch would need a real multicall contract;
//! this submits each call as its own transaction and stops at the first
//! failure, which is strictly weaker than all-or-nothing (see
//! `DESIGN.md`).

use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, MnemonicBuilder, Signer};
use ethers::types::{Address, Eip1559TransactionRequest};
use indexer_common::{AllocationId, DeploymentId, IndexerError, NetworkIdentifier};
use indexer_executor::{BatchOutcome, ChainEvent, EncodedCall, MarketSignalProvider, TransactionSubmitter};
use indexer_rules::MarketSignal;
use std::collections::HashMap;
use std::str::FromStr;

/// Per-network connection details for [`HttpMulticallSubmitter`].
#[derive(Debug, Clone)]
pub struct SubmitEndpoint {
    /// JSON-RPC HTTP endpoint used both to read state and to broadcast.
    pub rpc_url: String,
    /// Staking contract address calls are sent to.
    pub staking_contract: String,
}

/// Signs and broadcasts real transactions whose call data is the
/// envelope `indexer-executor::encode_call` produced.
pub struct HttpMulticallSubmitter {
    endpoints: HashMap<NetworkIdentifier, SubmitEndpoint>,
    wallet: LocalWallet,
}

impl HttpMulticallSubmitter {
    /// Derive the signing wallet from `mnemonic` and pair it with a
    /// per-network RPC/contract endpoint map.
    pub fn new(endpoints: HashMap<NetworkIdentifier, SubmitEndpoint>, mnemonic: &str) -> Result<Self, IndexerError> {
        let wallet = MnemonicBuilder::<ethers::signers::coins_bip39::English>::default()
            .phrase(mnemonic)
            .build()
            .map_err(|e| IndexerError::Fatal(format!("invalid transaction-signing mnemonic: {e}")))?;
        Ok(Self { endpoints, wallet })
    }

    fn endpoint(&self, network: &NetworkIdentifier) -> Result<&SubmitEndpoint, IndexerError> {
        self.endpoints
            .get(network)
            .ok_or_else(|| IndexerError::Fatal(format!("no submit endpoint configured for network '{network}'")))
    }

    async fn client(
        &self,
        network: &NetworkIdentifier,
        endpoint: &SubmitEndpoint,
    ) -> Result<SignerMiddleware<Provider<Http>, LocalWallet>, IndexerError> {
        let provider = Provider::<Http>::try_from(endpoint.rpc_url.as_str())
            .map_err(|e| IndexerError::Fatal(format!("invalid RPC url: {e}")))?;
        let chain_id: u64 = network
            .reference()
            .parse()
            .map_err(|e| IndexerError::Fatal(format!("network '{network}' has a non-numeric CAIP-2 reference: {e}")))?;
        Ok(SignerMiddleware::new(provider, self.wallet.clone().with_chain_id(chain_id)))
    }
}

#[async_trait]
impl TransactionSubmitter for HttpMulticallSubmitter {
    async fn submit_multicall(
        &self,
        network: &NetworkIdentifier,
        calls: &[EncodedCall],
    ) -> Result<BatchOutcome, IndexerError> {
        if calls.is_empty() {
            return Ok(BatchOutcome::Events(Vec::new()));
        }
        let endpoint = self.endpoint(network)?;
        let to = Address::from_str(&endpoint.staking_contract)
            .map_err(|e| IndexerError::Fatal(format!("invalid staking contract address: {e}")))?;
        let client = self.client(network, endpoint).await?;

        let mut events = Vec::new();
        for call in calls {
            let tx = Eip1559TransactionRequest::new().to(to).data(call.0.clone());
            let pending = client
                .send_transaction(tx, None)
                .await
                .map_err(|e| IndexerError::Execution(format!("submitting transaction failed: {e}")))?;
            let receipt = pending
                .await
                .map_err(|e| IndexerError::Execution(format!("waiting for receipt failed: {e}")))?
                .ok_or_else(|| IndexerError::Execution("transaction dropped before it was mined".to_owned()))?;
            if receipt.status != Some(1.into()) {
                return Err(IndexerError::Execution(format!(
                    "transaction {:#x} reverted",
                    receipt.transaction_hash
                )));
            }
            events.extend(decode_events(call)?);
        }
        Ok(BatchOutcome::Events(events))
    }
}

fn decode_events(call: &EncodedCall) -> Result<Vec<ChainEvent>, IndexerError> {
    let envelope: serde_json::Value = serde_json::from_slice(&call.0)
        .map_err(|e| IndexerError::Execution(format!("malformed call envelope: {e}")))?;
    let field = |name: &str| -> Result<String, IndexerError> {
        envelope
            .get(name)
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| IndexerError::Execution(format!("call envelope missing field '{name}'")))
    };
    match envelope.get("kind").and_then(serde_json::Value::as_str) {
        Some("allocate") => Ok(vec![ChainEvent::AllocationCreated {
            subgraph_deployment: DeploymentId(field("deployment")?),
            allocation_id: AllocationId(field("allocationId")?),
        }]),
        Some("unallocate") => Ok(vec![ChainEvent::AllocationClosed { allocation_id: AllocationId(field("allocationId")?) }]),
        Some("reallocate") => Ok(vec![
            ChainEvent::AllocationClosed { allocation_id: AllocationId(field("closingAllocationId")?) },
            ChainEvent::AllocationCreated {
                subgraph_deployment: DeploymentId(field("deployment")?),
                allocation_id: AllocationId(field("allocationId")?),
            },
        ]),
        other => Err(IndexerError::Execution(format!("unrecognised call envelope kind: {other:?}"))),
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
    parsed.data.ok_or_else(|| IndexerError::ExternalRead("subgraph response carried no data".to_owned()))
}

/// Reads curation signal, own stake, and average query fees for a
/// deployment from the indexing subgraph, one GraphQL endpoint per
/// network (`indexer-rules::MarketSignal` is evaluated against these by
/// the reconciler's worthiness predicate).
pub struct HttpMarketSignalProvider {
    client: reqwest::Client,
    endpoints: HashMap<NetworkIdentifier, String>,
}

impl HttpMarketSignalProvider {
    /// Build a provider from a per-network subgraph endpoint map.
    pub fn new(endpoints: HashMap<NetworkIdentifier, String>) -> Self {
        Self { client: reqwest::Client::new(), endpoints }
    }
}

#[derive(serde::Deserialize)]
struct RawSignal {
    #[serde(rename = "signalledTokens")]
    signalled_tokens: String,
    #[serde(rename = "stakedTokens")]
    staked_tokens: String,
    #[serde(rename = "queryFeesAmount")]
    query_fees_amount: String,
}

#[async_trait]
impl MarketSignalProvider for HttpMarketSignalProvider {
    async fn signal(&self, network: &NetworkIdentifier, deployment: &DeploymentId) -> Result<MarketSignal, IndexerError> {
        let endpoint = self.endpoints.get(network).ok_or_else(|| {
            IndexerError::Fatal(format!("no subgraph endpoint configured for network '{network}'"))
        })?;

        #[derive(serde::Deserialize)]
        struct Response {
            #[serde(rename = "subgraphDeployment")]
            subgraph_deployment: Option<RawSignal>,
        }
        const QUERY: &str = "query($id: ID!) { subgraphDeployment(id: $id) { signalledTokens \
             stakedTokens queryFeesAmount } }";

        let response: Response =
            post_graphql(&self.client, endpoint, QUERY, serde_json::json!({ "id": deployment.0 })).await?;
        let raw = response.subgraph_deployment.unwrap_or(RawSignal {
            signalled_tokens: "0".to_owned(),
            staked_tokens: "0".to_owned(),
            query_fees_amount: "0".to_owned(),
        });
        Ok(MarketSignal {
            signal: raw
                .signalled_tokens
                .parse()
                .map_err(|e| IndexerError::ExternalRead(format!("malformed signalledTokens: {e}")))?,
            stake: raw
                .staked_tokens
                .parse()
                .map_err(|e| IndexerError::ExternalRead(format!("malformed stakedTokens: {e}")))?,
            average_query_fees: raw
                .query_fees_amount
                .parse()
                .map_err(|e| IndexerError::ExternalRead(format!("malformed queryFeesAmount: {e}")))?,
        })
    }
}
