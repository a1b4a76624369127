// SPDX-License-Identifier: Apache-2.0
//! Daemon entry point (`SPEC_FULL.md` §5): load configuration, build one
//! reconciler per configured network, and run their tick loops alongside
//! the GraphQL management API until the process is asked to stop.

mod chain;
mod config;

use crate::chain::{HttpMarketSignalProvider, HttpMulticallSubmitter, SubmitEndpoint};
use crate::config::{AgentConfig, NetworkConfig};
use clap::Parser;
use indexer_allocations::{AllocationIdKey, AllocationManager};
use indexer_api::{build_schema, router, ApiContext, IndexerEndpointConfig};
use indexer_common::{IndexerError, IndexingRule, NetworkIdentifier};
use indexer_executor::{MarketSignalProvider, NoopReceiptCollector, ReceiptCollector, TransactionSubmitter};
use indexer_fanout::{Fanout, WithNetworkIdentifier};
use indexer_network::{
    ChainEndpoint, HttpDeploymentNodeClient, HttpStakingContractReader, HttpSubgraphClient, NetworkMonitor,
};
use indexer_queue::QueueService;
use indexer_reconciler::Reconciler;
use indexer_store::{MemoryStore, PostgresStore, Store};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// How long a terminal action of the same type/deployment keeps the
/// queue closed to a duplicate (`spec.md` §4.5's "recently executed"
/// check).
const QUEUE_THROTTLE_WINDOW: chrono::Duration = chrono::Duration::minutes(20);

/// Ceiling on a single reconciler pass, dominated by the local
/// deployment node's own 120 s deploy timeout (`spec.md` §5).
const RECONCILER_PASS_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Parser)]
#[command(author, version, about = "Indexer Management Core daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, env = "INDEXER_AGENT_CONFIG")]
    config: PathBuf,
}

/// A network's resolved identifier paired with its static config, the
/// input side of the startup [`Fanout`].
struct ConfiguredNetwork {
    identifier: NetworkIdentifier,
    config: NetworkConfig,
}

impl WithNetworkIdentifier for ConfiguredNetwork {
    fn network_identifier(&self) -> &NetworkIdentifier {
        &self.identifier
    }
}

/// A built reconciler paired with its tick cadence, the output side of
/// the startup [`Fanout`].
struct ScheduledReconciler {
    identifier: NetworkIdentifier,
    reconciler: Reconciler<Arc<dyn Store>>,
    tick_interval: Duration,
}

impl WithNetworkIdentifier for ScheduledReconciler {
    fn network_identifier(&self) -> &NetworkIdentifier {
        &self.identifier
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = AgentConfig::load(&args.config).await?;

    let store = build_store(&config).await?;

    let networks: Vec<ConfiguredNetwork> = config
        .networks
        .iter()
        .map(|network_config| {
            Ok::<_, IndexerError>(ConfiguredNetwork {
                identifier: network_config.canonical_identifier()?,
                config: network_config.clone(),
            })
        })
        .collect::<Result<_, _>>()?;

    let submitter = build_submitter(&config, &networks)?;
    let receipts: Arc<dyn ReceiptCollector> = Arc::new(NoopReceiptCollector);
    let signal = build_signal_provider(&networks);
    let chain_reader = Arc::new(HttpStakingContractReader::new(build_chain_endpoints(&networks)));

    let mut monitors = HashMap::new();
    let mut queues = HashMap::new();
    let mut indexer_addresses = HashMap::new();
    let mut endpoints = HashMap::new();
    let mut scheduled = Vec::with_capacity(networks.len());

    for network in &networks {
        let monitor = NetworkMonitor::new(
            chain_reader.clone(),
            Arc::new(HttpSubgraphClient::new(network.config.subgraph_url.clone())),
            Arc::new(HttpDeploymentNodeClient::new(
                network.config.deployment_node_url.clone(),
                network.config.deployment_node_id.clone(),
            )),
        );

        seed_default_global_rule(store.as_ref(), &network.identifier, &network.config).await?;

        let allocations = AllocationManager::new(
            monitor.clone(),
            network.config.indexer_address.clone(),
            config.mnemonic.clone(),
            AllocationIdKey::from_bytes(network.config.allocation_id_key_bytes()?),
        );

        let reconciler = Reconciler::new(
            store.clone(),
            monitor.clone(),
            allocations,
            submitter.clone(),
            receipts.clone(),
            signal.clone(),
            network.config.indexer_address.clone(),
            network.identifier.clone(),
            QUEUE_THROTTLE_WINDOW,
            RECONCILER_PASS_TIMEOUT,
        );

        queues.insert(
            network.identifier.clone(),
            QueueService::new(store.clone(), monitor.clone(), QUEUE_THROTTLE_WINDOW),
        );
        indexer_addresses.insert(network.identifier.clone(), network.config.indexer_address.clone());
        endpoints.insert(
            network.identifier.clone(),
            IndexerEndpointConfig {
                url: network.config.query_endpoint.clone(),
                status_url: network.config.status_endpoint.clone(),
            },
        );
        monitors.insert(network.identifier.clone(), monitor);
        scheduled.push(ScheduledReconciler {
            identifier: network.identifier.clone(),
            reconciler,
            tick_interval: Duration::from_secs(network.config.reconciliation_interval_seconds),
        });
    }

    // Validates the pairing is complete and 1:1 before anything is spawned.
    let fanout = Fanout::new(networks, scheduled)?;
    let mut tasks: Vec<tokio::task::JoinHandle<()>> = fanout
        .into_pairs()
        .into_iter()
        .map(|(network, scheduled)| spawn_reconciler_loop(network.identifier, scheduled))
        .collect();

    let api_context = ApiContext::new(store, queues, monitors, indexer_addresses, endpoints);
    let schema = build_schema(api_context);
    let listener = tokio::net::TcpListener::bind(config.listen_address.as_str()).await?;
    tracing::info!(address = %config.listen_address, "management API listening");
    tasks.push(tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(schema)).await {
            tracing::error!(%error, "management API server exited");
        }
    }));

    tokio::select! {
        () = async {
            futures::future::join_all(tasks).await;
        } => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }

    Ok(())
}

fn spawn_reconciler_loop(
    identifier: NetworkIdentifier,
    scheduled: ScheduledReconciler,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(scheduled.tick_interval);
        loop {
            interval.tick().await;
            if let Err(error) = scheduled.reconciler.tick().await {
                tracing::error!(network = %identifier, %error, "reconciler tick failed");
            }
        }
    })
}

async fn build_store(config: &AgentConfig) -> anyhow::Result<Arc<dyn Store>> {
    match &config.database_url {
        Some(url) => Ok(Arc::new(PostgresStore::connect(url).await?)),
        None => {
            tracing::warn!("no database_url configured; using an in-memory store that does not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

fn build_chain_endpoints(networks: &[ConfiguredNetwork]) -> HashMap<NetworkIdentifier, ChainEndpoint> {
    networks
        .iter()
        .map(|network| {
            (
                network.identifier.clone(),
                ChainEndpoint {
                    rpc_url: network.config.rpc_url.clone(),
                    staking_contract: network.config.staking_contract_address.clone(),
                },
            )
        })
        .collect()
}

fn build_submitter(
    config: &AgentConfig,
    networks: &[ConfiguredNetwork],
) -> Result<Arc<dyn TransactionSubmitter>, IndexerError> {
    let endpoints = networks
        .iter()
        .map(|network| {
            (
                network.identifier.clone(),
                SubmitEndpoint {
                    rpc_url: network.config.rpc_url.clone(),
                    staking_contract: network.config.staking_contract_address.clone(),
                },
            )
        })
        .collect();
    Ok(Arc::new(HttpMulticallSubmitter::new(endpoints, &config.mnemonic)?))
}

fn build_signal_provider(networks: &[ConfiguredNetwork]) -> Arc<dyn MarketSignalProvider> {
    let endpoints = networks
        .iter()
        .map(|network| (network.identifier.clone(), network.config.subgraph_url.clone()))
        .collect();
    Arc::new(HttpMarketSignalProvider::new(endpoints))
}

/// Seed a network's always-present global rule on first start, without
/// clobbering an operator's customized one on a later restart.
async fn seed_default_global_rule(
    store: &dyn Store,
    network: &NetworkIdentifier,
    network_config: &NetworkConfig,
) -> Result<(), IndexerError> {
    let existing = store.fetch_rules(false, Some(network)).await?;
    if existing.iter().any(IndexingRule::is_global) {
        return Ok(());
    }
    let mut rule = IndexingRule::default_global(network.clone());
    if let Some(amount) = network_config.default_allocation_amount {
        rule.allocation_amount = Some(amount);
    }
    rule.parallel_allocations = Some(network_config.default_parallel_allocations);
    store.upsert_rule(rule).await?;
    Ok(())
}
