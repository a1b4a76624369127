// SPDX-License-Identifier: Apache-2.0
//! Shared data model, error taxonomy, and numeric primitives for the indexer
//! agent's management core.
//!
//! This crate has no I/O: it defines the types that every other
//! `indexer-*` crate exchanges (rules, actions, cost models, disputes,
//! allocations) plus the [`IndexerError`] taxonomy from the error handling
//! design. Nothing here talks to Postgres, chain RPC, or the subgraph.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::multiple_crate_versions
)]

mod action;
mod cost_model;
mod dispute;
mod error;
mod grt;
mod network;
mod rule;

pub use action::{Action, ActionStatus, ActionType};
pub use cost_model::CostModel;
pub use dispute::PoiDispute;
pub use error::IndexerError;
pub use grt::Grt;
pub use network::NetworkIdentifier;
pub use rule::{DecisionBasis, IdentifierType, IndexingRule, GLOBAL_IDENTIFIER};

/// Deployment content identifier, canonical base58 form (e.g. `Qm...`).
///
/// Stored as a plain `String` newtype rather than a fixed-size byte array
/// because most components only ever compare/store it; byte-level
/// conversion lives in `indexer-ids`, which owns the hex<->base58 codec.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct DeploymentId(pub String);

impl std::fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DeploymentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DeploymentId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// On-chain allocation identifier (an Ethereum address, lowercase hex with
/// `0x` prefix).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct AllocationId(pub String);

impl std::fmt::Display for AllocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AllocationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for AllocationId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Read-only projection of an on-chain allocation, as cached by the network
/// monitor. See `spec.md` §3.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Allocation {
    /// On-chain allocation id.
    pub id: AllocationId,
    /// Current chain-observed status.
    pub status: AllocationStatus,
    /// Deployment this allocation indexes.
    pub subgraph_deployment: DeploymentId,
    /// Indexer (operator) address that opened the allocation.
    pub indexer: String,
    /// Stake committed to this allocation, in GRT wei.
    pub allocated_tokens: Grt,
    /// Epoch the allocation was opened in.
    pub created_at_epoch: u64,
    /// Epoch the allocation was closed in, if closed.
    pub closed_at_epoch: Option<u64>,
    /// Proof of indexing submitted at close, if any.
    pub poi: Option<String>,
    /// Network this allocation lives on.
    pub protocol_network: NetworkIdentifier,
}

/// Chain-observed allocation lifecycle state. `Null` is the "never existed"
/// sentinel returned by `getAllocationState` for an unused id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AllocationStatus {
    /// No allocation has ever existed at this id.
    Null,
    /// Currently open and earning rewards.
    Active,
    /// Closed, awaiting the dispute window.
    Closed,
    /// Closed and past the dispute window.
    Finalized,
    /// Rewards have been claimed.
    Claimed,
}
