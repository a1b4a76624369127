// SPDX-License-Identifier: Apache-2.0
//! Multi-network fan-out (`spec.md` §4.9): pair up a list of per-network
//! configurations with a list of per-operator configurations by
//! `networkIdentifier`, validate the pairing once at construction, and
//! expose three mapping shapes over the validated set.
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
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::missing_errors_doc
)]

use indexer_common::{IndexerError, NetworkIdentifier};
use std::collections::HashMap;

/// Anything that can name the network it belongs to. Implemented by
/// per-network configuration/client types so [`Fanout`] can validate and
/// key by `networkIdentifier` without depending on any concrete type.
pub trait WithNetworkIdentifier {
    /// The network this value is scoped to.
    fn network_identifier(&self) -> &NetworkIdentifier;
}

/// A validated 1:1 pairing between per-network values and per-operator
/// values, keyed by `networkIdentifier`. Construction is the only place
/// the pairing is checked; every mapper afterwards can assume it holds.
pub struct Fanout<N, O> {
    networks: Vec<N>,
    operators: Vec<O>,
}

impl<N, O> Fanout<N, O>
where
    N: WithNetworkIdentifier,
    O: WithNetworkIdentifier,
{
    /// Pair `networks` with `operators` index-for-index, requiring equal
    /// length and a matching `networkIdentifier` at every index. A
    /// mismatch is fatal at startup (`spec.md` §4.9).
    pub fn new(networks: Vec<N>, operators: Vec<O>) -> Result<Self, IndexerError> {
        if networks.len() != operators.len() {
            return Err(IndexerError::Fatal(format!(
                "fan-out configuration mismatch: {} network(s) but {} operator(s)",
                networks.len(),
                operators.len()
            )));
        }
        for (network, operator) in networks.iter().zip(operators.iter()) {
            let (network_id, operator_id) = (network.network_identifier(), operator.network_identifier());
            if network_id != operator_id {
                return Err(IndexerError::Fatal(format!(
                    "fan-out configuration mismatch: network '{network_id}' paired with operator '{operator_id}'"
                )));
            }
        }
        Ok(Self { networks, operators })
    }

    /// How many `(network, operator)` pairs this fan-out holds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    /// `true` if this fan-out holds no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Every configured network identifier, in pairing order.
    #[must_use]
    pub fn network_identifiers(&self) -> Vec<NetworkIdentifier> {
        self.networks.iter().map(|network| network.network_identifier().clone()).collect()
    }

    /// Apply `f` to each network value, keyed by its identifier.
    pub fn map_networks<T>(&self, mut f: impl FnMut(&N) -> T) -> HashMap<NetworkIdentifier, T> {
        self.networks.iter().map(|network| (network.network_identifier().clone(), f(network))).collect()
    }

    /// Apply `f` to each operator value, keyed by its identifier.
    pub fn map_operators<T>(&self, mut f: impl FnMut(&O) -> T) -> HashMap<NetworkIdentifier, T> {
        self.operators.iter().map(|operator| (operator.network_identifier().clone(), f(operator))).collect()
    }

    /// Apply `f` to each validated `(network, operator)` pair, keyed by
    /// their shared identifier.
    pub fn map_pairs<T>(&self, mut f: impl FnMut(&N, &O) -> T) -> HashMap<NetworkIdentifier, T> {
        self.networks
            .iter()
            .zip(self.operators.iter())
            .map(|(network, operator)| (network.network_identifier().clone(), f(network, operator)))
            .collect()
    }

    /// Consume the fan-out, yielding the validated `(network, operator)`
    /// pairs in pairing order. For callers that need to move a pair's
    /// values (e.g. into a spawned task) rather than read through a
    /// reference.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(N, O)> {
        self.networks.into_iter().zip(self.operators).collect()
    }
}
