// SPDX-License-Identifier: Apache-2.0
//! Deterministic allocation-id derivation (`spec.md` §4.6, testable
//! property 6): stable in `(mnemonic, epoch, deployment, existing-ids
//! set)`, excluding any collision with that set.

use indexer_common::{AllocationId, DeploymentId};
use std::collections::HashSet;

/// Derive a new allocation id. Hashes a domain-separated tag plus the
/// inputs with `blake3` (the same "`blake3(tag || bytes)`" convention
/// used throughout the workspace's id derivation), truncated to 20 bytes
/// (an Ethereum address), then walks a nonce forward until the candidate
/// is absent from `existing_ids`.
#[must_use]
pub fn derive_allocation_id(
    mnemonic: &str,
    epoch: u64,
    deployment: &DeploymentId,
    existing_ids: &HashSet<AllocationId>,
) -> AllocationId {
    let mut nonce: u64 = 0;
    loop {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"allocation-id:");
        hasher.update(mnemonic.as_bytes());
        hasher.update(b":");
        hasher.update(&epoch.to_be_bytes());
        hasher.update(b":");
        hasher.update(deployment.0.as_bytes());
        hasher.update(b":");
        hasher.update(&nonce.to_be_bytes());
        let digest = hasher.finalize();
        let candidate = AllocationId::from(format!("0x{}", hex::encode(&digest.as_bytes()[..20])));
        if !existing_ids.contains(&candidate) {
            return candidate;
        }
        nonce += 1;
    }
}
