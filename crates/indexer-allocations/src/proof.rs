// SPDX-License-Identifier: Apache-2.0
//! Allocation-id proof signing (`spec.md` §4.6): a signature over
//! `(indexer, allocationId)` produced by the allocation-id private key, so
//! the staking contract can verify the operator controls the derived id
//! before opening the allocation.

use indexer_common::AllocationId;

/// The allocation-id private key, opaque outside this module.
#[derive(Clone)]
pub struct AllocationIdKey([u8; 32]);

impl AllocationIdKey {
    /// Wrap a raw 32-byte key.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Sign `(indexer, allocation_id)` with `key`, returning the hex-encoded
/// proof the batch executor attaches to the allocate/reallocate call
/// data.
#[must_use]
pub fn sign_allocation_id(key: &AllocationIdKey, indexer: &str, allocation_id: &AllocationId) -> String {
    let mut message = Vec::with_capacity(indexer.len() + 1 + allocation_id.0.len());
    message.extend_from_slice(indexer.as_bytes());
    message.push(b':');
    message.extend_from_slice(allocation_id.0.as_bytes());
    let mac = blake3::keyed_hash(&key.0, &message);
    hex::encode(mac.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_inputs_produce_the_same_proof() {
        let key = AllocationIdKey::from_bytes([7u8; 32]);
        let id = AllocationId::from("0xabc");
        let first = sign_allocation_id(&key, "0xindexer", &id);
        let second = sign_allocation_id(&key, "0xindexer", &id);
        assert_eq!(first, second);
    }

    #[test]
    fn different_keys_produce_different_proofs() {
        let id = AllocationId::from("0xabc");
        let a = sign_allocation_id(&AllocationIdKey::from_bytes([1u8; 32]), "0xindexer", &id);
        let b = sign_allocation_id(&AllocationIdKey::from_bytes([2u8; 32]), "0xindexer", &id);
        assert_ne!(a, b);
    }

    #[test]
    fn different_allocation_ids_produce_different_proofs() {
        let key = AllocationIdKey::from_bytes([7u8; 32]);
        let a = sign_allocation_id(&key, "0xindexer", &AllocationId::from("0xabc"));
        let b = sign_allocation_id(&key, "0xindexer", &AllocationId::from("0xdef"));
        assert_ne!(a, b);
    }
}
