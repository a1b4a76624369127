// SPDX-License-Identifier: Apache-2.0
//! Deployment id codec: 32-byte hex <-> base58 (`Qm...`).
//!
//! Deployment ids are IPFS CIDv0s: a fixed two-byte multihash prefix
//! (`0x1220`, sha2-256 / 32 bytes) followed by the 32-byte digest, base58
//! encoded. The hex form used internally (e.g. by chain events, which
//! carry `subgraphDeploymentID` as `bytes32`) is just the bare 32-byte
//! digest — the multihash prefix is re-added/stripped at the boundary.

use indexer_common::DeploymentId;

const MULTIHASH_PREFIX: [u8; 2] = [0x12, 0x20];

/// Convert a base58 deployment id (`Qm...`) to its 32-byte hex digest
/// (no `0x` prefix, lowercase), for use in chain-facing call data.
pub fn deployment_id_to_bytes32(id: &DeploymentId) -> Result<String, crate::IdentifierError> {
    let decoded = bs58::decode(&id.0).into_vec().map_err(|e| {
        crate::IdentifierError::InvalidDeploymentId(id.0.clone(), e.to_string())
    })?;
    if decoded.len() != 34 || decoded[0..2] != MULTIHASH_PREFIX {
        return Err(crate::IdentifierError::InvalidDeploymentId(
            id.0.clone(),
            "expected a 34-byte sha2-256 CIDv0 multihash".to_owned(),
        ));
    }
    Ok(hex::encode(&decoded[2..]))
}

/// Convert a 32-byte hex digest (as emitted by chain events) back to the
/// canonical base58 deployment id.
pub fn deployment_id_from_bytes32(hex_digest: &str) -> Result<DeploymentId, crate::IdentifierError> {
    let digest = hex::decode(hex_digest.trim_start_matches("0x")).map_err(|e| {
        crate::IdentifierError::InvalidDeploymentId(hex_digest.to_owned(), e.to_string())
    })?;
    if digest.len() != 32 {
        return Err(crate::IdentifierError::InvalidDeploymentId(
            hex_digest.to_owned(),
            "expected exactly 32 bytes".to_owned(),
        ));
    }
    let mut full = Vec::with_capacity(34);
    full.extend_from_slice(&MULTIHASH_PREFIX);
    full.extend_from_slice(&digest);
    Ok(DeploymentId(bs58::encode(full).into_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Qmew9PZUJCoDzXqqU6vGyTENTKHrrN4dy5h94kertfudqy";

    #[test]
    fn round_trips_base58_through_hex() {
        let id = DeploymentId::from(SAMPLE);
        let hex_digest = deployment_id_to_bytes32(&id).expect("valid CIDv0");
        let back = deployment_id_from_bytes32(&hex_digest).expect("valid digest");
        assert_eq!(back.0, SAMPLE);
    }

    #[test]
    fn rejects_wrong_length_hex() {
        assert!(deployment_id_from_bytes32("abcd").is_err());
    }

    #[test]
    fn rejects_non_cidv0_base58() {
        let id = DeploymentId::from("QmShortOrNotAMultihashAtAll");
        assert!(deployment_id_to_bytes32(&id).is_err());
    }
}
