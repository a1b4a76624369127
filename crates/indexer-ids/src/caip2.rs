// SPDX-License-Identifier: Apache-2.0
//! CAIP-2 alias table and canonicalisation.

use crate::IdentifierError;
use indexer_common::NetworkIdentifier;

/// The fixed alias table from `spec.md` §6. Order is insertion order;
/// lookups are case-sensitive on the alias and exact-match on digits.
pub const CAIP2_ALIASES: &[(&str, &str)] = &[
    ("mainnet", "eip155:1"),
    ("sepolia", "eip155:11155111"),
    ("arbitrum-one", "eip155:42161"),
    ("arbitrum-goerli", "eip155:421613"),
];

/// Resolve a network tag (alias or raw `eip155:<digits>`) to its canonical
/// CAIP-2 form.
///
/// `eip155:<digits>` is always accepted as-is (round-trip identity per
/// `spec.md` §6), independent of whether it also has a named alias.
pub fn resolve_alias(tag: &str) -> Result<NetworkIdentifier, IdentifierError> {
    if let Some((_, canonical)) = CAIP2_ALIASES.iter().find(|(alias, _)| *alias == tag) {
        return Ok(NetworkIdentifier::new(*canonical));
    }
    if let Some(digits) = tag.strip_prefix("eip155:") {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return Ok(NetworkIdentifier::new(tag.to_owned()));
        }
    }
    Err(IdentifierError::UnknownNetworkTag(tag.to_owned()))
}
