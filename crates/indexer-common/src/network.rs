// SPDX-License-Identifier: Apache-2.0
//! CAIP-2 protocol network identifiers.

use std::fmt;

/// A canonical CAIP-2 chain identifier, e.g. `eip155:1`.
///
/// Construction is intentionally infallible here — validating raw input
/// (aliases, grammar) is `indexer-ids`'s job; by the time a
/// [`NetworkIdentifier`] exists in this crate's model types it is assumed
/// canonical. This mirrors the split between `echo-cas`'s infallible
/// `BlobHash` newtype and the validating construction that happens above
/// it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct NetworkIdentifier(pub String);

impl NetworkIdentifier {
    /// Construct from an already-canonical `namespace:reference` string.
    pub fn new(canonical: impl Into<String>) -> Self {
        Self(canonical.into())
    }

    /// The CAIP-2 namespace, e.g. `eip155`.
    pub fn namespace(&self) -> &str {
        self.0.split_once(':').map_or(self.0.as_str(), |(ns, _)| ns)
    }

    /// The CAIP-2 reference, e.g. `1` for `eip155:1`.
    pub fn reference(&self) -> &str {
        self.0.split_once(':').map_or("", |(_, reference)| reference)
    }
}

impl fmt::Display for NetworkIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NetworkIdentifier {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NetworkIdentifier {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}
