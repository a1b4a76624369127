// SPDX-License-Identifier: Apache-2.0
//! GRT token quantity newtype.

use std::fmt;
use std::str::FromStr;

/// A quantity of GRT, stored at wei precision (10^18 per whole token).
///
/// Wraps `u128` rather than a float so that equality, ordering, and
/// addition are exact. Crosses the GraphQL boundary as a decimal string
/// (`spec.md` §8 scenarios quote amounts like `"10000"` and `"25000"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Grt(pub u128);

impl Grt {
    /// The zero quantity.
    pub const ZERO: Self = Self(0);

    /// Checked addition; `None` on overflow.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Saturating addition, used for `postCloseFreeStake` in §4.6.
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl fmt::Display for Grt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error parsing a [`Grt`] from a string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid GRT amount: {0}")]
pub struct ParseGrtError(pub String);

impl FromStr for Grt {
    type Err = ParseGrtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u128>()
            .map(Self)
            .map_err(|_| ParseGrtError(s.to_owned()))
    }
}

impl serde::Serialize for Grt {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Grt {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<Self>().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::Grt;

    #[test]
    fn round_trips_through_decimal_string() {
        let amount: Grt = "10000".parse().expect("valid decimal");
        assert_eq!(amount.to_string(), "10000");
    }

    #[test]
    fn rejects_non_numeric() {
        assert!("ten".parse::<Grt>().is_err());
    }

    #[test]
    fn saturating_add_caps_at_u128_max() {
        let max = Grt(u128::MAX);
        assert_eq!(max.saturating_add(Grt(1)), max);
    }
}
