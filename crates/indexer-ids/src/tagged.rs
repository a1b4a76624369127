// SPDX-License-Identifier: Apache-2.0
//! Tagged-input grammar: `[<tag>:]<value>`.

use crate::caip2::resolve_alias;
use crate::IdentifierError;
use indexer_common::NetworkIdentifier;

/// A parsed `[<tag>:]<value>` input. `network` is `None` when no tag was
/// present (`spec.md` §4.1: output is "`(canonical-CAIP-2 | null, value)`").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedInput {
    /// The resolved network, if a tag was present.
    pub network: Option<NetworkIdentifier>,
    /// The value: an HTTP(S) URL or a base58 content id.
    pub value: String,
}

fn looks_like_value(candidate: &str) -> bool {
    candidate.starts_with("http://")
        || candidate.starts_with("https://")
        || (candidate.starts_with("Qm") && candidate.len() >= 46)
}

/// Parse `input` per the §4.1 grammar.
///
/// A tag is only recognised as such if splitting on the *first* colon
/// leaves a right-hand side that looks like a value (URL or CID) — this
/// disambiguates `https://host:port/path` (no tag) from `mainnet:Qm...`
/// (tag present), since both contain a colon.
pub fn parse_tagged_input(input: &str) -> Result<TaggedInput, IdentifierError> {
    if looks_like_value(input) {
        return Ok(TaggedInput {
            network: None,
            value: input.to_owned(),
        });
    }

    let Some((first_tag, first_rest)) = input.split_once(':') else {
        return Err(IdentifierError::MalformedGrammar {
            input: input.to_owned(),
            offset: 0,
        });
    };

    // A CAIP-2 tag (`eip155:<digits>`) itself contains a colon, so the
    // value may start after either the first or the second colon.
    // Prefer the longer candidate tag when both parse as a value.
    if first_tag == "eip155" {
        if let Some((digits, second_rest)) = first_rest.split_once(':') {
            if !digits.is_empty()
                && digits.bytes().all(|b| b.is_ascii_digit())
                && looks_like_value(second_rest)
            {
                let network = resolve_alias(&format!("eip155:{digits}"))?;
                return Ok(TaggedInput {
                    network: Some(network),
                    value: second_rest.to_owned(),
                });
            }
        }
    }

    if !looks_like_value(first_rest) {
        return Err(IdentifierError::MalformedGrammar {
            input: input.to_owned(),
            offset: first_tag.len() + 1,
        });
    }

    let network = resolve_alias(first_tag)?;
    Ok(TaggedInput {
        network: Some(network),
        value: first_rest.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CID: &str = "Qmew9PZUJCoDzXqqU6vGyTENTKHrrN4dy5h94kertfudqy";

    #[test]
    fn untagged_url_has_no_network() {
        let parsed = parse_tagged_input("https://example.com/subgraph").expect("valid");
        assert_eq!(parsed.network, None);
        assert_eq!(parsed.value, "https://example.com/subgraph");
    }

    #[test]
    fn tagged_cid_resolves_alias() {
        let parsed = parse_tagged_input(&format!("mainnet:{CID}")).expect("valid");
        assert_eq!(parsed.network.map(|n| n.0), Some("eip155:1".to_owned()));
        assert_eq!(parsed.value, CID);
    }

    #[test]
    fn tagged_eip155_round_trips() {
        let parsed = parse_tagged_input(&format!("eip155:42161:{CID}")).expect("valid");
        assert_eq!(parsed.network.map(|n| n.0), Some("eip155:42161".to_owned()));
    }

    #[test]
    fn bare_cid_has_no_network() {
        let parsed = parse_tagged_input(CID).expect("valid");
        assert_eq!(parsed.network, None);
        assert_eq!(parsed.value, CID);
    }

    #[test]
    fn unrecognised_tag_is_an_error() {
        assert!(parse_tagged_input("nonsense:not-a-value").is_err());
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(parse_tagged_input("totally-not-valid").is_err());
    }
}
