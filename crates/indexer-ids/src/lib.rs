// SPDX-License-Identifier: Apache-2.0
//! Identifier resolver (`spec.md` §4.1).
//!
//! Parses tagged `[<tag>:]<value>` inputs, validates/canonicalises CAIP-2
//! network tags (including the fixed alias table from `spec.md` §6), and
//! converts deployment ids between their 32-byte hex and base58 (`Qm...`)
//! forms. No I/O: pure parsing, grounded in the same infallible-newtype +
//! validating-constructor split `echo-cas` uses for its `BlobHash`.
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
    clippy::multiple_crate_versions
)]

mod caip2;
mod deployment;
mod tagged;

pub use caip2::{resolve_alias, CAIP2_ALIASES};
pub use deployment::{deployment_id_from_bytes32, deployment_id_to_bytes32};
pub use tagged::{parse_tagged_input, TaggedInput};

/// Error parsing an identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// The tagged-input grammar (`[<tag>:]<value>`) did not match.
    #[error("malformed identifier '{input}' at offset {offset}: expected [<network>:]<url|cid>")]
    MalformedGrammar {
        /// The raw input that failed to parse.
        input: String,
        /// Byte offset into `input` where parsing diverged.
        offset: usize,
    },
    /// The network tag was neither a known alias nor a valid `eip155:<n>`.
    #[error("unknown network tag '{0}'")]
    UnknownNetworkTag(String),
    /// A deployment id string was not valid base58 or the wrong length.
    #[error("invalid deployment id '{0}': {1}")]
    InvalidDeploymentId(String, String),
}
