// SPDX-License-Identifier: Apache-2.0
//! Rule engine (`spec.md` §4.3): storage via `indexer-store`, the
//! authoritative deployment/global merge, validation, and the worthiness
//! predicate the allocation manager uses to decide whether a manual
//! allocation earns an `always` rule back-write.
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

mod merge;
mod service;
mod validate;
mod worthiness;

pub use merge::merge;
pub use service::RuleService;
pub use validate::validate_rule;
pub use worthiness::{is_worthy, MarketSignal};
