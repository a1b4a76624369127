// SPDX-License-Identifier: Apache-2.0
//! The action queue (`spec.md` §4.5): validation, the §3 uniqueness
//! invariant, throttling, and the forward-only lifecycle transitions
//! (`queue`/`approve`/`cancel`/`delete`/`fetch`).
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

mod service;
mod throttle;

pub use service::QueueService;
pub use throttle::recently_executed;
