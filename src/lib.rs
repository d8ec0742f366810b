#![forbid(unsafe_code)]

//! Storage Array Harness (sah) — system-test harness for storage-array
//! control planes.
//!
//! One run drives the product's CLI through a fixed contract:
//! 1. **Command driver** — setup commands (array create + mount) followed by
//!    exactly one command under test
//! 2. **Response parser + expectation evaluator** — extract the JSON result
//!    code and judge it against the declared expectation
//! 3. **Verdict recorder** — persist a `PASS (<code>)` / `FAIL (<code>)`
//!    artifact keyed by scenario identity
//! 4. **Process lifecycle controller** — terminate the target process on
//!    every exit path
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use storage_array_harness::prelude::*;
//! ```

pub mod prelude;

pub mod core;
pub mod driver;
pub mod expectation;
pub mod interrupt;
pub mod logger;
pub mod process;
pub mod recorder;
pub mod response;
pub mod runner;
pub mod scenario;

#[cfg(test)]
pub(crate) mod testutil;
