//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use storage_array_harness::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, SahError};

// Driver
pub use crate::driver::{CliClient, CommandDriver, ControlPlaneClient, ControlRequest};

// Assertion pipeline
pub use crate::expectation::{Expectation, Polarity, Verdict, polarity_of};
pub use crate::response::CommandResponse;

// Recording and lifecycle
pub use crate::process::TargetProcess;
pub use crate::recorder::{VerdictRecord, VerdictRecorder};
pub use crate::runner::{RunOutcome, run_scenario};
pub use crate::scenario::{SIZE_1GIB, Scenario, builtin_scenarios, find_scenario};
